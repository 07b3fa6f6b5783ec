use dotenvy::dotenv;

use crm_frontend::models::config::ServerConfig;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();

    let server_config = ServerConfig::load().map_err(|e| {
        eprintln!("Failed to load configuration: {e}");
        std::io::Error::other(e.to_string())
    })?;

    let default_level = if server_config.resolved_api().debug {
        "debug"
    } else {
        "info"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    log::info!(
        "Starting CRM front end on {}:{}",
        server_config.address,
        server_config.port
    );

    crm_frontend::run(server_config).await
}
