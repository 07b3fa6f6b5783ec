pub mod api;
pub mod cache;
pub mod debounce;
pub mod domain;
pub mod dto;
pub mod forms;
pub mod models;
pub mod pagination;
pub mod services;
pub mod session;
pub mod ui;

#[cfg(feature = "server")]
pub mod extract;
#[cfg(feature = "server")]
pub mod middleware;
#[cfg(feature = "server")]
pub mod routes;
#[cfg(feature = "server")]
pub mod session_store;

#[cfg(feature = "server")]
pub use server::run;

#[cfg(feature = "server")]
mod server {
    use std::sync::Arc;
    use std::time::Duration;

    use actix_cors::Cors;
    use actix_files::Files;
    use actix_session::{SessionMiddleware, storage::CookieSessionStore};
    use actix_web::cookie::Key;
    use actix_web::middleware::from_fn;
    use actix_web::{App, HttpServer, middleware, web};
    use actix_web_flash_messages::{FlashMessagesFramework, storage::CookieMessageStore};
    use tera::Tera;

    use crate::api::HttpClient;
    use crate::api::transport::ReqwestTransport;
    use crate::debounce::Debouncer;
    use crate::middleware::{RedirectUnauthorized, silent_refresh};
    use crate::models::config::ServerConfig;
    use crate::routes::api::api_v1_customer_search;
    use crate::routes::auth::{
        change_password, login, logout, register, show_login, show_profile, show_register,
        update_profile,
    };
    use crate::routes::customers::{
        confirm_delete_customer, create_customer, delete_customer, edit_customer, list_customers,
        new_customer, show_customer, touch_customer, update_customer,
    };
    use crate::routes::main::{not_assigned, show_dashboard, show_reports};
    use crate::routes::resources::{
        confirm_delete_resource, create_resource, delete_resource, edit_resource, list_resources,
        new_resource, perform_action, show_resource, update_resource,
    };
    use crate::routes::settings::{save_settings, show_settings};
    use crate::ui::register_filters;

    /// Builds and runs the Actix-Web HTTP server using the provided configuration.
    pub async fn run(server_config: ServerConfig) -> std::io::Result<()> {
        let api_settings = server_config.resolved_api();
        log::info!(
            "Using backend {} (debug: {})",
            api_settings.base_url,
            api_settings.debug
        );

        let transport = ReqwestTransport::new()
            .map_err(|e| std::io::Error::other(format!("Failed to build HTTP client: {e}")))?;
        let http_client =
            web::Data::new(HttpClient::new(api_settings, Arc::new(transport)).with_default_interceptors());

        let debouncer = web::Data::new(Debouncer::new(Duration::from_millis(
            server_config.search.debounce_ms,
        )));

        // Keys and stores for sessions and flash messages.
        let secret_key = Key::from(server_config.secret.as_bytes());

        let message_store = CookieMessageStore::builder(secret_key.clone()).build();
        let message_framework = FlashMessagesFramework::builder(message_store).build();

        let mut tera = Tera::new(&server_config.templates_dir)
            .map_err(|e| std::io::Error::other(format!("Template parsing error(s): {e}")))?;
        register_filters(&mut tera);

        let bind_address = (server_config.address.clone(), server_config.port);
        let config = web::Data::new(server_config);

        HttpServer::new(move || {
            App::new()
                .wrap(Cors::permissive())
                .wrap(message_framework.clone())
                .wrap(
                    SessionMiddleware::builder(CookieSessionStore::default(), secret_key.clone())
                        .cookie_secure(!config.profile().is_debug())
                        .build(),
                )
                .wrap(middleware::Compress::default())
                .wrap(middleware::Logger::default())
                .service(Files::new("/assets", "./assets"))
                .service(show_login)
                .service(login)
                .service(show_register)
                .service(register)
                .service(logout)
                .service(
                    web::scope("/api")
                        .wrap(from_fn(silent_refresh))
                        .service(api_v1_customer_search),
                )
                .service(
                    web::scope("")
                        .wrap(from_fn(silent_refresh))
                        .wrap(RedirectUnauthorized)
                        .service(show_dashboard)
                        .service(show_reports)
                        .service(not_assigned)
                        .service(show_profile)
                        .service(update_profile)
                        .service(change_password)
                        .service(show_settings)
                        .service(save_settings)
                        .service(list_customers)
                        .service(new_customer)
                        .service(create_customer)
                        .service(edit_customer)
                        .service(confirm_delete_customer)
                        .service(delete_customer)
                        .service(touch_customer)
                        .service(show_customer)
                        .service(update_customer)
                        .service(list_resources)
                        .service(new_resource)
                        .service(create_resource)
                        .service(edit_resource)
                        .service(confirm_delete_resource)
                        .service(delete_resource)
                        .service(perform_action)
                        .service(show_resource)
                        .service(update_resource),
                )
                .app_data(web::Data::new(tera.clone()))
                .app_data(http_client.clone())
                .app_data(debouncer.clone())
                .app_data(config.clone())
        })
        .bind(bind_address)?
        .run()
        .await
    }
}
