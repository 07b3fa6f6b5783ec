//! Configuration model loaded from external sources.

use std::time::Duration;

use serde::Deserialize;

/// Backend base URL used when serving from a development host.
pub const DEVELOPMENT_API_URL: &str = "http://localhost:5000/api/v1";

#[derive(Clone, Debug, Deserialize)]
/// Basic configuration shared across handlers.
pub struct ServerConfig {
    pub domain: String,
    pub address: String,
    pub port: u16,
    pub templates_dir: String,
    pub secret: String,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub pagination: PaginationConfig,
    #[serde(default)]
    pub notification: NotificationConfig,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
/// Settings of the outbound connection to the CRM backend.
pub struct ApiConfig {
    /// Explicit backend URL. Overrides the profile default when present.
    pub base_url: Option<String>,
    pub timeout_ms: u64,
    /// How long the client refuses to dispatch after a connection failure.
    pub offline_cooldown_ms: u64,
    pub log_requests: bool,
    /// Explicit debug switch. Overrides the profile default when present.
    pub debug: Option<bool>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout_ms: 30_000,
            offline_cooldown_ms: 5_000,
            log_requests: true,
            debug: None,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub storage_prefix: String,
    pub refresh_interval_secs: u64,
    pub max_refresh_failures: u32,
    /// A token expiring within this window is refreshed ahead of the interval.
    pub expiry_buffer_secs: u64,
    pub cache_duration_secs: u64,
    /// How long page data such as the dashboard stats is reused.
    pub page_cache_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            storage_prefix: "crm_".to_string(),
            refresh_interval_secs: 30 * 60,
            max_refresh_failures: 3,
            expiry_buffer_secs: 300,
            cache_duration_secs: 24 * 60 * 60,
            page_cache_secs: 5 * 60,
        }
    }
}

impl SessionConfig {
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }

    pub fn expiry_buffer(&self) -> Duration {
        Duration::from_secs(self.expiry_buffer_secs)
    }

    pub fn cache_duration(&self) -> Duration {
        Duration::from_secs(self.cache_duration_secs)
    }

    pub fn page_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.page_cache_secs)
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub debounce_ms: u64,
    pub min_query_length: usize,
    pub max_results: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 300,
            min_query_length: 2,
            max_results: 50,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct PaginationConfig {
    pub default_page_size: usize,
    pub page_size_options: Vec<usize>,
    pub max_page_size: usize,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_page_size: 10,
            page_size_options: vec![10, 20, 50, 100],
            max_page_size: 100,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
/// Display durations of notifications, in milliseconds.
pub struct NotificationConfig {
    pub default_ms: u64,
    pub success_ms: u64,
    pub error_ms: u64,
    pub warning_ms: u64,
    pub info_ms: u64,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            default_ms: 5_000,
            success_ms: 3_000,
            error_ms: 8_000,
            warning_ms: 6_000,
            info_ms: 4_000,
        }
    }
}

/// Deployment profile derived from the host the application is served from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Profile {
    Development,
    Production,
}

impl Profile {
    /// `localhost` and `127.0.0.1` are development hosts, anything else is production.
    pub fn from_host(host: &str) -> Self {
        let host = host.split(':').next().unwrap_or_default();
        match host {
            "localhost" | "127.0.0.1" => Profile::Development,
            _ => Profile::Production,
        }
    }

    pub fn is_debug(self) -> bool {
        matches!(self, Profile::Development)
    }
}

/// Backend connection settings after profile defaults were applied.
#[derive(Clone, Debug)]
pub struct ResolvedApi {
    pub base_url: String,
    pub timeout: Duration,
    pub offline_cooldown: Duration,
    pub debug: bool,
    pub log_requests: bool,
}

impl ServerConfig {
    pub fn profile(&self) -> Profile {
        Profile::from_host(&self.domain)
    }

    /// Applies the profile defaults underneath the explicitly configured values.
    pub fn resolved_api(&self) -> ResolvedApi {
        let profile = self.profile();
        let base_url = match (&self.api.base_url, profile) {
            (Some(url), _) if !url.trim().is_empty() => url.trim().to_string(),
            (_, Profile::Development) => DEVELOPMENT_API_URL.to_string(),
            (_, Profile::Production) => format!("https://{}/api", self.domain),
        };
        let debug = self.api.debug.unwrap_or(profile.is_debug());

        ResolvedApi {
            base_url,
            timeout: Duration::from_millis(self.api.timeout_ms),
            offline_cooldown: Duration::from_millis(self.api.offline_cooldown_ms),
            debug,
            log_requests: debug && self.api.log_requests,
        }
    }
}

#[cfg(feature = "server")]
impl ServerConfig {
    /// Loads the configuration from `config/` relative to the working directory.
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_from(std::path::Path::new("config"))
    }

    /// Loads `default.yaml`, the optional `{APP_ENV}.yaml` overlay and the
    /// `APP_` prefixed environment variables from the given directory.
    pub fn load_from(dir: &std::path::Path) -> Result<Self, config::ConfigError> {
        use config::{Config, Environment, File};

        let app_env = std::env::var("APP_ENV").unwrap_or_else(|_| "local".into());

        Config::builder()
            .add_source(File::from(dir.join("default")))
            .add_source(File::from(dir.join(&app_env)).required(false))
            .add_source(Environment::with_prefix("APP").separator("__"))
            .build()?
            .try_deserialize::<ServerConfig>()
    }
}
