//! Request extractors giving handlers the signed-in user and a backend
//! client bound to the browser session.

use std::future::{Ready, ready};

use actix_session::SessionExt;
use actix_web::dev::Payload;
use actix_web::error::{ErrorInternalServerError, ErrorUnauthorized};
use actix_web::{FromRequest, HttpRequest, web};
use chrono::Utc;
use serde::Serialize;

use crate::api::{ApiClient, HttpClient};
use crate::cache::{PersistentCache, keys};
use crate::domain::user::User;
use crate::models::config::ServerConfig;
use crate::session::permissions::Capabilities;
use crate::session::{SessionManager, restore_user};
use crate::session_store::ActixSessionStore;

/// Cache over the session cookie, namespaced with the configured prefix.
pub fn session_cache(req: &HttpRequest) -> PersistentCache {
    let prefix = req
        .app_data::<web::Data<ServerConfig>>()
        .map(|config| config.session.storage_prefix.clone())
        .unwrap_or_else(|| "crm_".to_string());
    PersistentCache::new(ActixSessionStore::new(req.get_session()), prefix)
}

/// The user restored from a trusted session. Rejects with 401 otherwise,
/// which [`crate::middleware::RedirectUnauthorized`] turns into a redirect.
#[derive(Debug, Clone, Serialize)]
pub struct AuthenticatedUser {
    #[serde(flatten)]
    pub user: User,
    pub display_name: String,
    pub can: Capabilities,
}

impl AuthenticatedUser {
    pub fn new(user: User) -> Self {
        Self {
            display_name: user.display_name().to_string(),
            can: Capabilities::of(&user),
            user,
        }
    }
}

impl FromRequest for AuthenticatedUser {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let cache = session_cache(req);
        ready(
            restore_user(&cache, Utc::now())
                .map(AuthenticatedUser::new)
                .ok_or_else(|| ErrorUnauthorized("not signed in")),
        )
    }
}

/// Backend access for one request: the shared [`HttpClient`] plus the cache
/// holding this browser's credentials.
pub struct BackendSession {
    cache: PersistentCache,
    http: web::Data<HttpClient>,
    config: web::Data<ServerConfig>,
}

impl BackendSession {
    pub fn api(&self) -> ApiClient<'_> {
        self.http.bind(&self.cache)
    }

    pub fn cache(&self) -> &PersistentCache {
        &self.cache
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Session manager driving `gateway` over this session's cache.
    pub fn manager<'a, G>(&'a self, gateway: &'a G) -> SessionManager<'a, G>
    where
        G: crate::api::AuthGateway + ?Sized,
    {
        let manager = SessionManager::new(gateway, &self.cache, &self.config.session);
        manager.restore(Utc::now());
        manager
    }

    /// Stable per-session key used to debounce live search. Created on first
    /// use and kept for the configured cache duration.
    pub fn search_key(&self) -> String {
        if let Ok(Some(key)) = self.cache.get::<String>(keys::SEARCH_KEY) {
            return key;
        }
        let key = uuid::Uuid::new_v4().to_string();
        if let Err(err) =
            self.cache
                .set_with_expiry(keys::SEARCH_KEY, &key, self.config.session.cache_duration())
        {
            log::warn!("Failed to store search key: {err}");
        }
        key
    }
}

impl FromRequest for BackendSession {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let http = req.app_data::<web::Data<HttpClient>>().cloned();
        let config = req.app_data::<web::Data<ServerConfig>>().cloned();

        ready(match (http, config) {
            (Some(http), Some(config)) => Ok(BackendSession {
                cache: session_cache(req),
                http,
                config,
            }),
            _ => {
                log::error!("Backend client is not configured");
                Err(ErrorInternalServerError("backend client is not configured"))
            }
        })
    }
}
