//! Authentication state of a browser session.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::api::ApiError;
use crate::cache::{CacheError, PersistentCache, keys};
use crate::domain::user::User;
use crate::forms::FormError;

pub mod manager;
pub mod permissions;
pub mod token;

pub use manager::SessionManager;
pub use permissions::{Permission, can_access_page, has_permission, has_role};

#[derive(Debug, Clone, PartialEq)]
pub enum AuthState {
    Anonymous,
    Authenticating,
    Authenticated(User),
}

/// Result of one silent refresh step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// Nothing to do yet.
    Idle,
    Refreshed,
    /// Consecutive failures so far.
    Failed(u32),
    /// The session was cleared.
    LoggedOut,
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Form(#[from] FormError),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Storage(#[from] CacheError),
}

/// Reads the cached user if the cached access token is still trustworthy.
/// Anything else found in the cache is discarded.
pub fn restore_user(cache: &PersistentCache, now: DateTime<Utc>) -> Option<User> {
    let token = cache.get::<String>(keys::ACCESS_TOKEN).ok().flatten();
    let user = cache.get::<User>(keys::USER_INFO).ok().flatten();

    match (token, user) {
        (Some(token), Some(user)) if token::is_valid_token(&token, now) => Some(user),
        (None, None) => None,
        _ => {
            log::info!("Discarding stale session");
            cache.clear();
            None
        }
    }
}
