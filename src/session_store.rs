//! Cookie session backend for [`PersistentCache`](crate::cache::PersistentCache).

use actix_session::Session;

use crate::cache::{CacheError, CacheResult, KeyValueStore};

/// Stores cache entries inside the signed session cookie.
#[derive(Clone)]
pub struct ActixSessionStore {
    session: Session,
}

impl ActixSessionStore {
    pub fn new(session: Session) -> Self {
        Self { session }
    }
}

impl KeyValueStore for ActixSessionStore {
    fn get_raw(&self, key: &str) -> CacheResult<Option<String>> {
        self.session
            .get::<String>(key)
            .map_err(|err| CacheError::Storage(err.to_string()))
    }

    fn set_raw(&self, key: &str, value: String) -> CacheResult<()> {
        self.session
            .insert(key, value)
            .map_err(|err| CacheError::Storage(err.to_string()))
    }

    fn remove_raw(&self, key: &str) {
        self.session.remove(key);
    }

    fn keys(&self) -> Vec<String> {
        self.session.entries().keys().cloned().collect()
    }
}
