//! Namespaced key-value cache with expiry metadata.
//!
//! Entries are stored as JSON envelopes `{value, timestamp, expiry}` on top of
//! any [`KeyValueStore`]. Expired entries are removed lazily on read.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

pub mod memory;

pub use memory::MemoryStore;

/// Keys used by the session layer.
pub mod keys {
    pub const ACCESS_TOKEN: &str = "access_token";
    pub const REFRESH_TOKEN: &str = "refresh_token";
    pub const USER_INFO: &str = "user_info";
    pub const TOKEN_REFRESHED_AT: &str = "token_refreshed_at";
    pub const REFRESH_FAILURES: &str = "refresh_failures";
    pub const SEARCH_KEY: &str = "search_key";
    pub const DASHBOARD_STATS: &str = "page_dashboard_stats";
}

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("failed to encode cache entry: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("storage error: {0}")]
    Storage(String),
}

pub type CacheResult<T> = Result<T, CacheError>;

/// Raw string storage the cache is layered on.
pub trait KeyValueStore {
    fn get_raw(&self, key: &str) -> CacheResult<Option<String>>;
    fn set_raw(&self, key: &str, value: String) -> CacheResult<()>;
    fn remove_raw(&self, key: &str);
    fn keys(&self) -> Vec<String>;
}

#[derive(Debug, Serialize, Deserialize)]
struct Envelope {
    value: Value,
    /// Write time in milliseconds since the epoch.
    timestamp: i64,
    /// Absolute expiry in milliseconds since the epoch.
    expiry: Option<i64>,
}

pub struct PersistentCache {
    store: Box<dyn KeyValueStore>,
    prefix: String,
}

impl PersistentCache {
    pub fn new(store: impl KeyValueStore + 'static, prefix: impl Into<String>) -> Self {
        Self {
            store: Box::new(store),
            prefix: prefix.into(),
        }
    }

    /// In-memory cache, mostly useful in tests.
    pub fn in_memory(prefix: impl Into<String>) -> Self {
        Self::new(MemoryStore::default(), prefix)
    }

    fn full_key(&self, key: &str) -> String {
        format!("{}{}", self.prefix, key)
    }

    pub fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> CacheResult<()> {
        self.write(key, value, None, Utc::now())
    }

    /// Stores a value that reads as absent once `ttl` has elapsed.
    pub fn set_with_expiry<T: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &T,
        ttl: Duration,
    ) -> CacheResult<()> {
        self.write(key, value, Some(ttl), Utc::now())
    }

    fn write<T: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &T,
        ttl: Option<Duration>,
        now: DateTime<Utc>,
    ) -> CacheResult<()> {
        let timestamp = now.timestamp_millis();
        let expiry = ttl.map(|ttl| {
            let ttl = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX);
            timestamp.saturating_add(ttl)
        });
        let envelope = Envelope {
            value: serde_json::to_value(value)?,
            timestamp,
            expiry,
        };
        self.store
            .set_raw(&self.full_key(key), serde_json::to_string(&envelope)?)
    }

    pub fn get<T: DeserializeOwned>(&self, key: &str) -> CacheResult<Option<T>> {
        self.get_at(key, Utc::now())
    }

    /// Reads an entry as of `now`. Expired or undecodable entries are dropped.
    pub fn get_at<T: DeserializeOwned>(
        &self,
        key: &str,
        now: DateTime<Utc>,
    ) -> CacheResult<Option<T>> {
        let Some(envelope) = self.envelope(key)? else {
            return Ok(None);
        };

        if envelope
            .expiry
            .is_some_and(|expiry| now.timestamp_millis() > expiry)
        {
            self.remove(key);
            return Ok(None);
        }

        match serde_json::from_value(envelope.value) {
            Ok(value) => Ok(Some(value)),
            Err(err) => {
                log::warn!("Discarding cache entry {key}: {err}");
                self.remove(key);
                Ok(None)
            }
        }
    }

    /// Write time of an entry, regardless of its expiry.
    pub fn entry_timestamp(&self, key: &str) -> CacheResult<Option<DateTime<Utc>>> {
        Ok(self
            .envelope(key)?
            .and_then(|envelope| DateTime::from_timestamp_millis(envelope.timestamp)))
    }

    fn envelope(&self, key: &str) -> CacheResult<Option<Envelope>> {
        let Some(raw) = self.store.get_raw(&self.full_key(key))? else {
            return Ok(None);
        };
        match serde_json::from_str::<Envelope>(&raw) {
            Ok(envelope) => Ok(Some(envelope)),
            Err(err) => {
                log::warn!("Discarding corrupt cache entry {key}: {err}");
                self.remove(key);
                Ok(None)
            }
        }
    }

    pub fn contains(&self, key: &str) -> CacheResult<bool> {
        Ok(self.get::<Value>(key)?.is_some())
    }

    pub fn remove(&self, key: &str) {
        self.store.remove_raw(&self.full_key(key));
    }

    /// Removes every entry under this cache's prefix and nothing else.
    pub fn clear(&self) {
        for key in self.store.keys() {
            if key.starts_with(&self.prefix) {
                self.store.remove_raw(&key);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn values_round_trip_under_prefix() {
        let store = MemoryStore::default();
        let cache = PersistentCache::new(store.clone(), "crm_");

        cache.set(keys::ACCESS_TOKEN, "token-value").expect("set");

        assert_eq!(
            cache.get::<String>(keys::ACCESS_TOKEN).expect("get"),
            Some("token-value".to_string())
        );
        assert!(store.keys().contains(&"crm_access_token".to_string()));
    }

    #[test]
    fn expired_entries_are_removed_on_read() {
        let store = MemoryStore::default();
        let cache = PersistentCache::new(store.clone(), "crm_");
        cache
            .set_with_expiry("stats", &42, Duration::from_secs(60))
            .expect("set");

        let later = Utc::now() + chrono::Duration::seconds(61);

        assert_eq!(cache.get::<i32>("stats").expect("get"), Some(42));
        assert_eq!(cache.get_at::<i32>("stats", later).expect("get"), None);
        assert!(store.keys().is_empty());
    }

    #[test]
    fn clear_only_touches_own_prefix() {
        let store = MemoryStore::default();
        store
            .set_raw("other_key", "\"kept\"".to_string())
            .expect("set");
        let cache = PersistentCache::new(store.clone(), "crm_");
        cache.set(keys::USER_INFO, &serde_json::json!({"id": 1})).expect("set");
        cache.set(keys::REFRESH_TOKEN, "r").expect("set");

        cache.clear();

        assert_eq!(store.keys(), vec!["other_key".to_string()]);
    }

    #[test]
    fn corrupt_entries_read_as_absent() {
        let store = MemoryStore::default();
        store
            .set_raw("crm_user_info", "not json".to_string())
            .expect("set");
        let cache = PersistentCache::new(store.clone(), "crm_");

        assert_eq!(cache.get::<String>(keys::USER_INFO).expect("get"), None);
        assert!(store.keys().is_empty());
    }

    #[test]
    fn entry_timestamp_reports_write_time() {
        let cache = PersistentCache::in_memory("crm_");
        let before = Utc::now().timestamp_millis();
        cache.set(keys::TOKEN_REFRESHED_AT, &true).expect("set");

        let written = cache
            .entry_timestamp(keys::TOKEN_REFRESHED_AT)
            .expect("timestamp")
            .expect("entry exists");

        assert!(written.timestamp_millis() >= before);
    }
}
