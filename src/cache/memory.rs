use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::cache::{CacheError, CacheResult, KeyValueStore};

/// Process-local store. Clones share the same entries.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Arc<RwLock<HashMap<String, String>>>,
}

impl KeyValueStore for MemoryStore {
    fn get_raw(&self, key: &str) -> CacheResult<Option<String>> {
        let entries = self
            .entries
            .read()
            .map_err(|err| CacheError::Storage(err.to_string()))?;
        Ok(entries.get(key).cloned())
    }

    fn set_raw(&self, key: &str, value: String) -> CacheResult<()> {
        let mut entries = self
            .entries
            .write()
            .map_err(|err| CacheError::Storage(err.to_string()))?;
        entries.insert(key.to_string(), value);
        Ok(())
    }

    fn remove_raw(&self, key: &str) {
        if let Ok(mut entries) = self.entries.write() {
            entries.remove(key);
        }
    }

    fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self
            .entries
            .read()
            .map(|entries| entries.keys().cloned().collect())
            .unwrap_or_default();
        keys.sort();
        keys
    }
}
