//! In-process key-value store backed by DashMap for lock-free concurrent access.
//! Contents live only as long as the process.

use dashmap::DashMap;
use tracing::debug;

use crate::KeyValueStore;

#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: DashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        let value = self.entries.get(key).map(|v| v.value().clone());
        if value.is_some() {
            metrics::counter!("storage.hit").increment(1);
        } else {
            metrics::counter!("storage.miss").increment(1);
        }
        value
    }

    fn set(&self, key: &str, value: String) {
        debug!(key, bytes = value.len(), "Storing value");
        self.entries.insert(key.to_string(), value);
    }
}
