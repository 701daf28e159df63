#![warn(clippy::unwrap_used)]

pub mod json;
pub mod local;

pub use json::{load_json, save_json};
pub use local::MemoryStore;

/// Well-known keys, matching what the browser dashboard kept in local storage.
pub mod keys {
    pub const CUSTOMERS: &str = "customers";
    pub const SEGMENTS: &str = "segments";
    pub const CAMPAIGNS: &str = "campaigns";
}

/// String key-value storage. Values are opaque text (JSON in practice).
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;

    fn set(&self, key: &str, value: String);
}
