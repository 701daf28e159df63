//! Typed JSON load/save on top of a [`KeyValueStore`].

use crm_core::error::CrmResult;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::KeyValueStore;

/// Load and deserialize the value under `key`. A missing key is `Ok(None)`;
/// a present but unreadable value is a serialization error.
pub fn load_json<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str) -> CrmResult<Option<T>> {
    match store.get(key) {
        Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
        None => Ok(None),
    }
}

pub fn save_json<T: Serialize + ?Sized>(store: &dyn KeyValueStore, key: &str, value: &T) -> CrmResult<()> {
    let raw = serde_json::to_string(value)?;
    store.set(key, raw);
    Ok(())
}
