//! Save/load persistence
//!
//! Features:
//! - Versioned JSON envelope
//! - Bare (un-enveloped) blobs accepted on load
//! - Corrupt or missing data reported as `None` so callers fall back to defaults

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::platform::storage::KeyValueStore;

/// Current envelope format version
pub const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct Envelope<T> {
    version: u32,
    data: T,
}

/// Load a value stored under `key`
pub fn load<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str) -> Option<T> {
    let json = store.get(key)?;

    if let Ok(envelope) = serde_json::from_str::<Envelope<T>>(&json) {
        if envelope.version > FORMAT_VERSION {
            log::warn!(
                "'{}' saved by newer format v{}, reading anyway",
                key,
                envelope.version
            );
        }
        return Some(envelope.data);
    }

    match serde_json::from_str::<T>(&json) {
        Ok(value) => Some(value),
        Err(e) => {
            log::warn!("Discarding malformed '{}': {}", key, e);
            None
        }
    }
}

/// Store a value under `key` in the current envelope format
pub fn save<T: Serialize>(store: &mut dyn KeyValueStore, key: &str, value: &T) {
    let envelope = Envelope {
        version: FORMAT_VERSION,
        data: value,
    };
    match serde_json::to_string(&envelope) {
        Ok(json) => store.set(key, &json),
        Err(e) => log::warn!("Could not serialize '{}': {}", key, e),
    }
}

/// Remove a stored value
pub fn clear(store: &mut dyn KeyValueStore, key: &str) {
    store.remove(key);
}
