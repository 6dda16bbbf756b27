//! JSON documents on top of a [`KeyValueStore`]
//!
//! Reads never fail: an unreadable store or an unparseable value is reported
//! as absent, and an unparseable value is deleted so the next reader starts
//! clean.

use crate::error::StoreError;
use crate::kv::KeyValueStore;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::warn;

/// Read and parse `key`; `None` if absent, unreadable or corrupt
pub fn read_json<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str) -> Option<T> {
    let raw = match store.get_item(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return None,
        Err(e) => {
            warn!(key, error = %e, "storage read failed, treating as absent");
            return None;
        }
    };
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(key, error = %e, "discarding corrupt document");
            remove_key(store, key);
            None
        }
    }
}

/// Serialize `value` under `key` and return the stored payload
///
/// # Errors
/// Propagates encoding and store errors so callers can decide whether a
/// failed write matters.
pub fn write_json<T: Serialize + ?Sized>(
    store: &dyn KeyValueStore,
    key: &str,
    value: &T,
) -> Result<String, StoreError> {
    let payload = serde_json::to_string(value)?;
    store.set_item(key, &payload)?;
    Ok(payload)
}

/// Best-effort delete
pub fn remove_key(store: &dyn KeyValueStore, key: &str) {
    if let Err(e) = store.remove_item(key) {
        warn!(key, error = %e, "storage delete failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kv::MemoryStore;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Doc {
        n: u32,
    }

    #[test]
    fn corrupt_document_is_removed() {
        let store = MemoryStore::new();
        store.set_item("doc", "{not json").unwrap();
        assert_eq!(read_json::<Doc>(&store, "doc"), None);
        assert_eq!(store.get_item("doc").unwrap(), None);
    }

    #[test]
    fn write_then_read() {
        let store = MemoryStore::new();
        let payload = write_json(&store, "doc", &Doc { n: 3 }).unwrap();
        assert_eq!(payload, r#"{"n":3}"#);
        assert_eq!(read_json::<Doc>(&store, "doc"), Some(Doc { n: 3 }));
    }

    #[test]
    fn unavailable_store_reads_as_absent() {
        let store = MemoryStore::unavailable();
        assert_eq!(read_json::<Doc>(&store, "doc"), None);
    }
}
