//! Key-value stores with `localStorage` semantics
//!
//! Values are opaque strings. There is no locking across writers: the last
//! `set_item` for a key wins.

use crate::error::StoreError;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::fmt::Debug;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// String key-value store
pub trait KeyValueStore: Send + Sync + Debug {
    /// Current value, `None` if the key is absent
    fn get_item(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Insert or overwrite
    fn set_item(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Delete; absent keys are not an error
    fn remove_item(&self, key: &str) -> Result<(), StoreError>;
}

/// Store handle shared between services
pub type SharedStore = Arc<dyn KeyValueStore>;

/// In-memory store
///
/// Optionally enforces a byte quota or refuses every access, to exercise the
/// degraded paths of the services built on top.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, String>>,
    quota: Option<usize>,
    unavailable: bool,
}

impl MemoryStore {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject writes once stored values would exceed `limit` bytes
    #[inline]
    #[must_use]
    pub fn with_quota(limit: usize) -> Self {
        Self {
            quota: Some(limit),
            ..Self::default()
        }
    }

    /// Store whose every access fails
    #[inline]
    #[must_use]
    pub fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Self::default()
        }
    }

    /// Wrap as a shared handle
    #[must_use]
    pub fn shared(self) -> SharedStore {
        Arc::new(self)
    }

    /// Copy of every entry
    #[must_use]
    pub fn snapshot(&self) -> BTreeMap<String, String> {
        self.entries.lock().clone()
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.unavailable {
            Err(StoreError::Unavailable("memory store disabled".to_string()))
        } else {
            Ok(())
        }
    }
}

impl KeyValueStore for MemoryStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.check()?;
        Ok(self.entries.lock().get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.check()?;
        let mut entries = self.entries.lock();
        if let Some(limit) = self.quota {
            let others: usize = entries
                .iter()
                .filter(|(k, _)| k.as_str() != key)
                .map(|(_, v)| v.len())
                .sum();
            if others + value.len() > limit {
                return Err(StoreError::QuotaExceeded {
                    key: key.to_string(),
                    size: value.len(),
                    limit,
                });
            }
        }
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), StoreError> {
        self.check()?;
        self.entries.lock().remove(key);
        Ok(())
    }
}

/// Durable store: one file per key inside a directory
///
/// Writes go through a temporary file in the same directory and are renamed
/// into place, so readers never observe a half-written value.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Open (lazily creating) a store rooted at `root`
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[inline]
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Percent-encoded key plus `.json`; distinct keys never share a file
    fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(format!("{}.json", urlencoding::encode(key)))
    }
}

impl KeyValueStore for FileStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, StoreError> {
        let path = self.path_for(key);
        match std::fs::read_to_string(&path) {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::io_error(path, e)),
        }
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StoreError> {
        std::fs::create_dir_all(&self.root).map_err(|e| StoreError::io_error(&self.root, e))?;
        let path = self.path_for(key);
        let mut tmp = tempfile::NamedTempFile::new_in(&self.root)
            .map_err(|e| StoreError::io_error(&self.root, e))?;
        tmp.write_all(value.as_bytes())
            .map_err(|e| StoreError::io_error(tmp.path(), e))?;
        tmp.persist(&path)
            .map_err(|e| StoreError::io_error(&path, e.error))?;
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), StoreError> {
        let path = self.path_for(key);
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::io_error(path, e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_basic_ops() {
        let store = MemoryStore::new();
        assert_eq!(store.get_item("k").unwrap(), None);
        store.set_item("k", "v1").unwrap();
        store.set_item("k", "v2").unwrap();
        assert_eq!(store.get_item("k").unwrap().as_deref(), Some("v2"));
        store.remove_item("k").unwrap();
        store.remove_item("k").unwrap();
        assert_eq!(store.get_item("k").unwrap(), None);
    }

    #[test]
    fn quota_counts_other_keys_only() {
        let store = MemoryStore::with_quota(10);
        store.set_item("a", "12345").unwrap();
        store.set_item("a", "1234567890").unwrap_err();
        store.set_item("b", "12345").unwrap();
        let err = store.set_item("c", "x").unwrap_err();
        assert!(err.is_quota());
    }

    #[test]
    fn unavailable_store_fails_every_call() {
        let store = MemoryStore::unavailable();
        assert!(store.get_item("k").is_err());
        assert!(store.set_item("k", "v").is_err());
        assert!(store.remove_item("k").is_err());
    }

    #[test]
    fn file_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("data"));
        store.set_item("ekyc.progress", r#"{"step":"SELFIE"}"#).unwrap();

        let reopened = FileStore::new(dir.path().join("data"));
        assert_eq!(
            reopened.get_item("ekyc.progress").unwrap().as_deref(),
            Some(r#"{"step":"SELFIE"}"#)
        );
        reopened.remove_item("ekyc.progress").unwrap();
        assert_eq!(store.get_item("ekyc.progress").unwrap(), None);
    }

    #[test]
    fn file_store_encodes_key_names() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        store.set_item("../escape/key", "v").unwrap();
        assert!(dir.path().join("..%2Fescape%2Fkey.json").exists());
        assert_eq!(store.get_item("../escape/key").unwrap().as_deref(), Some("v"));
    }

    #[test]
    fn file_store_keeps_similar_keys_apart() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        for key in ["a/b", "a:b", "a_b", "a b"] {
            store.set_item(key, key).unwrap();
        }
        for key in ["a/b", "a:b", "a_b", "a b"] {
            assert_eq!(store.get_item(key).unwrap().as_deref(), Some(key));
        }
    }
}
