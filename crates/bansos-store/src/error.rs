//! Error types for the storage layer

use std::path::PathBuf;

/// Storage access errors
///
/// Callers at the service layer treat all of these as "absent" and carry on.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Backing store cannot be reached at all
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    /// Write would exceed the store's quota
    #[error("quota exceeded writing '{key}' ({size} bytes, limit {limit})")]
    QuotaExceeded { key: String, size: usize, limit: usize },

    /// Filesystem error in the file-backed store
    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Document could not be encoded
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl StoreError {
    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    #[inline]
    #[must_use]
    pub fn is_quota(&self) -> bool {
        matches!(self, Self::QuotaExceeded { .. })
    }
}

/// Stored session rejected during normalisation
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("session is not a JSON object")]
    NotAnObject,

    #[error("session field '{0}' is missing or has the wrong type")]
    InvalidField(&'static str),

    #[error("session expired at {0}")]
    Expired(i64),

    #[error("session json: {0}")]
    Malformed(String),
}
