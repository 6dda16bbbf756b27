//! Error types for the shared mock database

/// Shared database errors
///
/// Storage faults never surface here; they are logged and swallowed by
/// [`crate::SharedDb`].
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// The embedded seed documents failed to parse
    #[error("seed data is invalid: {0}")]
    Seed(#[source] serde_json::Error),

    /// No application with this id
    #[error("application not found: {0}")]
    ApplicationNotFound(String),
}

impl DbError {
    #[inline]
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::ApplicationNotFound(_))
    }
}
