//! Error types for the storage bridge

/// Bridge setup errors
///
/// Message traffic never fails: malformed or foreign messages are dropped.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BridgeError {
    /// Not a `scheme://host[:port]` origin
    #[error("invalid origin: {0}")]
    InvalidOrigin(String),

    /// Bridge page URL carries no `origin` parameter
    #[error("bridge page url has no origin parameter: {0}")]
    MissingParentOrigin(String),
}
