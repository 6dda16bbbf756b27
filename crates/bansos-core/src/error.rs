//! Error types for the domain model
//!
//! Covers:
//! - Applicant records missing mandatory fields
//! - Unknown step names coming from storage or the CLI
//! - Configuration files that fail to parse

/// Domain validation errors
#[derive(Debug, thiserror::Error)]
pub enum DomainError {
    /// A mandatory applicant field is absent or empty
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    /// Step name outside the fixed sequence
    #[error("unknown step: {0}")]
    UnknownStep(String),

    /// NIK is not sixteen digits
    #[error("invalid NIK: {0}")]
    InvalidNik(String),

    /// Configuration could not be read or parsed
    #[error("configuration error: {0}")]
    Config(String),
}

impl DomainError {
    /// Check if the error is caused by user-supplied data
    #[inline]
    #[must_use]
    pub fn is_user_input(&self) -> bool {
        matches!(self, Self::MissingField(_) | Self::InvalidNik(_))
    }
}
