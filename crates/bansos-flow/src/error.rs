//! Error types for the onboarding flow

use bansos_core::DomainError;

/// Failure reported by a verification or submission port
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PortError {
    /// Transport failure; the message is shown to the citizen as is
    #[error("{0}")]
    Network(String),

    /// The service refused the request
    #[error("rejected: {0}")]
    Rejected(String),
}

/// Onboarding flow errors
#[derive(Debug, thiserror::Error)]
pub enum FlowError {
    /// A use case needs a capture the session does not have
    #[error("missing captured image: {0}")]
    MissingArtifact(&'static str),

    #[error(transparent)]
    Port(#[from] PortError),

    #[error(transparent)]
    Domain(#[from] DomainError),
}

impl FlowError {
    /// Check if the citizen can fix this by completing the form
    #[inline]
    #[must_use]
    pub fn is_user_fixable(&self) -> bool {
        match self {
            Self::MissingArtifact(_) => true,
            Self::Domain(e) => e.is_user_input(),
            Self::Port(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn network_message_is_passed_through() {
        let err = FlowError::from(PortError::Network("NetworkError".into()));
        assert_eq!(err.to_string(), "NetworkError");
        assert!(!err.is_user_fixable());
    }

    #[test]
    fn missing_field_is_user_fixable() {
        let err = FlowError::from(DomainError::MissingField("email"));
        assert!(err.is_user_fixable());
        assert_eq!(err.to_string(), "Missing required field: email");
    }
}
