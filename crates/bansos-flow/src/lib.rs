//! Bansos Flow - the onboarding wizard
//!
//! - [`reduce`]: pure transitions over [`WizardState`]
//! - Verification ports ([`KtpOcrPort`], [`FaceMatchPort`], [`LivenessPort`],
//!   [`KycSubmissionPort`]) and the [`Usecases`] that call them
//! - Latency-simulating mock ports
//! - [`OnboardingFlow`]: hydration, persistence and submission
//!
//! # Example
//!
//! ```rust
//! use bansos_flow::{reduce, Action, WizardState};
//! use bansos_core::StepKey;
//!
//! let state = reduce(WizardState::default(), Action::Next);
//! assert_eq!(state.step, StepKey::OcrReview);
//! ```

#![allow(missing_docs)]

pub mod error;
pub mod mock;
pub mod orchestrator;
pub mod ports;
pub mod reducer;

pub use error::{FlowError, PortError};
pub use mock::{
    mock_submission_id, mock_usecases, MockFaceMatch, MockLiveness, MockOcr, MockSubmitter,
};
pub use orchestrator::OnboardingFlow;
pub use ports::{
    FaceMatchPort, KtpOcrPort, KycSubmissionPort, LivenessPort, SubmissionReceipt, Usecases,
};
pub use reducer::{reduce, Action, Artifacts, WizardState};
