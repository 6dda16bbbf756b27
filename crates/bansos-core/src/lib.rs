//! Bansos Core - domain model for the e-KYC onboarding portal
//!
//! Shared by every other crate in the workspace:
//! - The fixed onboarding step sequence
//! - Verification results (OCR, face match, liveness)
//! - Applicant and account records, NIK rules
//! - The shared mock database document schema
//! - Portal configuration
//!
//! # Example
//!
//! ```rust
//! use bansos_core::{mask_digits, StepKey};
//!
//! assert_eq!(StepKey::UploadKtp.next(), StepKey::OcrReview);
//! assert_eq!(mask_digits("3271011234560001"), "************0001");
//! ```

#![allow(missing_docs)]

pub mod account;
pub mod config;
pub mod error;
pub mod kyc;
pub mod nik;
pub mod schema;
pub mod step;

pub use account::{
    Account, PortalAccountState, PortalState, SurveyAnswers, SurveyState, SurveyStatus,
    VerificationStatus,
};
pub use config::{MockLatency, PortalConfig};
pub use error::DomainError;
pub use kyc::{
    create_applicant, Applicant, ApplicantDraft, CapturedImage, FaceMatchingScore,
    LivenessResult, NationalId, OcrPatch, OcrResult,
};
pub use nik::{is_valid_nik, mask_digits, normalize_phone};
pub use schema::{
    AppStatus, Application, AuditEntry, Batch, ClusteringCandidate, ClusteringPriority,
    ClusteringRun, ClusteringSummary, Db, Distribution, Region, User,
};
pub use step::{StepKey, ALL_STEPS};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
