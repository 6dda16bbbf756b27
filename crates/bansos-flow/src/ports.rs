//! Verification ports and the use cases built on them
//!
//! Each port is an external service in production. [`Usecases`] forwards to
//! whatever ports it was built with; it adds no retries, timeouts or
//! cancellation.

use crate::error::PortError;
use crate::reducer::Artifacts;
use async_trait::async_trait;
use bansos_core::{Applicant, CapturedImage, FaceMatchingScore, LivenessResult, OcrResult};
use std::sync::Arc;

/// Extracts identity fields from a KTP photo
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait KtpOcrPort: Send + Sync {
    async fn extract(&self, image: &CapturedImage) -> Result<OcrResult, PortError>;
}

/// Compares the KTP portrait against a selfie
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FaceMatchPort: Send + Sync {
    async fn compare(
        &self,
        ktp_image: &CapturedImage,
        selfie_image: &CapturedImage,
    ) -> Result<FaceMatchingScore, PortError>;
}

/// Confirms a live person is in front of the camera
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LivenessPort: Send + Sync {
    async fn check(&self, sample: &CapturedImage) -> Result<LivenessResult, PortError>;
}

/// Identifier assigned to an accepted submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionReceipt {
    pub id: String,
}

/// Accepts the completed application
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait KycSubmissionPort: Send + Sync {
    async fn submit(
        &self,
        applicant: &Applicant,
        artifacts: &Artifacts,
    ) -> Result<SubmissionReceipt, PortError>;
}

/// The four onboarding use cases over injected ports
#[derive(Clone)]
pub struct Usecases {
    ocr: Arc<dyn KtpOcrPort>,
    face: Arc<dyn FaceMatchPort>,
    live: Arc<dyn LivenessPort>,
    submitter: Arc<dyn KycSubmissionPort>,
}

impl std::fmt::Debug for Usecases {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Usecases").finish_non_exhaustive()
    }
}

impl Usecases {
    #[must_use]
    pub fn new(
        ocr: Arc<dyn KtpOcrPort>,
        face: Arc<dyn FaceMatchPort>,
        live: Arc<dyn LivenessPort>,
        submitter: Arc<dyn KycSubmissionPort>,
    ) -> Self {
        Self {
            ocr,
            face,
            live,
            submitter,
        }
    }

    /// Same use cases with a different submission port
    #[must_use]
    pub fn with_submitter(mut self, submitter: Arc<dyn KycSubmissionPort>) -> Self {
        self.submitter = submitter;
        self
    }

    /// # Errors
    /// Whatever the OCR port reports.
    pub async fn extract_ktp(&self, image: &CapturedImage) -> Result<OcrResult, PortError> {
        self.ocr.extract(image).await
    }

    /// # Errors
    /// Whatever the face-match port reports.
    pub async fn compare_face(
        &self,
        ktp_image: &CapturedImage,
        selfie_image: &CapturedImage,
    ) -> Result<FaceMatchingScore, PortError> {
        self.face.compare(ktp_image, selfie_image).await
    }

    /// # Errors
    /// Whatever the liveness port reports.
    pub async fn check_liveness(&self, sample: &CapturedImage) -> Result<LivenessResult, PortError> {
        self.live.check(sample).await
    }

    /// # Errors
    /// Whatever the submission port reports.
    pub async fn submit_kyc(
        &self,
        applicant: &Applicant,
        artifacts: &Artifacts,
    ) -> Result<SubmissionReceipt, PortError> {
        self.submitter.submit(applicant, artifacts).await
    }
}
