//! Onboarding step sequence
//!
//! The wizard walks a fixed, ordered list of eight stages. `Done` is terminal.

use crate::error::DomainError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// One stage of the onboarding wizard
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StepKey {
    /// Capture the KTP (ID card) photo
    #[default]
    UploadKtp,
    /// Review and correct OCR output
    OcrReview,
    /// Capture a selfie holding the KTP
    Selfie,
    /// Compare the selfie against the KTP photo
    FaceMatch,
    /// Gesture-based liveness challenge
    Liveness,
    /// Contact details
    DataEntry,
    /// Final review before submission
    ReviewSubmit,
    /// Submission accepted
    Done,
}

/// All steps in forward order
pub const ALL_STEPS: [StepKey; 8] = [
    StepKey::UploadKtp,
    StepKey::OcrReview,
    StepKey::Selfie,
    StepKey::FaceMatch,
    StepKey::Liveness,
    StepKey::DataEntry,
    StepKey::ReviewSubmit,
    StepKey::Done,
];

impl StepKey {
    /// Position in [`ALL_STEPS`]
    #[inline]
    #[must_use]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Step at `index`, if any
    #[inline]
    #[must_use]
    pub fn from_index(index: usize) -> Option<Self> {
        ALL_STEPS.get(index).copied()
    }

    /// Following step, saturating at `Done`
    #[inline]
    #[must_use]
    pub fn next(self) -> Self {
        ALL_STEPS[(self.index() + 1).min(ALL_STEPS.len() - 1)]
    }

    /// Preceding step, saturating at `UploadKtp`
    #[inline]
    #[must_use]
    pub fn back(self) -> Self {
        ALL_STEPS[self.index().saturating_sub(1)]
    }

    #[inline]
    #[must_use]
    pub fn is_terminal(self) -> bool {
        self == Self::Done
    }

    /// Wire name, as persisted
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::UploadKtp => "UPLOAD_KTP",
            Self::OcrReview => "OCR_REVIEW",
            Self::Selfie => "SELFIE",
            Self::FaceMatch => "FACE_MATCH",
            Self::Liveness => "LIVENESS",
            Self::DataEntry => "DATA_ENTRY",
            Self::ReviewSubmit => "REVIEW_SUBMIT",
            Self::Done => "DONE",
        }
    }

    /// Label shown to citizens
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::UploadKtp => "Kamera KTP",
            Self::OcrReview => "Isi Data KTP",
            Self::Selfie => "Selfie + Pegang KTP",
            Self::FaceMatch => "Komparasi Wajah",
            Self::Liveness => "Liveness",
            Self::DataEntry => "Data Tambahan",
            Self::ReviewSubmit => "Review & Submit",
            Self::Done => "Selesai",
        }
    }
}

impl std::fmt::Display for StepKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StepKey {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ALL_STEPS
            .iter()
            .copied()
            .find(|step| step.as_str() == s)
            .ok_or_else(|| DomainError::UnknownStep(s.to_string()))
    }
}
