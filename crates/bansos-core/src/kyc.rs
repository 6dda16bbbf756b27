//! Verification records produced during onboarding
//!
//! Identity fields extracted from the KTP, face-match and liveness verdicts,
//! the applicant record submitted at the end of the flow, and captured images.

use crate::error::DomainError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Identity fields printed on a KTP
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NationalId {
    pub number: String,
    pub name: String,
    pub birth_date: String,
    pub address: String,
}

/// OCR extraction output
///
/// Every identity field is optional: the extractor may miss some of them and
/// the citizen fills the gaps during review.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OcrResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    /// Extractor confidence in `[0, 1]`
    #[serde(default)]
    pub confidence: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_text: Option<String>,
}

impl OcrResult {
    /// Shallow-merge a manual correction; absent patch fields keep their value
    pub fn apply(&mut self, patch: OcrPatch) {
        if let Some(number) = patch.number {
            self.number = Some(number);
        }
        if let Some(name) = patch.name {
            self.name = Some(name);
        }
        if let Some(birth_date) = patch.birth_date {
            self.birth_date = Some(birth_date);
        }
        if let Some(address) = patch.address {
            self.address = Some(address);
        }
    }
}

/// Manual OCR correction made on the review step
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OcrPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

impl OcrPatch {
    #[must_use]
    pub fn name(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }
}

/// Face comparison score against the configured threshold
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FaceMatchingScore {
    pub score: f64,
    pub threshold: f64,
}

impl FaceMatchingScore {
    #[inline]
    #[must_use]
    pub fn passed(&self) -> bool {
        self.score >= self.threshold
    }
}

/// Liveness challenge verdict
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LivenessResult {
    pub passed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signal: Option<String>,
}

/// Complete applicant record sent on submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Applicant {
    #[serde(flatten)]
    pub identity: NationalId,
    pub phone: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pin: Option<String>,
}

/// Partial applicant accumulated on the data-entry step
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicantDraft {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pin: Option<String>,
}

impl ApplicantDraft {
    /// Shallow merge: fields present in `patch` overwrite
    pub fn merge(&mut self, patch: ApplicantDraft) {
        fn take(slot: &mut Option<String>, value: Option<String>) {
            if value.is_some() {
                *slot = value;
            }
        }
        take(&mut self.number, patch.number);
        take(&mut self.name, patch.name);
        take(&mut self.birth_date, patch.birth_date);
        take(&mut self.address, patch.address);
        take(&mut self.phone, patch.phone);
        take(&mut self.email, patch.email);
        take(&mut self.pin, patch.pin);
    }

    /// Fill identity fields from OCR where the draft has none
    #[must_use]
    pub fn with_ocr_defaults(mut self, ocr: Option<&OcrResult>) -> Self {
        if let Some(ocr) = ocr {
            self.number = self.number.or_else(|| ocr.number.clone());
            self.name = self.name.or_else(|| ocr.name.clone());
            self.birth_date = self.birth_date.or_else(|| ocr.birth_date.clone());
            self.address = self.address.or_else(|| ocr.address.clone());
        }
        self
    }
}

/// Build a complete applicant, rejecting the first missing field
///
/// # Errors
/// `DomainError::MissingField` naming the first of `number, name, birthDate,
/// address, phone, email` that is absent or empty.
pub fn create_applicant(draft: ApplicantDraft) -> Result<Applicant, DomainError> {
    fn required(value: Option<String>, field: &'static str) -> Result<String, DomainError> {
        match value {
            Some(v) if !v.is_empty() => Ok(v),
            _ => Err(DomainError::MissingField(field)),
        }
    }

    let number = required(draft.number, "number")?;
    let name = required(draft.name, "name")?;
    let birth_date = required(draft.birth_date, "birthDate")?;
    let address = required(draft.address, "address")?;
    let phone = required(draft.phone, "phone")?;
    let email = required(draft.email, "email")?;

    Ok(Applicant {
        identity: NationalId {
            number,
            name,
            birth_date,
            address,
        },
        phone,
        email,
        pin: draft.pin,
    })
}

/// Image captured on-device
///
/// Cloning shares the underlying bytes. Never serialized: captures live only
/// for the current session.
#[derive(Clone, PartialEq, Eq)]
pub struct CapturedImage {
    pub file_name: String,
    pub mime_type: String,
    bytes: Arc<[u8]>,
}

impl CapturedImage {
    pub fn new(file_name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            mime_type: mime_type.into(),
            bytes: bytes.into(),
        }
    }

    #[inline]
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl std::fmt::Debug for CapturedImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CapturedImage")
            .field("file_name", &self.file_name)
            .field("mime_type", &self.mime_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}
