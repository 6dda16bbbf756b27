//! Shared mock database document
//!
//! A single JSON document read and written by both the backoffice and the
//! citizen portal. Top-level arrays added after the first release carry
//! `#[serde(default)]` so older snapshots still load (hydration instead of
//! migrations).

use crate::account::{PortalAccountState, SurveyState, VerificationStatus};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashSet;

/// Backoffice application status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AppStatus {
    Draft,
    Submitted,
    DeskReview,
    FieldVisit,
    FinalApproved,
    FinalRejected,
    ReturnedForRevision,
    DisbursementReady,
    Disbursed,
    DisbursementFailed,
}

impl AppStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "DRAFT",
            Self::Submitted => "SUBMITTED",
            Self::DeskReview => "DESK_REVIEW",
            Self::FieldVisit => "FIELD_VISIT",
            Self::FinalApproved => "FINAL_APPROVED",
            Self::FinalRejected => "FINAL_REJECTED",
            Self::ReturnedForRevision => "RETURNED_FOR_REVISION",
            Self::DisbursementReady => "DISBURSEMENT_READY",
            Self::Disbursed => "DISBURSED",
            Self::DisbursementFailed => "DISBURSEMENT_FAILED",
        }
    }

    /// Citizen-facing status for this backoffice status
    #[must_use]
    pub fn verification_status(self) -> VerificationStatus {
        match self {
            Self::FinalApproved | Self::Disbursed | Self::DisbursementReady => {
                VerificationStatus::Disetujui
            }
            Self::FinalRejected | Self::DisbursementFailed => VerificationStatus::Ditolak,
            _ => VerificationStatus::SedangDitinjau,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicantSummary {
    pub name: String,
    pub nik_mask: String,
    pub dob: String,
    pub phone_mask: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub prov: String,
    pub kab: String,
    pub kec: String,
    pub kel: String,
}

impl std::fmt::Display for Region {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}, {}, {}, {}", self.kel, self.kec, self.kab, self.prov)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub url: String,
    pub sha256: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VisitStatus {
    Planned,
    InProgress,
    Submitted,
    Verified,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoTag {
    pub lat: f64,
    pub lng: f64,
}

/// TKSK field visit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Visit {
    pub id: String,
    pub scheduled_at: String,
    #[serde(default)]
    pub geotag: Option<GeoTag>,
    #[serde(default)]
    pub photos: Vec<String>,
    #[serde(default)]
    pub checklist: serde_json::Map<String, serde_json::Value>,
    pub status: VisitStatus,
    pub tksk_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineItem {
    pub at: String,
    pub by: String,
    pub action: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Liveness {
    #[serde(rename = "OK")]
    Ok,
    #[serde(rename = "NOK")]
    Nok,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Scores {
    pub ocr: f64,
    pub face: f64,
    pub liveness: Liveness,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DuplicateCandidate {
    pub id: String,
    pub name: String,
    pub similarity: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selfie_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RiskFlags {
    pub duplicate_nik: bool,
    pub duplicate_face: bool,
    pub device_anomaly: bool,
    pub similarity: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub escalated: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duplicate_confirmed: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub candidates: Option<Vec<DuplicateCandidate>>,
}

/// One beneficiary application
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Application {
    pub id: String,
    pub applicant: ApplicantSummary,
    pub region: Region,
    pub status: AppStatus,
    pub scores: Scores,
    pub flags: RiskFlags,
    pub assigned_to: String,
    pub aging_days: u32,
    pub created_at: String,
    #[serde(default)]
    pub documents: Vec<Document>,
    #[serde(default)]
    pub visits: Vec<Visit>,
    #[serde(default)]
    pub timeline: Vec<TimelineItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub survey: Option<SurveyState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub portal: Option<PortalAccountState>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Admin,
    Risk,
    Tksk,
    Auditor,
}

/// Backoffice user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    pub role: Role,
    pub region_scope: Vec<String>,
    pub nik: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub pin: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    pub ocr_min: f64,
    pub face_min: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Features {
    pub enable_appeal: bool,
    #[serde(rename = "enableOfflineTKSK")]
    pub enable_offline_tksk: bool,
}

/// Program configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub period: String,
    pub thresholds: Thresholds,
    pub features: Features,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BatchStatus {
    Draft,
    Signed,
    Exported,
    Sent,
}

/// Disbursement batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Batch {
    pub id: String,
    pub code: String,
    pub status: BatchStatus,
    /// Application ids
    pub items: Vec<String>,
    pub checksum: String,
}

/// Append-only audit trail entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub at: String,
    pub actor: String,
    pub entity: String,
    pub action: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DistributionChannel {
    BankTransfer,
    Pospay,
    Tunai,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DistributionStatus {
    Planned,
    InProgress,
    Completed,
}

/// Scheduled aid distribution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Distribution {
    pub id: String,
    pub name: String,
    pub scheduled_at: String,
    pub channel: DistributionChannel,
    pub location: String,
    pub batch_codes: Vec<String>,
    pub beneficiaries: Vec<String>,
    pub notified: Vec<String>,
    pub status: DistributionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub created_by: String,
    pub created_at: String,
    pub updated_by: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClusteringPriority {
    Rendah,
    Sedang,
    Tinggi,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClusteringStatus {
    PendingReview,
    InReview,
    Approved,
}

/// Recommended aid program
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Cluster {
    Pkh,
    Bpnt,
    Pbi,
    Lainnya,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusteringCandidate {
    pub id: String,
    pub name: String,
    #[serde(rename = "nik_mask")]
    pub nik_mask: String,
    pub region: Region,
    pub cluster: Cluster,
    pub priority: ClusteringPriority,
    pub score: f64,
    pub beneficiaries: u32,
    pub status: ClusteringStatus,
    #[serde(default)]
    pub assigned_to: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reviewer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reviewed_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusteringParameters {
    pub dataset: String,
    pub window: String,
    pub algorithm: String,
}

/// Priority bucket tally
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusteringSummary {
    pub total: usize,
    pub tinggi: usize,
    pub sedang: usize,
    pub rendah: usize,
}

impl ClusteringSummary {
    /// Count candidates per priority bucket
    #[must_use]
    pub fn tally<'a>(candidates: impl IntoIterator<Item = &'a ClusteringCandidate>) -> Self {
        candidates
            .into_iter()
            .fold(Self::default(), |mut acc, candidate| {
                acc.total += 1;
                match candidate.priority {
                    ClusteringPriority::Tinggi => acc.tinggi += 1,
                    ClusteringPriority::Sedang => acc.sedang += 1,
                    ClusteringPriority::Rendah => acc.rendah += 1,
                }
                acc
            })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusteringRun {
    pub id: String,
    pub operator: String,
    pub started_at: String,
    pub finished_at: String,
    pub parameters: ClusteringParameters,
    pub summary: ClusteringSummary,
    pub results: Vec<ClusteringCandidate>,
}

/// The whole shared document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Db {
    pub applications: Vec<Application>,
    pub users: Vec<User>,
    pub config: Config,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub batches: Vec<Batch>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub audit: Vec<AuditEntry>,
    /// Most recent first
    #[serde(default, deserialize_with = "null_as_empty")]
    pub clustering_runs: Vec<ClusteringRun>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub distributions: Vec<Distribution>,
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<Vec<T>>::deserialize(deserializer).map(Option::unwrap_or_default)
}

impl Db {
    #[must_use]
    pub fn application(&self, id: &str) -> Option<&Application> {
        self.applications.iter().find(|app| app.id == id)
    }

    #[must_use]
    pub fn application_mut(&mut self, id: &str) -> Option<&mut Application> {
        self.applications.iter_mut().find(|app| app.id == id)
    }

    /// Drop batch items that reference no known application
    pub fn prune_batch_items(&mut self) {
        let known: HashSet<&str> = self.applications.iter().map(|a| a.id.as_str()).collect();
        for batch in &mut self.batches {
            batch.items.retain(|item| known.contains(item.as_str()));
        }
    }
}
