//! Embedded seed documents
//!
//! Two JSON files compiled into the crate:
//! - `beneficiaries.json`: one record per beneficiary, carrying both the
//!   application fields and the clustering recommendation
//! - `seed.json`: backoffice users, program config, batches, distributions

use crate::error::DbError;
use bansos_core::account::{SurveyState, VerificationStatus};
use bansos_core::schema::{
    AppStatus, Batch, Cluster, ClusteringPriority, ClusteringRun, ClusteringStatus, Config,
    Distribution, Region, RiskFlags, Scores, TimelineItem, User, Visit,
};
use serde::Deserialize;

const BENEFICIARIES_JSON: &str = include_str!("../seed/beneficiaries.json");
const SEED_JSON: &str = include_str!("../seed/seed.json");

/// Portal fields a seed record may pin explicitly
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortalSeed {
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub pin: Option<String>,
    #[serde(default)]
    pub verification_status: Option<VerificationStatus>,
    #[serde(default)]
    pub face_match_passed: Option<bool>,
    #[serde(default)]
    pub liveness_passed: Option<bool>,
}

/// One seeded beneficiary
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BeneficiarySeed {
    pub application_id: String,
    pub name: String,
    pub nik: String,
    pub dob: String,
    pub phone: String,
    pub region: Region,
    pub status: AppStatus,
    pub scores: Scores,
    pub flags: RiskFlags,
    #[serde(default)]
    pub assigned_to: Option<String>,
    pub aging_days: u32,
    pub created_at: String,
    #[serde(default)]
    pub visits: Vec<Visit>,
    #[serde(default)]
    pub timeline: Vec<TimelineItem>,
    #[serde(default)]
    pub survey: Option<SurveyState>,
    #[serde(default)]
    pub portal: Option<PortalSeed>,
    pub household_size: u32,
    pub recommended_cluster: Cluster,
    pub recommended_priority: ClusteringPriority,
    pub cluster_score: f64,
    pub cluster_status: ClusteringStatus,
    #[serde(default)]
    pub reviewer: Option<String>,
    #[serde(default)]
    pub reviewed_at: Option<String>,
    #[serde(default)]
    pub cluster_notes: Option<String>,
}

/// Static backoffice data
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedDocument {
    pub users: Vec<User>,
    pub config: Config,
    #[serde(default)]
    pub batches: Vec<Batch>,
    #[serde(default)]
    pub distributions: Vec<Distribution>,
    /// Runs older than the seeded one
    #[serde(default)]
    pub clustering_runs: Vec<ClusteringRun>,
}

/// Everything a fresh database is generated from
#[derive(Debug, Clone)]
pub struct Seed {
    pub beneficiaries: Vec<BeneficiarySeed>,
    pub document: SeedDocument,
}

impl Seed {
    /// Parse the seed compiled into this crate
    ///
    /// # Errors
    /// `DbError::Seed` if either embedded document is malformed.
    pub fn embedded() -> Result<Self, DbError> {
        Self::from_json(BENEFICIARIES_JSON, SEED_JSON)
    }

    /// # Errors
    /// `DbError::Seed` if either document is malformed.
    pub fn from_json(beneficiaries: &str, document: &str) -> Result<Self, DbError> {
        Ok(Self {
            beneficiaries: serde_json::from_str(beneficiaries).map_err(DbError::Seed)?,
            document: serde_json::from_str(document).map_err(DbError::Seed)?,
        })
    }
}
