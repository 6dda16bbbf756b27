//! Citizen-facing account records
//!
//! An [`Account`] is what the portal shows a signed-in beneficiary. It is
//! never stored directly: it is re-derived from the shared database and the
//! portal overrides every time it is needed.

use crate::kyc::Applicant;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// Verification state visible to the citizen
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VerificationStatus {
    #[default]
    SedangDitinjau,
    Disetujui,
    Ditolak,
}

impl VerificationStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SedangDitinjau => "SEDANG_DITINJAU",
            Self::Disetujui => "DISETUJUI",
            Self::Ditolak => "DITOLAK",
        }
    }
}

/// Survey workflow state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SurveyStatus {
    BelumDikumpulkan,
    Antrean,
    Diperiksa,
    Disetujui,
    Ditolak,
}

/// Household composition (part B)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SurveyHousehold {
    /// Empty string on the wire when not answered yet
    #[serde(default, deserialize_with = "count_or_blank")]
    pub household_members: Option<u32>,
    #[serde(default)]
    pub school_children: String,
    #[serde(default)]
    pub toddlers: String,
    #[serde(default)]
    pub elderly: String,
    #[serde(default)]
    pub disability: String,
}

/// Education and income (part C)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SurveyEconomy {
    #[serde(default)]
    pub education: String,
    #[serde(default)]
    pub occupation: String,
    #[serde(default)]
    pub income: String,
    #[serde(default)]
    pub extra_income: String,
}

/// Housing conditions and assets (part D)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SurveyHousing {
    #[serde(default)]
    pub home_ownership: String,
    #[serde(default)]
    pub floor_type: String,
    #[serde(default)]
    pub wall_type: String,
    #[serde(default)]
    pub roof_type: String,
    #[serde(default)]
    pub vehicle: String,
    #[serde(default)]
    pub savings: String,
    #[serde(default)]
    pub lighting: String,
    #[serde(default)]
    pub water_source: String,
    #[serde(default)]
    pub cooking_fuel: String,
    #[serde(default)]
    pub toilet: String,
    #[serde(default)]
    pub waste_disposal: String,
    #[serde(default)]
    pub sanitation: String,
}

/// Health access (part E)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SurveyHealth {
    #[serde(default)]
    pub health_check: String,
}

/// Socio-economic survey answers
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SurveyAnswers {
    #[serde(default)]
    pub part_b: SurveyHousehold,
    #[serde(default)]
    pub part_c: SurveyEconomy,
    #[serde(default)]
    pub part_d: SurveyHousing,
    #[serde(default)]
    pub part_e: SurveyHealth,
}

/// Survey progress attached to an application
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurveyState {
    pub completed: bool,
    #[serde(default, alias = "submittedAt", skip_serializing_if = "Option::is_none")]
    pub submitted_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answers: Option<SurveyAnswers>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<SurveyStatus>,
}

/// Portal-side view of an application's account
///
/// Stored both inside each application (`portal`) and, as overrides, in the
/// separate portal state document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortalAccountState {
    pub phone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pin: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verification_status: Option<VerificationStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub face_match_passed: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub liveness_passed: Option<bool>,
}

impl PortalAccountState {
    /// Field-wise overlay: values present in `over` win
    #[must_use]
    pub fn overlay(&self, over: &PortalAccountState) -> PortalAccountState {
        PortalAccountState {
            phone: if over.phone.is_empty() {
                self.phone.clone()
            } else {
                over.phone.clone()
            },
            email: over.email.clone().or_else(|| self.email.clone()),
            pin: over.pin.clone().or_else(|| self.pin.clone()),
            verification_status: over.verification_status.or(self.verification_status),
            face_match_passed: over.face_match_passed.or(self.face_match_passed),
            liveness_passed: over.liveness_passed.or(self.liveness_passed),
        }
    }
}

/// Application id -> portal override
pub type PortalState = BTreeMap<String, PortalAccountState>;

/// A citizen's portal-visible profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    /// Identity key
    pub phone: String,
    /// Whether a PIN is set; the PIN itself is never exposed
    pub pin_set: bool,
    pub submission_id: String,
    pub applicant: Applicant,
    pub created_at: String,
    pub face_match_passed: bool,
    pub liveness_passed: bool,
    pub verification_status: VerificationStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub survey: Option<SurveyState>,
}

fn count_or_blank<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Count(u32),
        Text(String),
    }

    match Option::<Raw>::deserialize(deserializer)? {
        Some(Raw::Count(n)) => Ok(Some(n)),
        Some(Raw::Text(s)) if s.trim().is_empty() => Ok(None),
        Some(Raw::Text(s)) => s.trim().parse().map(Some).map_err(serde::de::Error::custom),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn household_members_accepts_blank() {
        let part: SurveyHousehold = serde_json::from_str(r#"{"householdMembers": ""}"#).unwrap();
        assert_eq!(part.household_members, None);
        let part: SurveyHousehold = serde_json::from_str(r#"{"householdMembers": 4}"#).unwrap();
        assert_eq!(part.household_members, Some(4));
    }

    #[test]
    fn survey_state_reads_both_timestamp_spellings() {
        let a: SurveyState =
            serde_json::from_str(r#"{"completed": true, "submittedAt": "x"}"#).unwrap();
        let b: SurveyState =
            serde_json::from_str(r#"{"completed": true, "submitted_at": "x"}"#).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn survey_status_wire_names() {
        let s = serde_json::to_string(&SurveyStatus::BelumDikumpulkan).unwrap();
        assert_eq!(s, "\"belum-dikumpulkan\"");
    }

    #[test]
    fn overlay_prefers_override_fields() {
        let base = PortalAccountState {
            phone: "0811".into(),
            email: Some("a@contoh.id".into()),
            face_match_passed: Some(true),
            ..PortalAccountState::default()
        };
        let over = PortalAccountState {
            phone: String::new(),
            email: Some("b@contoh.id".into()),
            verification_status: Some(VerificationStatus::Disetujui),
            ..PortalAccountState::default()
        };
        let merged = base.overlay(&over);
        assert_eq!(merged.phone, "0811");
        assert_eq!(merged.email.as_deref(), Some("b@contoh.id"));
        assert_eq!(merged.face_match_passed, Some(true));
        assert_eq!(merged.verification_status, Some(VerificationStatus::Disetujui));
    }
}
