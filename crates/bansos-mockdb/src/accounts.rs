//! Portal account directory
//!
//! Accounts are derived, never stored: each application's embedded portal
//! info overlaid with the portal-state override for that application id.
//! Overrides for ids that are not in the database are ignored.

use crate::generate::default_email;
use bansos_core::account::{Account, PortalAccountState, PortalState};
use bansos_core::kyc::{Applicant, NationalId};
use bansos_core::schema::{Application, Db};
use bansos_core::normalize_phone;

fn to_account(app: &Application, over: Option<&PortalAccountState>) -> Option<Account> {
    let base = app.portal.clone().unwrap_or_default();
    let portal = match over {
        Some(over) => base.overlay(over),
        None => base,
    };
    if portal.phone.is_empty() {
        return None;
    }

    Some(Account {
        pin_set: portal.pin.as_deref().is_some_and(|pin| !pin.is_empty()),
        submission_id: app.id.clone(),
        applicant: Applicant {
            identity: NationalId {
                number: app.applicant.nik_mask.clone(),
                name: app.applicant.name.clone(),
                birth_date: app.applicant.dob.clone(),
                address: app.region.to_string(),
            },
            phone: portal.phone.clone(),
            email: portal
                .email
                .clone()
                .unwrap_or_else(|| default_email(&app.applicant.name)),
            pin: None,
        },
        created_at: app.created_at.clone(),
        face_match_passed: portal.face_match_passed.unwrap_or(false),
        liveness_passed: portal.liveness_passed.unwrap_or(false),
        verification_status: portal
            .verification_status
            .unwrap_or_else(|| app.status.verification_status()),
        survey: app.survey.clone(),
        phone: portal.phone,
    })
}

/// One account per application that has a phone number
#[must_use]
pub fn derive_accounts(db: &Db, overrides: &PortalState) -> Vec<Account> {
    db.applications
        .iter()
        .filter_map(|app| to_account(app, overrides.get(&app.id)))
        .collect()
}

/// Match on digits only, so `0812-345-0001` finds `08123450001`
#[must_use]
pub fn find_by_phone(accounts: impl IntoIterator<Item = Account>, phone: &str) -> Option<Account> {
    let wanted = normalize_phone(phone);
    if wanted.is_empty() {
        return None;
    }
    accounts
        .into_iter()
        .find(|account| normalize_phone(&account.phone) == wanted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generate::generate;
    use bansos_core::account::VerificationStatus;

    #[test]
    fn every_seeded_application_has_an_account() {
        let db = generate().unwrap();
        let accounts = derive_accounts(&db, &PortalState::new());
        assert_eq!(accounts.len(), db.applications.len());
        assert!(accounts.iter().all(|a| a.applicant.pin.is_none()));
    }

    #[test]
    fn pin_is_reported_as_flag_only() {
        let db = generate().unwrap();
        let accounts = derive_accounts(&db, &PortalState::new());
        let siti = find_by_phone(accounts.clone(), "08123450001").unwrap();
        assert!(siti.pin_set);
        let lestari = find_by_phone(accounts, "08123450004").unwrap();
        assert!(!lestari.pin_set);
        let json = serde_json::to_string(&siti).unwrap();
        assert!(!json.contains("123456"));
    }

    #[test]
    fn override_wins_field_by_field() {
        let db = generate().unwrap();
        let mut overrides = PortalState::new();
        overrides.insert(
            "APP-2025-0004".into(),
            PortalAccountState {
                phone: String::new(),
                pin: Some("999999".into()),
                verification_status: Some(VerificationStatus::Ditolak),
                ..PortalAccountState::default()
            },
        );
        overrides.insert(
            "APP-GHOST".into(),
            PortalAccountState {
                phone: "0899".into(),
                ..PortalAccountState::default()
            },
        );

        let accounts = derive_accounts(&db, &overrides);
        assert_eq!(accounts.len(), 4);
        let lestari = find_by_phone(accounts.clone(), "08123450004").unwrap();
        assert!(lestari.pin_set);
        assert_eq!(lestari.verification_status, VerificationStatus::Ditolak);
        assert_eq!(lestari.applicant.email, "lestari.dewi@contoh.id");
        assert!(find_by_phone(accounts, "0899").is_none());
    }

    #[test]
    fn phone_lookup_ignores_formatting() {
        let db = generate().unwrap();
        let accounts = derive_accounts(&db, &PortalState::new());
        let found = find_by_phone(accounts.clone(), "0812-345-0002").unwrap();
        assert_eq!(found.submission_id, "APP-2025-0002");
        assert!(find_by_phone(accounts, "  ").is_none());
    }
}
