//! Db generation and hydration
//!
//! Generation is deterministic: the same seed always yields the same
//! document. Hydration makes any persisted snapshot, however old, look like
//! the current schema.

use crate::error::DbError;
use crate::seed::{BeneficiarySeed, Seed};
use bansos_core::account::PortalAccountState;
use bansos_core::schema::{
    ApplicantSummary, Application, ClusteringCandidate, ClusteringParameters, ClusteringRun,
    ClusteringSummary, Db, Document, Liveness,
};
use bansos_core::mask_digits;

/// Face score at or above which a seeded face match counts as passed
pub const FACE_PASS_SCORE: f64 = 0.8;

pub const UNASSIGNED: &str = "UNASSIGNED";
pub const SEED_RUN_ID: &str = "CLUST-SEED";

/// `siti.aminah@contoh.id` for "Siti Aminah"
#[must_use]
pub fn default_email(name: &str) -> String {
    let mut local = String::with_capacity(name.len());
    let mut in_space = false;
    for c in name.to_lowercase().chars() {
        if c.is_whitespace() {
            if !in_space {
                local.push('.');
            }
            in_space = true;
        } else {
            local.push(c);
            in_space = false;
        }
    }
    if local.is_empty() {
        local.push_str("user");
    }
    format!("{local}@contoh.id")
}

/// Portal info for a beneficiary: explicit seed values win, the rest is
/// inferred from the scores and application status
#[must_use]
pub fn default_portal_info(seed: &BeneficiarySeed) -> PortalAccountState {
    let pinned = seed.portal.clone().unwrap_or_default();
    PortalAccountState {
        phone: pinned.phone.unwrap_or_else(|| seed.phone.clone()),
        email: Some(pinned.email.unwrap_or_else(|| default_email(&seed.name))),
        pin: pinned.pin,
        verification_status: Some(
            pinned
                .verification_status
                .unwrap_or_else(|| seed.status.verification_status()),
        ),
        face_match_passed: Some(
            pinned
                .face_match_passed
                .unwrap_or(seed.scores.face >= FACE_PASS_SCORE),
        ),
        liveness_passed: Some(
            pinned
                .liveness_passed
                .unwrap_or(seed.scores.liveness == Liveness::Ok),
        ),
    }
}

fn documents_for(id: &str) -> Vec<Document> {
    vec![
        Document {
            id: format!("{id}-KTP"),
            kind: "KTP".to_string(),
            url: "/mock/ktp1.jpg".to_string(),
            sha256: format!("{id}-ktp"),
        },
        Document {
            id: format!("{id}-SELFIE"),
            kind: "SELFIE".to_string(),
            url: "/mock/selfie1.jpg".to_string(),
            sha256: format!("{id}-selfie"),
        },
    ]
}

/// Backoffice application record for a beneficiary
#[must_use]
pub fn to_application(seed: &BeneficiarySeed) -> Application {
    Application {
        id: seed.application_id.clone(),
        applicant: ApplicantSummary {
            name: seed.name.clone(),
            nik_mask: mask_digits(&seed.nik),
            dob: seed.dob.clone(),
            phone_mask: mask_digits(&seed.phone),
        },
        region: seed.region.clone(),
        status: seed.status,
        scores: seed.scores,
        flags: seed.flags.clone(),
        assigned_to: seed
            .assigned_to
            .clone()
            .unwrap_or_else(|| UNASSIGNED.to_string()),
        aging_days: seed.aging_days,
        created_at: seed.created_at.clone(),
        documents: documents_for(&seed.application_id),
        visits: seed.visits.clone(),
        timeline: seed.timeline.clone(),
        survey: seed.survey.clone(),
        portal: Some(default_portal_info(seed)),
    }
}

#[must_use]
pub fn to_candidate(seed: &BeneficiarySeed) -> ClusteringCandidate {
    ClusteringCandidate {
        id: seed.application_id.clone(),
        name: seed.name.clone(),
        nik_mask: mask_digits(&seed.nik),
        region: seed.region.clone(),
        cluster: seed.recommended_cluster,
        priority: seed.recommended_priority,
        score: seed.cluster_score,
        beneficiaries: seed.household_size,
        status: seed.cluster_status,
        assigned_to: seed.assigned_to.clone(),
        reviewer: seed.reviewer.clone(),
        reviewed_at: seed.reviewed_at.clone(),
        notes: seed.cluster_notes.clone(),
    }
}

/// The seeded clustering run: candidates by descending score, then tallied
#[must_use]
pub fn create_initial_clustering_run(beneficiaries: &[BeneficiarySeed]) -> ClusteringRun {
    let mut results: Vec<ClusteringCandidate> = beneficiaries.iter().map(to_candidate).collect();
    results.sort_by(|a, b| b.score.total_cmp(&a.score));
    let summary = ClusteringSummary::tally(&results);

    ClusteringRun {
        id: SEED_RUN_ID.to_string(),
        operator: "seed".to_string(),
        started_at: "2025-10-18T06:00:00Z".to_string(),
        finished_at: "2025-10-18T06:00:05Z".to_string(),
        parameters: ClusteringParameters {
            dataset: "2025-Q4-Seeding".to_string(),
            window: "Rolling 90 hari".to_string(),
            algorithm: "k-means-v2".to_string(),
        },
        summary,
        results,
    }
}

/// Build a fresh database from `seed`
#[must_use]
pub fn generate_from(seed: &Seed) -> Db {
    let doc = &seed.document;
    let mut clustering_runs = vec![create_initial_clustering_run(&seed.beneficiaries)];
    clustering_runs.extend(doc.clustering_runs.iter().cloned());

    let mut db = Db {
        applications: seed.beneficiaries.iter().map(to_application).collect(),
        users: doc.users.clone(),
        config: doc.config.clone(),
        batches: doc.batches.clone(),
        audit: Vec::new(),
        clustering_runs,
        distributions: doc.distributions.clone(),
    };
    db.prune_batch_items();
    db
}

/// Build a fresh database from the embedded seed
///
/// # Errors
/// `DbError::Seed` if the embedded seed is malformed.
pub fn generate() -> Result<Db, DbError> {
    Ok(generate_from(&Seed::embedded()?))
}

/// Bring a parsed snapshot up to the current shape
///
/// Missing or `null` arrays are already empty after parsing; this also drops
/// batch items pointing at applications that no longer exist.
#[must_use]
pub fn hydrate(mut db: Db) -> Db {
    db.prune_batch_items();
    db
}

/// Parse and hydrate a stored document
///
/// # Errors
/// The JSON error when `raw` is not a database document.
pub fn parse_db(raw: &str) -> Result<Db, serde_json::Error> {
    serde_json::from_str(raw).map(hydrate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bansos_core::account::VerificationStatus;
    use bansos_core::schema::ClusteringPriority;
    use pretty_assertions::assert_eq;

    fn seed() -> Seed {
        Seed::embedded().unwrap()
    }

    #[test]
    fn seeded_run_tallies_every_beneficiary() {
        let seed = seed();
        let run = create_initial_clustering_run(&seed.beneficiaries);
        let s = run.summary;
        assert_eq!(s.total, seed.beneficiaries.len());
        assert_eq!(s.tinggi + s.sedang + s.rendah, s.total);
        assert_eq!((s.tinggi, s.sedang, s.rendah), (2, 1, 1));
    }

    #[test]
    fn seeded_run_is_sorted_by_score() {
        let run = create_initial_clustering_run(&seed().beneficiaries);
        let scores: Vec<f64> = run.results.iter().map(|c| c.score).collect();
        assert!(scores.windows(2).all(|w| w[0] >= w[1]));
        assert_eq!(run.results[0].id, "APP-2025-0003");
        assert_eq!(run.results[0].priority, ClusteringPriority::Tinggi);
    }

    #[test]
    fn generate_masks_pii() {
        let db = generate().unwrap();
        let app = db.application("APP-2025-0001").unwrap();
        assert_eq!(app.applicant.nik_mask, "************0001");
        assert_eq!(app.applicant.phone_mask, "*******0001");
        assert_eq!(app.documents.len(), 2);
        assert_eq!(app.documents[1].sha256, "APP-2025-0001-selfie");
    }

    #[test]
    fn generate_filters_unknown_batch_items() {
        let db = generate().unwrap();
        assert_eq!(db.batches[0].items, vec!["APP-2025-0002", "APP-2025-0003"]);
    }

    #[test]
    fn generate_starts_with_seeded_run_and_empty_audit() {
        let db = generate().unwrap();
        assert_eq!(db.clustering_runs[0].id, SEED_RUN_ID);
        assert!(db.audit.is_empty());
    }

    #[test]
    fn unassigned_application_gets_marker() {
        let db = generate().unwrap();
        let app = db.application("APP-2025-0004").unwrap();
        assert_eq!(app.assigned_to, UNASSIGNED);
    }

    #[test]
    fn portal_info_inferred_from_scores_and_status() {
        let seed = seed();
        let lestari = seed
            .beneficiaries
            .iter()
            .find(|b| b.application_id == "APP-2025-0004")
            .unwrap();
        let portal = default_portal_info(lestari);
        assert_eq!(portal.phone, "08123450004");
        assert_eq!(portal.email.as_deref(), Some("lestari.dewi@contoh.id"));
        assert_eq!(portal.pin, None);
        // face 0.79 is below the pass score
        assert_eq!(portal.face_match_passed, Some(false));
        assert_eq!(portal.liveness_passed, Some(true));
        assert_eq!(
            portal.verification_status,
            Some(VerificationStatus::SedangDitinjau)
        );

        let andi = seed
            .beneficiaries
            .iter()
            .find(|b| b.application_id == "APP-2025-0003")
            .unwrap();
        assert_eq!(
            default_portal_info(andi).verification_status,
            Some(VerificationStatus::Disetujui)
        );
    }

    #[test]
    fn default_email_collapses_whitespace() {
        assert_eq!(default_email("Siti  Aminah"), "siti.aminah@contoh.id");
        assert_eq!(default_email(""), "user@contoh.id");
    }

    #[test]
    fn generation_is_deterministic() {
        assert_eq!(generate().unwrap(), generate().unwrap());
    }

    #[test]
    fn hydrate_backfills_old_snapshot() {
        let mut value = serde_json::to_value(generate().unwrap()).unwrap();
        let obj = value.as_object_mut().unwrap();
        obj.remove("audit");
        obj.remove("clusteringRuns");
        obj.insert("distributions".into(), serde_json::Value::Null);

        let db = parse_db(&value.to_string()).unwrap();
        assert!(db.audit.is_empty());
        assert!(db.clustering_runs.is_empty());
        assert!(db.distributions.is_empty());
        assert_eq!(db.applications.len(), 4);
    }
}
