//! The shared database service
//!
//! Every mutation is read-modify-write of the whole document followed by a
//! broadcast to peer origins. Storage faults are logged and swallowed: the
//! portal keeps working on the in-memory copy.

use crate::accounts::{derive_accounts, find_by_phone};
use crate::error::DbError;
use crate::generate::{generate, hydrate, parse_db};
use bansos_core::account::{
    Account, PortalAccountState, PortalState, SurveyAnswers, SurveyState, SurveyStatus,
};
use bansos_core::schema::{AuditEntry, Db, TimelineItem};
use bansos_store::keys::{LEGACY_DB_KEY, PORTAL_STATE_KEY, SHARED_DB_KEY};
use bansos_store::{read_json, remove_key, write_json, SharedStore, StorageSync};
use chrono::{DateTime, SecondsFormat, Utc};
use std::sync::Arc;
use tracing::{debug, info, warn};

pub const SURVEY_SUBMITTED: &str = "SURVEY_SUBMITTED";

/// Shared database over a key-value store
#[derive(Clone)]
pub struct SharedDb {
    store: SharedStore,
    sync: Arc<dyn StorageSync>,
}

impl std::fmt::Debug for SharedDb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedDb")
            .field("store", &self.store)
            .finish_non_exhaustive()
    }
}

impl SharedDb {
    #[inline]
    #[must_use]
    pub fn new(store: SharedStore, sync: Arc<dyn StorageSync>) -> Self {
        Self { store, sync }
    }

    #[must_use]
    pub fn store(&self) -> &SharedStore {
        &self.store
    }

    fn read_raw(&self, key: &str) -> Option<String> {
        match self.store.get_item(key) {
            Ok(raw) => raw.filter(|raw| !raw.is_empty()),
            Err(e) => {
                warn!(key, error = %e, "storage read failed, treating as absent");
                None
            }
        }
    }

    /// Current database, generating and saving it on first use
    ///
    /// A snapshot found only under the legacy key is moved to the shared key.
    /// An unparseable snapshot is deleted and replaced by a generated one.
    ///
    /// # Errors
    /// `DbError::Seed` if a database has to be generated and the embedded
    /// seed is broken.
    pub fn load(&self) -> Result<Db, DbError> {
        self.sync.ensure_started();

        let (key, raw) = match self.read_raw(SHARED_DB_KEY) {
            Some(raw) => (SHARED_DB_KEY, Some(raw)),
            None => (LEGACY_DB_KEY, self.read_raw(LEGACY_DB_KEY)),
        };

        if let Some(raw) = raw {
            match parse_db(&raw) {
                Ok(db) => {
                    if key == LEGACY_DB_KEY {
                        info!("migrating shared database from legacy key");
                        self.save(&db);
                        remove_key(self.store.as_ref(), LEGACY_DB_KEY);
                    }
                    return Ok(db);
                }
                Err(e) => {
                    warn!(key, error = %e, "discarding corrupt shared database");
                    remove_key(self.store.as_ref(), key);
                }
            }
        }

        let db = generate()?;
        info!(
            applications = db.applications.len(),
            users = db.users.len(),
            "generated shared database from seed"
        );
        self.save(&db);
        Ok(db)
    }

    /// Persist `db` and mirror it to peers; failures are logged only
    pub fn save(&self, db: &Db) {
        let db = hydrate(db.clone());
        match write_json(self.store.as_ref(), SHARED_DB_KEY, &db) {
            Ok(payload) => {
                debug!(bytes = payload.len(), "saved shared database");
                self.sync.broadcast(SHARED_DB_KEY, Some(&payload));
            }
            Err(e) => warn!(error = %e, "failed to save shared database"),
        }
    }

    /// Wipe the database and portal state; the next load regenerates
    pub fn reset(&self) {
        for key in [SHARED_DB_KEY, LEGACY_DB_KEY, PORTAL_STATE_KEY] {
            remove_key(self.store.as_ref(), key);
        }
        self.sync.broadcast(SHARED_DB_KEY, None);
        self.sync.broadcast(PORTAL_STATE_KEY, None);
        info!("shared database reset");
    }

    /// Portal overrides; empty when absent or corrupt
    #[must_use]
    pub fn load_portal_state(&self) -> PortalState {
        self.sync.ensure_started();
        read_json(self.store.as_ref(), PORTAL_STATE_KEY).unwrap_or_default()
    }

    pub fn save_portal_state(&self, state: &PortalState) {
        match write_json(self.store.as_ref(), PORTAL_STATE_KEY, state) {
            Ok(payload) => self.sync.broadcast(PORTAL_STATE_KEY, Some(&payload)),
            Err(e) => warn!(error = %e, "failed to save portal state"),
        }
    }

    /// Replace one application's override; `None` from `updater` deletes it
    pub fn update_portal_state<F>(&self, application_id: &str, updater: F)
    where
        F: FnOnce(Option<&PortalAccountState>) -> Option<PortalAccountState>,
    {
        let mut state = self.load_portal_state();
        match updater(state.get(application_id)) {
            Some(next) => {
                state.insert(application_id.to_string(), next);
            }
            None => {
                state.remove(application_id);
            }
        }
        self.save_portal_state(&state);
    }

    /// Append to the audit trail
    ///
    /// # Errors
    /// See [`Self::load`].
    pub fn append_audit(&self, entry: AuditEntry) -> Result<(), DbError> {
        let mut db = self.load()?;
        db.audit.push(entry);
        self.save(&db);
        Ok(())
    }

    /// Record a citizen's survey answers and queue them for review
    ///
    /// # Errors
    /// `DbError::ApplicationNotFound` for an unknown id.
    pub fn submit_survey(
        &self,
        application_id: &str,
        answers: SurveyAnswers,
        at: DateTime<Utc>,
    ) -> Result<SurveyState, DbError> {
        let mut db = self.load()?;
        let at = at.to_rfc3339_opts(SecondsFormat::Secs, true);
        let app = db
            .application_mut(application_id)
            .ok_or_else(|| DbError::ApplicationNotFound(application_id.to_string()))?;

        let actor = app
            .portal
            .as_ref()
            .map(|p| p.phone.clone())
            .filter(|phone| !phone.is_empty())
            .unwrap_or_else(|| "portal".to_string());

        let survey = SurveyState {
            completed: true,
            submitted_at: Some(at.clone()),
            answers: Some(answers),
            status: Some(SurveyStatus::Antrean),
        };
        app.survey = Some(survey.clone());
        app.timeline.push(TimelineItem {
            at: at.clone(),
            by: actor.clone(),
            action: SURVEY_SUBMITTED.to_string(),
            reason: None,
        });
        db.audit.push(AuditEntry {
            at,
            actor,
            entity: application_id.to_string(),
            action: SURVEY_SUBMITTED.to_string(),
            reason: None,
        });

        self.save(&db);
        info!(application_id, "survey submitted");
        Ok(survey)
    }

    /// Every account visible to the portal
    ///
    /// # Errors
    /// See [`Self::load`].
    pub fn accounts(&self) -> Result<Vec<Account>, DbError> {
        let db = self.load()?;
        Ok(derive_accounts(&db, &self.load_portal_state()))
    }

    /// Account for a phone number, in any formatting
    ///
    /// # Errors
    /// See [`Self::load`].
    pub fn find_account(&self, phone: &str) -> Result<Option<Account>, DbError> {
        Ok(find_by_phone(self.accounts()?, phone))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bansos_store::{KeyValueStore, MemoryStore};
    use std::sync::Mutex;

    /// Records broadcasts in order
    #[derive(Default)]
    struct Recorder {
        started: Mutex<usize>,
        sent: Mutex<Vec<(String, Option<String>)>>,
    }

    impl StorageSync for Recorder {
        fn ensure_started(&self) {
            *self.started.lock().unwrap() += 1;
        }

        fn broadcast(&self, key: &str, value: Option<&str>) {
            self.sent
                .lock()
                .unwrap()
                .push((key.to_string(), value.map(str::to_string)));
        }
    }

    fn shared() -> (Arc<MemoryStore>, Arc<Recorder>, SharedDb) {
        let store = Arc::new(MemoryStore::new());
        let sync = Arc::new(Recorder::default());
        let db = SharedDb::new(store.clone(), sync.clone());
        (store, sync, db)
    }

    #[test]
    fn first_load_generates_and_broadcasts() {
        let (store, sync, shared) = shared();
        let db = shared.load().unwrap();
        assert_eq!(db.applications.len(), 4);
        assert!(store.get_item(SHARED_DB_KEY).unwrap().is_some());

        let sent = sync.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, SHARED_DB_KEY);
        assert!(*sync.started.lock().unwrap() >= 1);
    }

    #[test]
    fn legacy_snapshot_is_migrated() {
        let (store, _, shared) = shared();
        let mut legacy = generate().unwrap();
        legacy.config.period = "2024-Q1".into();
        store
            .set_item(LEGACY_DB_KEY, &serde_json::to_string(&legacy).unwrap())
            .unwrap();

        let db = shared.load().unwrap();
        assert_eq!(db.config.period, "2024-Q1");
        assert!(store.get_item(LEGACY_DB_KEY).unwrap().is_none());
        assert!(store.get_item(SHARED_DB_KEY).unwrap().is_some());
    }

    #[test]
    fn corrupt_snapshot_is_regenerated() {
        let (store, _, shared) = shared();
        store.set_item(SHARED_DB_KEY, "{broken").unwrap();
        let db = shared.load().unwrap();
        assert_eq!(db.config.period, "2025-Q4");
    }

    #[test]
    fn reset_clears_keys_and_broadcasts_deletions() {
        let (store, sync, shared) = shared();
        shared.load().unwrap();
        shared.save_portal_state(&PortalState::new());
        store.set_item(LEGACY_DB_KEY, "{}").unwrap();
        sync.sent.lock().unwrap().clear();

        shared.reset();
        for key in [SHARED_DB_KEY, LEGACY_DB_KEY, PORTAL_STATE_KEY] {
            assert!(store.get_item(key).unwrap().is_none());
        }
        assert_eq!(
            *sync.sent.lock().unwrap(),
            vec![
                (SHARED_DB_KEY.to_string(), None),
                (PORTAL_STATE_KEY.to_string(), None)
            ]
        );
    }

    #[test]
    fn save_on_full_store_is_swallowed() {
        let store = Arc::new(MemoryStore::with_quota(16));
        let sync = Arc::new(Recorder::default());
        let shared = SharedDb::new(store.clone(), sync.clone());
        let db = shared.load().unwrap();
        assert_eq!(db.applications.len(), 4);
        assert!(store.get_item(SHARED_DB_KEY).unwrap().is_none());
        assert!(sync.sent.lock().unwrap().is_empty());
    }

    #[test]
    fn update_portal_state_inserts_and_deletes() {
        let (_, _, shared) = shared();
        shared.update_portal_state("APP-2025-0001", |current| {
            assert!(current.is_none());
            Some(PortalAccountState {
                phone: "08123450001".into(),
                pin: Some("000000".into()),
                ..PortalAccountState::default()
            })
        });
        assert_eq!(
            shared.load_portal_state()["APP-2025-0001"].pin.as_deref(),
            Some("000000")
        );

        shared.update_portal_state("APP-2025-0001", |_| None);
        assert!(shared.load_portal_state().is_empty());
    }

    #[test]
    fn submit_survey_queues_and_audits() {
        let (_, _, shared) = shared();
        let at = DateTime::parse_from_rfc3339("2025-10-21T10:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let survey = shared
            .submit_survey("APP-2025-0001", SurveyAnswers::default(), at)
            .unwrap();
        assert!(survey.completed);
        assert_eq!(survey.status, Some(SurveyStatus::Antrean));
        assert_eq!(survey.submitted_at.as_deref(), Some("2025-10-21T10:00:00Z"));

        let db = shared.load().unwrap();
        let app = db.application("APP-2025-0001").unwrap();
        assert_eq!(app.survey.as_ref(), Some(&survey));
        assert_eq!(app.timeline.last().unwrap().action, SURVEY_SUBMITTED);
        let audit = db.audit.last().unwrap();
        assert_eq!(audit.entity, "APP-2025-0001");
        assert_eq!(audit.actor, "08123450001");
    }

    #[test]
    fn submit_survey_unknown_application() {
        let (_, _, shared) = shared();
        let err = shared
            .submit_survey("APP-9999", SurveyAnswers::default(), Utc::now())
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn audit_is_append_only() {
        let (_, _, shared) = shared();
        for action in ["LOGIN", "EXPORT"] {
            shared
                .append_audit(AuditEntry {
                    at: "2025-10-21T10:00:00Z".into(),
                    actor: "00000000-0000-0000-0000-000000000001".into(),
                    entity: "BATCH-001".into(),
                    action: action.into(),
                    reason: None,
                })
                .unwrap();
        }
        let actions: Vec<String> = shared
            .load()
            .unwrap()
            .audit
            .into_iter()
            .map(|e| e.action)
            .collect();
        assert_eq!(actions, vec!["LOGIN", "EXPORT"]);
    }
}
