//! Shared database over the file-backed store

use bansos_mockdb::SharedDb;
use bansos_store::keys::{PORTAL_STATE_KEY, SHARED_DB_KEY};
use bansos_store::{FileStore, KeyValueStore, NoSync};
use bansos_core::account::PortalAccountState;
use std::sync::Arc;
use tempfile::TempDir;

fn open(dir: &TempDir) -> (Arc<FileStore>, SharedDb) {
    let store = Arc::new(FileStore::new(dir.path()));
    let db = SharedDb::new(store.clone(), Arc::new(NoSync));
    (store, db)
}

#[test]
fn database_survives_reopen() {
    let dir = TempDir::new().unwrap();
    {
        let (_, shared) = open(&dir);
        let mut db = shared.load().unwrap();
        db.config.period = "2026-Q1".into();
        shared.save(&db);
    }

    let (store, shared) = open(&dir);
    assert!(store.get_item(SHARED_DB_KEY).unwrap().is_some());
    assert_eq!(shared.load().unwrap().config.period, "2026-Q1");
}

#[test]
fn portal_override_changes_derived_account() {
    let dir = TempDir::new().unwrap();
    let (store, shared) = open(&dir);

    shared.update_portal_state("APP-2025-0002", |current| {
        let mut next = current.cloned().unwrap_or(PortalAccountState {
            phone: "08123450002".into(),
            ..PortalAccountState::default()
        });
        next.email = Some("rahmat@contoh.id".into());
        Some(next)
    });
    assert!(store.get_item(PORTAL_STATE_KEY).unwrap().is_some());

    let account = shared.find_account("0812 3450 002").unwrap().unwrap();
    assert_eq!(account.applicant.email, "rahmat@contoh.id");
    assert_eq!(account.submission_id, "APP-2025-0002");
}

#[test]
fn reset_regenerates_on_next_load() {
    let dir = TempDir::new().unwrap();
    let (store, shared) = open(&dir);
    let mut db = shared.load().unwrap();
    db.applications.clear();
    shared.save(&db);

    shared.reset();
    assert!(store.get_item(SHARED_DB_KEY).unwrap().is_none());
    assert_eq!(shared.load().unwrap().applications.len(), 4);
}
