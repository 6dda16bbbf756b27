//! Bansos MockDb - the document shared by the portal and the backoffice
//!
//! - Deterministic generation from the embedded seed
//! - Hydration of older snapshots (missing arrays, stale batch items)
//! - [`SharedDb`]: load/save/reset with legacy-key migration and peer
//!   broadcast, portal-state overrides, survey submission, audit trail
//! - The portal account directory
//!
//! # Example
//!
//! ```rust
//! use bansos_mockdb::generate;
//!
//! let db = generate().unwrap();
//! let run = &db.clustering_runs[0];
//! assert_eq!(run.summary.total, db.applications.len());
//! ```

#![allow(missing_docs)]

pub mod accounts;
pub mod error;
pub mod generate;
pub mod seed;
pub mod shared;

pub use accounts::{derive_accounts, find_by_phone};
pub use error::DbError;
pub use generate::{
    create_initial_clustering_run, default_portal_info, generate, generate_from, hydrate,
    parse_db, to_application, to_candidate,
};
pub use seed::{BeneficiarySeed, Seed};
pub use shared::SharedDb;
