//! Bansos Store - browser-style key-value persistence
//!
//! Everything the portal persists lives in a flat string key-value store with
//! `localStorage` semantics:
//! - [`KeyValueStore`] with in-memory and file-backed implementations
//! - JSON document helpers that self-heal corrupt entries
//! - The onboarding Progress Store ([`LocalKycRepository`])
//! - Portal and backoffice session storage
//! - The [`StorageSync`] seam used to mirror writes to peer origins

#![allow(missing_docs)]

pub mod document;
pub mod error;
pub mod keys;
pub mod kv;
pub mod progress;
pub mod session;
pub mod sync;

pub use document::{read_json, remove_key, write_json};
pub use error::{SessionError, StoreError};
pub use kv::{FileStore, KeyValueStore, MemoryStore, SharedStore};
pub use progress::{KycProgress, KycRepository, LocalKycRepository};
pub use session::{BackofficeSession, BackofficeSessionStore, PortalSession, PortalSessionStore};
pub use sync::{NoSync, StorageSync};
