//! Bansos Bridge - cross-origin storage synchronization
//!
//! The portal and the backoffice run on different origins but share one mock
//! database. This crate keeps their tracked storage keys in step:
//! - [`StorageBridge`]: the local side, one hidden frame per peer origin,
//!   with per-peer queues until the peer is ready
//! - [`BridgePage`]: the peer side, served at the bridge page path
//! - [`BridgeMessage`]: the `postMessage` wire format
//!
//! # Example
//!
//! ```
//! use bansos_bridge::{BridgeConfig, LogHost, Location, StorageBridge};
//! use bansos_core::PortalConfig;
//! use bansos_store::MemoryStore;
//! use std::sync::Arc;
//!
//! let location = Location::parse("http://localhost:3000").unwrap();
//! let bridge = StorageBridge::new(
//!     location,
//!     BridgeConfig::from(&PortalConfig::default()),
//!     MemoryStore::new().shared(),
//!     Arc::new(LogHost),
//! );
//! bridge.ensure_initialised();
//! assert_eq!(bridge.peers().len(), 3);
//! ```

#![allow(missing_docs)]

pub mod bridge;
pub mod error;
pub mod host;
pub mod message;
pub mod page;
pub mod peers;

pub use bridge::{BridgeConfig, BridgeEvent, PeerStatus, StorageBridge, StorageEvent};
pub use error::BridgeError;
pub use host::{BridgeHost, LogHost, MessageSink};
pub use message::BridgeMessage;
pub use page::BridgePage;
pub use peers::{detect_peer_origins, Location};
