//! Embedding seams
//!
//! The bridge never touches frames or windows itself. The embedder opens the
//! hidden frames, delivers `postMessage` traffic, and feeds frame lifecycle
//! and inbound messages back through [`StorageBridge::handle_event`].
//!
//! Implementations must not call back into the bridge from these methods.
//!
//! [`StorageBridge::handle_event`]: crate::StorageBridge::handle_event

use crate::message::BridgeMessage;
use tracing::debug;

/// Delivers a message to a window on `target_origin`
pub trait MessageSink: Send + Sync {
    fn post(&self, target_origin: &str, message: &BridgeMessage);
}

/// Owns the hidden bridge frames of the local page
pub trait BridgeHost: MessageSink {
    /// Create a hidden frame for `origin` loading `src`
    fn open_frame(&self, origin: &str, src: &str);

    /// Detach the frame for `origin`
    fn remove_frame(&self, origin: &str);
}

/// Host without frames; traffic is only logged
#[derive(Debug, Clone, Copy, Default)]
pub struct LogHost;

impl MessageSink for LogHost {
    fn post(&self, target_origin: &str, message: &BridgeMessage) {
        debug!(origin = target_origin, kind = message.kind(), "post");
    }
}

impl BridgeHost for LogHost {
    fn open_frame(&self, origin: &str, src: &str) {
        debug!(origin, src, "open frame");
    }

    fn remove_frame(&self, origin: &str) {
        debug!(origin, "remove frame");
    }
}
