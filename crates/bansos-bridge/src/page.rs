//! Bridge page
//!
//! Peer side of the bridge, served at the bridge page path on every origin.
//! It trusts exactly one origin, the one named in its `origin` query
//! parameter, and:
//! - announces `ready` to that parent once loaded
//! - applies `push` messages to its own storage
//! - answers `pull` with a `pull-response` carrying its current value

use crate::error::BridgeError;
use crate::host::MessageSink;
use crate::message::BridgeMessage;
use crate::peers::Location;
use bansos_store::SharedStore;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

pub struct BridgePage {
    parent_origin: String,
    store: SharedStore,
    parent: Arc<dyn MessageSink>,
}

impl std::fmt::Debug for BridgePage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BridgePage")
            .field("parent_origin", &self.parent_origin)
            .finish_non_exhaustive()
    }
}

impl BridgePage {
    #[must_use]
    pub fn new(
        parent_origin: impl Into<String>,
        store: SharedStore,
        parent: Arc<dyn MessageSink>,
    ) -> Self {
        Self {
            parent_origin: parent_origin.into(),
            store,
            parent,
        }
    }

    /// Build from the URL the frame was loaded with
    ///
    /// # Errors
    /// `InvalidOrigin` if `url` is not an absolute URL, `MissingParentOrigin`
    /// if its query has no non-empty `origin` parameter.
    pub fn from_url(
        url: &str,
        store: SharedStore,
        parent: Arc<dyn MessageSink>,
    ) -> Result<Self, BridgeError> {
        let origin = Location::parse(url)?
            .query_param("origin")
            .filter(|origin| !origin.is_empty())
            .ok_or_else(|| BridgeError::MissingParentOrigin(url.to_string()))?;
        Ok(Self::new(origin, store, parent))
    }

    #[inline]
    #[must_use]
    pub fn parent_origin(&self) -> &str {
        &self.parent_origin
    }

    /// Tell the parent this page can take traffic
    pub fn announce(&self) {
        self.parent.post(&self.parent_origin, &BridgeMessage::Ready);
    }

    /// Handle a message posted to this page
    pub fn handle_message(&self, origin: &str, data: &Value) {
        if origin != self.parent_origin {
            debug!(origin, "ignoring message from non-parent origin");
            return;
        }
        match BridgeMessage::parse(data) {
            Some(BridgeMessage::Push { key, value }) => {
                let written = match &value {
                    Some(v) => self.store.set_item(&key, v),
                    None => self.store.remove_item(&key),
                };
                if let Err(e) = written {
                    warn!(key = %key, error = %e, "could not apply pushed value");
                }
            }
            Some(BridgeMessage::Pull { key }) => {
                let value = self.store.get_item(&key).ok().flatten();
                self.parent
                    .post(&self.parent_origin, &BridgeMessage::PullResponse { key, value });
            }
            _ => {}
        }
    }
}
