//! Bridge wire format
//!
//! Every message is a plain JSON object tagged by `type`:
//! - `storage-bridge:push` `{key, value}` local -> peer
//! - `storage-bridge:pull` `{key}` local -> peer
//! - `storage-bridge:ready` peer -> local
//! - `storage-bridge:pull-response` `{key, value}` peer -> local
//!
//! `value` is `null` when the key is absent or was deleted.

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const PUSH: &str = "storage-bridge:push";
pub const PULL: &str = "storage-bridge:pull";
pub const READY: &str = "storage-bridge:ready";
pub const PULL_RESPONSE: &str = "storage-bridge:pull-response";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum BridgeMessage {
    #[serde(rename = "storage-bridge:push")]
    Push { key: String, value: Option<String> },
    #[serde(rename = "storage-bridge:pull")]
    Pull { key: String },
    #[serde(rename = "storage-bridge:ready")]
    Ready,
    #[serde(rename = "storage-bridge:pull-response")]
    PullResponse {
        key: String,
        #[serde(default)]
        value: Option<String>,
    },
}

impl BridgeMessage {
    #[inline]
    #[must_use]
    pub fn push(key: impl Into<String>, value: Option<String>) -> Self {
        Self::Push {
            key: key.into(),
            value,
        }
    }

    #[inline]
    #[must_use]
    pub fn pull(key: impl Into<String>) -> Self {
        Self::Pull { key: key.into() }
    }

    /// Wire name of this message
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Push { .. } => PUSH,
            Self::Pull { .. } => PULL,
            Self::Ready => READY,
            Self::PullResponse { .. } => PULL_RESPONSE,
        }
    }

    /// Read an inbound message leniently
    ///
    /// Returns `None` for anything that is not an object with a known `type`
    /// and a string `key` where one is required. A `value` that is not a
    /// string reads as `None`, so a malformed pull-response deletes the key
    /// rather than being dropped.
    #[must_use]
    pub fn parse(data: &Value) -> Option<Self> {
        let obj = data.as_object()?;
        let key = || obj.get("key").and_then(Value::as_str).map(str::to_owned);
        let value = || obj.get("value").and_then(Value::as_str).map(str::to_owned);

        match obj.get("type").and_then(Value::as_str)? {
            PUSH => Some(Self::Push {
                key: key()?,
                value: value(),
            }),
            PULL => Some(Self::Pull { key: key()? }),
            READY => Some(Self::Ready),
            PULL_RESPONSE => Some(Self::PullResponse {
                key: key()?,
                value: value(),
            }),
            _ => None,
        }
    }

    /// JSON form as posted to a frame
    #[must_use]
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}
