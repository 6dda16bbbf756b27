//! Progress Store for the onboarding wizard
//!
//! Persists the resumable subset of wizard state `{ step, ocr? }` under a
//! single key. Captured images are never part of it.

use crate::document::{read_json, remove_key, write_json};
use crate::keys::PROGRESS_KEY;
use crate::kv::SharedStore;
use async_trait::async_trait;
use bansos_core::{OcrResult, StepKey};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

/// Persisted wizard progress
///
/// `step` is kept as the raw stored string: whether it names a known step is
/// decided when the progress is applied, not when it is read. A step that is
/// not a string does not make the record unreadable: falsy values read as
/// empty, anything else as its JSON text, which names no known step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KycProgress {
    #[serde(default, deserialize_with = "lenient_step")]
    pub step: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ocr: Option<OcrResult>,
}

impl KycProgress {
    #[must_use]
    pub fn new(step: StepKey, ocr: Option<OcrResult>) -> Self {
        Self {
            step: step.as_str().to_string(),
            ocr,
        }
    }

    /// The stored step, if it belongs to the fixed sequence
    #[must_use]
    pub fn step_key(&self) -> Option<StepKey> {
        self.step.parse().ok()
    }
}

fn lenient_step<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(step) => step,
        Value::Null | Value::Bool(false) => String::new(),
        Value::Number(n) if n.as_f64() == Some(0.0) => String::new(),
        other => other.to_string(),
    })
}

/// Persistence port for onboarding progress
#[async_trait]
pub trait KycRepository: Send + Sync {
    /// Saved progress, `None` when there is none (or it is unreadable)
    async fn load_progress(&self) -> Option<KycProgress>;

    /// Overwrite saved progress
    async fn save_progress(&self, progress: &KycProgress);

    /// Forget saved progress
    async fn clear_progress(&self);
}

/// [`KycRepository`] over a key-value store
#[derive(Debug, Clone)]
pub struct LocalKycRepository {
    store: SharedStore,
}

impl LocalKycRepository {
    #[inline]
    #[must_use]
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }
}

#[async_trait]
impl KycRepository for LocalKycRepository {
    async fn load_progress(&self) -> Option<KycProgress> {
        let progress: KycProgress = read_json(self.store.as_ref(), PROGRESS_KEY)?;
        if progress.step.is_empty() {
            return None;
        }
        debug!(step = %progress.step, "loaded onboarding progress");
        Some(progress)
    }

    async fn save_progress(&self, progress: &KycProgress) {
        if let Err(e) = write_json(self.store.as_ref(), PROGRESS_KEY, progress) {
            warn!(error = %e, "failed to persist onboarding progress");
        }
    }

    async fn clear_progress(&self) {
        remove_key(self.store.as_ref(), PROGRESS_KEY);
    }
}
