//! Testing utilities for the Bansos e-KYC workspace
//!
//! Shared fixtures, stores, and a recording bridge host.

#![allow(missing_docs)]

use bansos_bridge::{BridgeEvent, BridgeHost, BridgeMessage, BridgePage, MessageSink, StorageBridge};
use bansos_core::{ApplicantDraft, CapturedImage, MockLatency, OcrResult, PortalConfig};
use bansos_store::{FileStore, MemoryStore};
use parking_lot::Mutex;
use std::sync::Arc;
use tempfile::TempDir;

pub fn sample_ktp_image() -> CapturedImage {
    CapturedImage::new("ktp.jpg", "image/jpeg", vec![0xFF, 0xD8, 0xFF, 0xE0, 0x01])
}

pub fn sample_selfie_image() -> CapturedImage {
    CapturedImage::new("selfie.jpg", "image/jpeg", vec![0xFF, 0xD8, 0xFF, 0xE0, 0x02])
}

pub fn sample_ocr() -> OcrResult {
    OcrResult {
        number: Some("3271 0112 3456 0001".to_string()),
        name: Some("SITI AMINAH".to_string()),
        birth_date: Some("1986-03-14".to_string()),
        address: Some("Kota Bogor, Jawa Barat".to_string()),
        confidence: 0.91,
        raw_text: None,
    }
}

/// Contact fields the OCR never provides
pub fn sample_contact() -> ApplicantDraft {
    ApplicantDraft {
        phone: Some("08123450009".to_string()),
        email: Some("siti.aminah@contoh.id".to_string()),
        ..ApplicantDraft::default()
    }
}

/// Default configuration with every mock answering immediately
pub fn instant_config() -> PortalConfig {
    PortalConfig::default().with_latency(MockLatency::zero())
}

pub fn memory_store() -> Arc<MemoryStore> {
    Arc::new(MemoryStore::new())
}

/// File-backed store in a fresh temp dir; keep the dir alive for the test
pub fn file_store() -> (TempDir, Arc<FileStore>) {
    let dir = TempDir::new().unwrap();
    let store = Arc::new(FileStore::new(dir.path()));
    (dir, store)
}

/// Bridge host and message sink that records everything
#[derive(Debug, Default)]
pub struct RecordingHost {
    opened: Mutex<Vec<(String, String)>>,
    removed: Mutex<Vec<String>>,
    posted: Mutex<Vec<(String, BridgeMessage)>>,
}

impl RecordingHost {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// `(origin, src)` of every frame opened
    pub fn opened(&self) -> Vec<(String, String)> {
        self.opened.lock().clone()
    }

    pub fn removed(&self) -> Vec<String> {
        self.removed.lock().clone()
    }

    /// Drain posted messages
    pub fn take_posted(&self) -> Vec<(String, BridgeMessage)> {
        std::mem::take(&mut *self.posted.lock())
    }
}

impl MessageSink for RecordingHost {
    fn post(&self, target_origin: &str, message: &BridgeMessage) {
        self.posted
            .lock()
            .push((target_origin.to_string(), message.clone()));
    }
}

impl BridgeHost for RecordingHost {
    fn open_frame(&self, origin: &str, src: &str) {
        self.opened.lock().push((origin.to_string(), src.to_string()));
    }

    fn remove_frame(&self, origin: &str) {
        self.removed.lock().push(origin.to_string());
    }
}

/// Shuttle messages between a bridge and one peer page until both are quiet
///
/// `bridge_host` must be the host of `bridge` and `page_sink` the sink of
/// `page`. Returns the number of messages delivered.
pub fn pump(
    bridge: &StorageBridge,
    bridge_host: &RecordingHost,
    page: &BridgePage,
    page_origin: &str,
    page_sink: &RecordingHost,
) -> usize {
    let local_origin = bridge.location().origin();
    let mut delivered = 0;
    loop {
        let to_page = bridge_host.take_posted();
        let to_bridge = page_sink.take_posted();
        if to_page.is_empty() && to_bridge.is_empty() {
            return delivered;
        }
        for (target, message) in to_page {
            if target == page_origin {
                page.handle_message(&local_origin, &message.to_value());
                delivered += 1;
            }
        }
        for (_, message) in to_bridge {
            bridge.handle_event(BridgeEvent::Message {
                origin: page_origin.to_string(),
                data: message.to_value(),
            });
            delivered += 1;
        }
    }
}
