//! Storage Bridge
//!
//! Mirrors the tracked keys to every peer origin through hidden frames.
//! Lifecycle per peer:
//! - frame opened on first storage access, `ready = false`
//! - frame `load`: current values of the tracked keys go to the front of the
//!   queue
//! - peer `ready`: queue flushed in order, then a fresh push and a pull for
//!   every tracked key
//! - frame `error`: peer dropped for the rest of the session
//!
//! Posts to a peer leave in the order they were queued or broadcast, also
//! when several threads drive the same bridge.
//!
//! Inbound messages are only accepted from registered peers. Values that
//! arrive in a pull-response overwrite local storage (last writer wins) and
//! are announced as [`StorageEvent`]s.

use crate::host::BridgeHost;
use crate::message::BridgeMessage;
use crate::peers::{detect_peer_origins, Location};
use bansos_core::PortalConfig;
use bansos_store::keys::TRACKED_KEYS;
use bansos_store::{SharedStore, StorageSync};
use indexmap::IndexMap;
use parking_lot::{Mutex, ReentrantMutex};
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

const EVENT_CAPACITY: usize = 64;

/// A key changed because a peer sent a new value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageEvent {
    pub key: String,
    pub new_value: Option<String>,
    /// Always `None`; the previous value is not tracked
    pub old_value: Option<String>,
    /// Page that applied the change
    pub url: String,
}

/// What the embedder observed on a frame or window
#[derive(Debug, Clone, PartialEq)]
pub enum BridgeEvent {
    FrameLoaded { origin: String },
    FrameError { origin: String },
    Message { origin: String, data: Value },
}

/// Snapshot of one peer for diagnostics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerStatus {
    pub origin: String,
    pub ready: bool,
    pub queued: usize,
}

#[derive(Debug, Default)]
struct PeerFrame {
    ready: bool,
    queue: VecDeque<BridgeMessage>,
}

#[derive(Debug, Default)]
struct Peers {
    initialised: bool,
    frames: IndexMap<String, PeerFrame>,
}

type Outbox = Vec<(String, BridgeMessage)>;

impl Peers {
    /// Queue until ready, otherwise hand to `out`
    fn post(&mut self, origin: &str, message: BridgeMessage, out: &mut Outbox) {
        let Some(frame) = self.frames.get_mut(origin) else {
            return;
        };
        if frame.ready {
            out.push((origin.to_string(), message));
        } else {
            frame.queue.push_back(message);
        }
    }
}

/// Bridge configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeConfig {
    pub default_ports: Vec<String>,
    pub bridge_page: String,
    pub peers: Vec<String>,
}

impl From<&PortalConfig> for BridgeConfig {
    fn from(config: &PortalConfig) -> Self {
        Self {
            default_ports: config.bridge_default_ports.clone(),
            bridge_page: config.bridge_page.clone(),
            peers: config.peers.clone(),
        }
    }
}

/// Cross-origin mirror of the tracked storage keys
///
/// Build one per page at bootstrap and share it as the `StorageSync` of the
/// services that write tracked keys.
pub struct StorageBridge {
    location: Location,
    config: BridgeConfig,
    store: SharedStore,
    host: Arc<dyn BridgeHost>,
    peers: Mutex<Peers>,
    /// Held from deciding what to post until it has been posted
    delivery: ReentrantMutex<()>,
    events: broadcast::Sender<StorageEvent>,
}

impl std::fmt::Debug for StorageBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageBridge")
            .field("location", &self.location)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl StorageBridge {
    #[must_use]
    pub fn new(
        location: Location,
        config: BridgeConfig,
        store: SharedStore,
        host: Arc<dyn BridgeHost>,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            location,
            config,
            store,
            host,
            peers: Mutex::new(Peers::default()),
            delivery: ReentrantMutex::new(()),
            events,
        }
    }

    #[inline]
    #[must_use]
    pub fn location(&self) -> &Location {
        &self.location
    }

    /// Storage events caused by peers
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<StorageEvent> {
        self.events.subscribe()
    }

    /// URL loaded into the frame for `peer`
    #[must_use]
    pub fn frame_src(&self, peer: &str) -> String {
        format!(
            "{peer}{}?origin={}",
            self.config.bridge_page,
            urlencoding::encode(&self.location.origin())
        )
    }

    /// Open a frame per detected peer; only the first call does anything
    pub fn ensure_initialised(&self) {
        let mut peers = self.peers.lock();
        if peers.initialised {
            return;
        }
        peers.initialised = true;

        let origins = detect_peer_origins(
            &self.location,
            &self.config.default_ports,
            &self.config.peers,
        );
        for origin in origins {
            if peers.frames.contains_key(&origin) {
                continue;
            }
            self.host.open_frame(&origin, &self.frame_src(&origin));
            peers.frames.insert(origin, PeerFrame::default());
        }
        info!(
            origin = %self.location.origin(),
            peers = peers.frames.len(),
            "storage bridge initialised"
        );
    }

    /// Registered peers in registration order
    #[must_use]
    pub fn peers(&self) -> Vec<PeerStatus> {
        self.peers
            .lock()
            .frames
            .iter()
            .map(|(origin, frame)| PeerStatus {
                origin: origin.clone(),
                ready: frame.ready,
                queued: frame.queue.len(),
            })
            .collect()
    }

    /// Send a push of `key` to every peer
    pub fn broadcast(&self, key: &str, value: Option<&str>) {
        let _delivery = self.delivery.lock();
        let mut out = Outbox::new();
        {
            let mut peers = self.peers.lock();
            if peers.frames.is_empty() {
                return;
            }
            let origins: Vec<String> = peers.frames.keys().cloned().collect();
            for origin in origins {
                let message = BridgeMessage::push(key, value.map(str::to_owned));
                peers.post(&origin, message, &mut out);
            }
        }
        self.deliver(out);
    }

    /// Feed a frame or window event observed by the host
    pub fn handle_event(&self, event: BridgeEvent) {
        match event {
            BridgeEvent::FrameLoaded { origin } => self.on_frame_loaded(&origin),
            BridgeEvent::FrameError { origin } => self.on_frame_error(&origin),
            BridgeEvent::Message { origin, data } => self.on_message(&origin, &data),
        }
    }

    fn on_frame_loaded(&self, origin: &str) {
        let current = self.current_values();
        let mut peers = self.peers.lock();
        let Some(frame) = peers.frames.get_mut(origin) else {
            return;
        };
        if frame.ready {
            return;
        }
        for (key, value) in current.into_iter().rev() {
            frame.queue.push_front(BridgeMessage::push(key, value));
        }
        debug!(origin, queued = frame.queue.len(), "bridge frame loaded");
    }

    fn on_frame_error(&self, origin: &str) {
        if self.peers.lock().frames.shift_remove(origin).is_some() {
            self.host.remove_frame(origin);
            warn!(origin, "bridge frame failed, peer dropped");
        }
    }

    fn on_message(&self, origin: &str, data: &Value) {
        if !data.is_object() || !self.peers.lock().frames.contains_key(origin) {
            return;
        }
        match BridgeMessage::parse(data) {
            Some(BridgeMessage::Ready) => self.on_ready(origin),
            Some(BridgeMessage::PullResponse { key, value }) => {
                self.on_pull_response(origin, key, value);
            }
            _ => {}
        }
    }

    fn on_ready(&self, origin: &str) {
        let _delivery = self.delivery.lock();
        let mut out = Outbox::new();
        {
            let mut peers = self.peers.lock();
            let Some(frame) = peers.frames.get_mut(origin) else {
                return;
            };
            frame.ready = true;
            out.extend(frame.queue.drain(..).map(|m| (origin.to_string(), m)));
        }
        if self.store.get_item(TRACKED_KEYS[0]).is_ok() {
            let mut peers = self.peers.lock();
            for (key, value) in self.current_values() {
                peers.post(origin, BridgeMessage::push(key, value), &mut out);
            }
            for key in TRACKED_KEYS {
                peers.post(origin, BridgeMessage::pull(key), &mut out);
            }
        }
        info!(origin, flushed = out.len(), "bridge peer ready");
        self.deliver(out);
    }

    fn on_pull_response(&self, origin: &str, key: String, value: Option<String>) {
        let written = match &value {
            Some(v) => self.store.set_item(&key, v),
            None => self.store.remove_item(&key),
        };
        if let Err(e) = written {
            warn!(origin, key = %key, error = %e, "could not apply pulled value");
            return;
        }
        debug!(origin, key = %key, present = value.is_some(), "pulled value applied");
        // No subscribers is fine
        let _ = self.events.send(StorageEvent {
            key,
            new_value: value,
            old_value: None,
            url: self.location.href().to_string(),
        });
    }

    fn current_values(&self) -> Vec<(&'static str, Option<String>)> {
        TRACKED_KEYS
            .iter()
            .map(|key| (*key, self.store.get_item(key).ok().flatten()))
            .collect()
    }

    fn deliver(&self, out: Outbox) {
        for (origin, message) in out {
            debug!(origin = %origin, kind = message.kind(), "bridge post");
            self.host.post(&origin, &message);
        }
    }
}

impl StorageSync for StorageBridge {
    fn ensure_started(&self) {
        self.ensure_initialised();
    }

    fn broadcast(&self, key: &str, value: Option<&str>) {
        StorageBridge::broadcast(self, key, value);
    }
}
