//! Portal configuration
//!
//! Built from defaults, optionally overlaid by a TOML file, then by CLI
//! flags. Every field has a default so a partial file is valid.

use crate::error::DomainError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Simulated latency of each mock verification port
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MockLatency {
    pub ocr_ms: u64,
    pub face_match_ms: u64,
    pub liveness_ms: u64,
    pub submit_ms: u64,
}

impl MockLatency {
    /// All ports resolve immediately
    #[inline]
    #[must_use]
    pub fn zero() -> Self {
        Self {
            ocr_ms: 0,
            face_match_ms: 0,
            liveness_ms: 0,
            submit_ms: 0,
        }
    }

    #[inline]
    #[must_use]
    pub fn ocr(&self) -> Duration {
        Duration::from_millis(self.ocr_ms)
    }

    #[inline]
    #[must_use]
    pub fn face_match(&self) -> Duration {
        Duration::from_millis(self.face_match_ms)
    }

    #[inline]
    #[must_use]
    pub fn liveness(&self) -> Duration {
        Duration::from_millis(self.liveness_ms)
    }

    #[inline]
    #[must_use]
    pub fn submit(&self) -> Duration {
        Duration::from_millis(self.submit_ms)
    }
}

impl Default for MockLatency {
    fn default() -> Self {
        Self {
            ocr_ms: 300,
            face_match_ms: 250,
            liveness_ms: 200,
            submit_ms: 300,
        }
    }
}

/// Portal configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PortalConfig {
    /// Face-match pass threshold reported by the face port
    pub face_threshold: f64,
    /// Mock port latencies
    pub latency: MockLatency,
    /// Portal session lifetime in hours
    pub session_ttl_hours: u64,
    /// Ports probed on every base host when looking for bridge peers
    pub bridge_default_ports: Vec<String>,
    /// Path of the bridge page on each peer origin
    pub bridge_page: String,
    /// Additional peer origins
    pub peers: Vec<String>,
    /// Directory of the file-backed store
    pub data_dir: PathBuf,
}

impl PortalConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a TOML document; missing keys keep their defaults
    ///
    /// # Errors
    /// `DomainError::Config` if the document is not valid TOML for this shape.
    pub fn from_toml_str(raw: &str) -> Result<Self, DomainError> {
        toml::from_str(raw).map_err(|e| DomainError::Config(e.to_string()))
    }

    /// Read and parse a TOML file
    ///
    /// # Errors
    /// `DomainError::Config` if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, DomainError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| DomainError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&raw)
    }

    #[inline]
    #[must_use]
    pub fn with_latency(mut self, latency: MockLatency) -> Self {
        self.latency = latency;
        self
    }

    #[inline]
    #[must_use]
    pub fn with_face_threshold(mut self, threshold: f64) -> Self {
        self.face_threshold = threshold;
        self
    }

    #[inline]
    #[must_use]
    pub fn with_peers(mut self, peers: Vec<String>) -> Self {
        self.peers = peers;
        self
    }

    #[inline]
    #[must_use]
    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = dir.into();
        self
    }

    #[inline]
    #[must_use]
    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_hours * 60 * 60)
    }
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            face_threshold: 0.75,
            latency: MockLatency::default(),
            session_ttl_hours: 12,
            bridge_default_ports: vec!["3000".to_string(), "3001".to_string()],
            bridge_page: "/storage-bridge.html".to_string(),
            peers: Vec::new(),
            data_dir: PathBuf::from(".bansos"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_toml_keeps_defaults() {
        let cfg = PortalConfig::from_toml_str(
            r#"
            face_threshold = 0.8
            peers = ["http://localhost:5173"]

            [latency]
            ocr_ms = 10
            "#,
        )
        .unwrap();
        assert_eq!(cfg.face_threshold, 0.8);
        assert_eq!(cfg.peers, vec!["http://localhost:5173".to_string()]);
        assert_eq!(cfg.latency.ocr_ms, 10);
        assert_eq!(cfg.latency.submit_ms, 300);
        assert_eq!(cfg.bridge_default_ports, vec!["3000", "3001"]);
    }

    #[test]
    fn invalid_toml_is_config_error() {
        let err = PortalConfig::from_toml_str("face_threshold = \"high\"").unwrap_err();
        assert!(matches!(err, DomainError::Config(_)));
    }

    #[test]
    fn session_ttl_defaults_to_twelve_hours() {
        assert_eq!(PortalConfig::new().session_ttl(), Duration::from_secs(43_200));
    }
}
