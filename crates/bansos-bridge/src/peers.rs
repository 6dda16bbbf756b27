//! Peer origin detection
//!
//! The portal and backoffice run on neighbouring dev ports, so peers are
//! guessed: every default port on the current host, `localhost` and
//! `127.0.0.1`, plus explicitly configured origins. The current origin is
//! never a peer.

use crate::error::BridgeError;
use indexmap::IndexSet;
use std::fmt;
use url::Url;

/// Where the local page is served from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    url: Url,
}

impl Location {
    /// Parse an absolute `http(s)` URL
    ///
    /// # Errors
    /// `BridgeError::InvalidOrigin` when the URL does not parse or has no
    /// host, so no tuple origin.
    pub fn parse(raw: &str) -> Result<Self, BridgeError> {
        let invalid = || BridgeError::InvalidOrigin(raw.to_string());
        let url = Url::parse(raw).map_err(|_| invalid())?;
        if url.host_str().map_or(true, str::is_empty) || !url.origin().is_tuple() {
            return Err(invalid());
        }
        Ok(Self { url })
    }

    /// Scheme with trailing colon, `http:` or `https:`
    #[must_use]
    pub fn protocol(&self) -> String {
        format!("{}:", self.url.scheme())
    }

    #[must_use]
    pub fn hostname(&self) -> &str {
        self.url.host_str().unwrap_or_default()
    }

    /// `scheme://host[:port]`, the port omitted when it is the scheme default
    #[must_use]
    pub fn origin(&self) -> String {
        self.url.origin().ascii_serialization()
    }

    /// Full URL of the page
    #[inline]
    #[must_use]
    pub fn href(&self) -> &str {
        self.url.as_str()
    }

    /// Explicit port, else the scheme default
    #[must_use]
    pub fn effective_port(&self) -> u16 {
        self.url.port_or_known_default().unwrap_or(80)
    }

    /// First value of query parameter `name`, percent-decoded
    #[must_use]
    pub fn query_param(&self, name: &str) -> Option<String> {
        self.url
            .query_pairs()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.into_owned())
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.href())
    }
}

/// Candidate peer origins for `location`, in probe order
#[must_use]
pub fn detect_peer_origins(
    location: &Location,
    default_ports: &[String],
    configured: &[String],
) -> Vec<String> {
    let current = location.origin();
    let protocol = location.protocol();
    let host = location.hostname();
    let current_port = location.effective_port().to_string();

    let base_hosts: IndexSet<&str> = [host, "localhost", "127.0.0.1"].into_iter().collect();

    let mut origins = IndexSet::new();
    for base in &base_hosts {
        for port in default_ports {
            if *port != current_port || *base != host {
                origins.insert(format!("{protocol}//{base}:{port}"));
            }
        }
    }
    for peer in configured {
        if !peer.is_empty() && *peer != current {
            origins.insert(peer.clone());
        }
    }

    origins.shift_remove(&current);
    origins.into_iter().collect()
}
