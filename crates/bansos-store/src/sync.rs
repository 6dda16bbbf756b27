//! Seam between persisting services and cross-origin mirroring

/// Receives every write to a tracked key so it can be mirrored elsewhere
pub trait StorageSync: Send + Sync {
    /// Start mirroring if not already started; idempotent
    fn ensure_started(&self);

    /// A tracked key now holds `value` (`None` = deleted)
    fn broadcast(&self, key: &str, value: Option<&str>);
}

/// No mirroring
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSync;

impl StorageSync for NoSync {
    fn ensure_started(&self) {}

    fn broadcast(&self, _key: &str, _value: Option<&str>) {}
}
