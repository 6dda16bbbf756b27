//! Well-known storage keys

/// Onboarding progress `{ step, ocr? }`
pub const PROGRESS_KEY: &str = "ekyc.progress";

/// Shared mock database
pub const SHARED_DB_KEY: &str = "ekyc.shared.db.v1";

/// Pre-sharing backoffice database, read once for migration
pub const LEGACY_DB_KEY: &str = "backoffice.db.v1";

/// Portal account overrides
pub const PORTAL_STATE_KEY: &str = "ekyc.shared.portal.v1";

/// Signed-in citizen
pub const PORTAL_SESSION_KEY: &str = "ekyc.portal.session";

/// Signed-in backoffice user
pub const BACKOFFICE_SESSION_KEY: &str = "backoffice.session";

/// Keys mirrored across origins by the storage bridge
pub const TRACKED_KEYS: [&str; 2] = [SHARED_DB_KEY, PORTAL_STATE_KEY];
