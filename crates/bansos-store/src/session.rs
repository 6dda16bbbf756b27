//! Signed-in actor sessions
//!
//! Stored sessions come back as loosely-typed JSON; [`parse_portal_session`]
//! is the single place that turns them into a validated record.

use crate::document::{read_json, remove_key, write_json};
use crate::error::{SessionError, StoreError};
use crate::keys::{BACKOFFICE_SESSION_KEY, PORTAL_SESSION_KEY};
use crate::kv::SharedStore;
use bansos_core::schema::Role;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info};

/// Citizen portal session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortalSession {
    pub token: String,
    pub phone: String,
    /// Unix epoch, milliseconds
    pub expires_at: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region_scope: Option<Vec<String>>,
}

/// Validate a stored portal session against `now_ms`
///
/// `token` and `phone` must be strings, `expiresAt` a number (or numeric
/// string) in the future. Optional fields of the wrong type are dropped
/// rather than failing the whole record.
///
/// # Errors
/// The first rule the record breaks.
pub fn parse_portal_session(raw: &str, now_ms: i64) -> Result<PortalSession, SessionError> {
    let value: Value =
        serde_json::from_str(raw).map_err(|e| SessionError::Malformed(e.to_string()))?;
    let obj = value.as_object().ok_or(SessionError::NotAnObject)?;

    let string = |field: &'static str| -> Result<String, SessionError> {
        obj.get(field)
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or(SessionError::InvalidField(field))
    };

    let token = string("token")?;
    let phone = string("phone")?;
    if token.is_empty() {
        return Err(SessionError::InvalidField("token"));
    }
    if phone.is_empty() {
        return Err(SessionError::InvalidField("phone"));
    }

    let expires_at = match obj.get("expiresAt") {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|n| n.is_finite())
    .ok_or(SessionError::InvalidField("expiresAt"))? as i64;

    if now_ms > expires_at {
        return Err(SessionError::Expired(expires_at));
    }

    Ok(PortalSession {
        token,
        phone,
        expires_at,
        user_id: obj.get("userId").and_then(Value::as_str).map(str::to_string),
        role: obj.get("role").and_then(Value::as_str).map(str::to_string),
        region_scope: obj.get("regionScope").and_then(Value::as_array).map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        }),
    })
}

/// Portal session persistence
#[derive(Debug, Clone)]
pub struct PortalSessionStore {
    store: SharedStore,
    ttl: Duration,
}

impl PortalSessionStore {
    #[inline]
    #[must_use]
    pub fn new(store: SharedStore, ttl: Duration) -> Self {
        Self { store, ttl }
    }

    /// Issue and save a fresh session for `phone`
    ///
    /// # Errors
    /// Store write failures.
    pub fn create(&self, phone: &str) -> Result<PortalSession, StoreError> {
        self.create_at(phone, chrono::Utc::now().timestamp_millis())
    }

    /// [`Self::create`] with an explicit clock
    ///
    /// # Errors
    /// Store write failures.
    pub fn create_at(&self, phone: &str, now_ms: i64) -> Result<PortalSession, StoreError> {
        let ttl_ms = i64::try_from(self.ttl.as_millis()).unwrap_or(i64::MAX);
        let session = PortalSession {
            token: uuid::Uuid::new_v4().to_string(),
            phone: phone.to_string(),
            expires_at: now_ms.saturating_add(ttl_ms),
            user_id: None,
            role: None,
            region_scope: None,
        };
        self.save(&session)?;
        info!(phone = %session.phone, expires_at = session.expires_at, "portal session created");
        Ok(session)
    }

    /// # Errors
    /// Store write failures.
    pub fn save(&self, session: &PortalSession) -> Result<(), StoreError> {
        write_json(self.store.as_ref(), PORTAL_SESSION_KEY, session).map(|_| ())
    }

    /// Current session; invalid or expired sessions are deleted
    #[must_use]
    pub fn load(&self) -> Option<PortalSession> {
        self.load_at(chrono::Utc::now().timestamp_millis())
    }

    /// [`Self::load`] with an explicit clock
    #[must_use]
    pub fn load_at(&self, now_ms: i64) -> Option<PortalSession> {
        let raw = self.store.get_item(PORTAL_SESSION_KEY).ok().flatten()?;
        match parse_portal_session(&raw, now_ms) {
            Ok(session) => Some(session),
            Err(e) => {
                debug!(error = %e, "dropping stored portal session");
                self.clear();
                None
            }
        }
    }

    pub fn clear(&self) {
        remove_key(self.store.as_ref(), PORTAL_SESSION_KEY);
    }
}

/// Backoffice session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackofficeSession {
    pub user_id: String,
    pub role: Role,
    pub region_scope: Vec<String>,
}

/// Backoffice session persistence
#[derive(Debug, Clone)]
pub struct BackofficeSessionStore {
    store: SharedStore,
}

impl BackofficeSessionStore {
    #[inline]
    #[must_use]
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    #[must_use]
    pub fn get(&self) -> Option<BackofficeSession> {
        read_json(self.store.as_ref(), BACKOFFICE_SESSION_KEY)
    }

    /// Save, or sign out with `None`
    ///
    /// # Errors
    /// Store write failures.
    pub fn set(&self, session: Option<&BackofficeSession>) -> Result<(), StoreError> {
        match session {
            Some(session) => {
                write_json(self.store.as_ref(), BACKOFFICE_SESSION_KEY, session).map(|_| ())
            }
            None => {
                remove_key(self.store.as_ref(), BACKOFFICE_SESSION_KEY);
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kv::{KeyValueStore, MemoryStore};
    use std::sync::Arc;

    const NOW: i64 = 1_760_000_000_000;

    #[test]
    fn parse_accepts_numeric_string_expiry() {
        let s = parse_portal_session(
            r#"{"token":"t","phone":"0812","expiresAt":"1760000001000","regionScope":["a",1]}"#,
            NOW,
        )
        .unwrap();
        assert_eq!(s.expires_at, 1_760_000_001_000);
        assert_eq!(s.region_scope, Some(vec!["a".to_string()]));
    }

    #[test]
    fn parse_rejects_bad_records() {
        assert_eq!(
            parse_portal_session("[]", NOW),
            Err(SessionError::NotAnObject)
        );
        assert_eq!(
            parse_portal_session(r#"{"token":1,"phone":"x","expiresAt":1}"#, NOW),
            Err(SessionError::InvalidField("token"))
        );
        assert_eq!(
            parse_portal_session(r#"{"token":"t","phone":"x"}"#, NOW),
            Err(SessionError::InvalidField("expiresAt"))
        );
        assert_eq!(
            parse_portal_session(r#"{"token":"t","phone":"x","expiresAt":5}"#, NOW),
            Err(SessionError::Expired(5))
        );
    }

    #[test]
    fn created_session_loads_until_expiry() {
        let store = Arc::new(MemoryStore::new());
        let sessions = PortalSessionStore::new(store.clone(), Duration::from_secs(3600));
        let created = sessions.create_at("08123450001", NOW).unwrap();
        assert_eq!(created.expires_at, NOW + 3_600_000);

        assert_eq!(sessions.load_at(NOW + 1000), Some(created.clone()));
        assert_eq!(sessions.load_at(created.expires_at + 1), None);
        assert!(store.get_item(PORTAL_SESSION_KEY).unwrap().is_none());
    }

    #[test]
    fn backoffice_session_sign_out() {
        let store: SharedStore = Arc::new(MemoryStore::new());
        let sessions = BackofficeSessionStore::new(store);
        let session = BackofficeSession {
            user_id: "ADM-1".into(),
            role: Role::Admin,
            region_scope: vec!["Batam".into()],
        };
        sessions.set(Some(&session)).unwrap();
        assert_eq!(sessions.get(), Some(session));
        sessions.set(None).unwrap();
        assert_eq!(sessions.get(), None);
    }
}
