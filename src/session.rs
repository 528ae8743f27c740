use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use base64::prelude::*;
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{debug, info};

use crate::models::SessionUser;

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Session {
    pub token: String,
    pub user: SessionUser,
}

impl Session {
    /// Decoded JWT payload. The signature is not checked; the backend does that.
    pub fn claims(&self) -> Option<serde_json::Value> {
        let payload = self.token.split('.').nth(1)?;
        let bytes = BASE64_URL_SAFE_NO_PAD
            .decode(payload.trim_end_matches('='))
            .ok()?;
        serde_json::from_slice(&bytes).ok()
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        let exp = self.claims()?.get("exp")?.as_i64()?;
        Utc.timestamp_opt(exp, 0).single()
    }

    /// Tokens without an `exp` claim never count as expired.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at().is_some_and(|exp| exp <= now)
    }
}

/// Sole owner of the admin session. Writes go to disk and to every
/// subscriber.
pub struct SessionStore {
    path: Option<PathBuf>,
    tx: watch::Sender<Option<Session>>,
}

impl SessionStore {
    pub fn in_memory() -> Self {
        Self {
            path: None,
            tx: watch::Sender::new(None),
        }
    }

    /// Open the store backed by `path`. A missing file means logged out.
    pub fn load(path: &Path) -> Result<Self> {
        let session = match std::fs::read_to_string(path) {
            Ok(content) => Some(
                serde_json::from_str::<Session>(&content)
                    .with_context(|| format!("Failed to parse session file {}", path.display()))?,
            ),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("Failed to read session file {}", path.display()))
            }
        };
        debug!(
            "Session store at {} ({})",
            path.display(),
            if session.is_some() { "logged in" } else { "empty" }
        );
        Ok(Self {
            path: Some(path.to_path_buf()),
            tx: watch::Sender::new(session),
        })
    }

    pub fn current(&self) -> Option<Session> {
        self.tx.borrow().clone()
    }

    /// Bearer token of a live session. Expired tokens are not handed out.
    pub fn token(&self) -> Option<String> {
        self.tx
            .borrow()
            .as_ref()
            .filter(|s| !s.is_expired(Utc::now()))
            .map(|s| s.token.clone())
    }

    pub fn set(&self, session: Session) -> Result<()> {
        if let Some(ref path) = self.path {
            let json = serde_json::to_string_pretty(&session)?;
            std::fs::write(path, json)
                .with_context(|| format!("Failed to write session file {}", path.display()))?;
        }
        info!("Session stored for {}", session.user.email);
        self.tx.send_replace(Some(session));
        Ok(())
    }

    pub fn clear(&self) -> Result<()> {
        if let Some(ref path) = self.path {
            match std::fs::remove_file(path) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => {
                    return Err(e).with_context(|| {
                        format!("Failed to remove session file {}", path.display())
                    })
                }
            }
        }
        if self.tx.send_replace(None).is_some() {
            info!("Session cleared");
        }
        Ok(())
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<Session>> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> SessionUser {
        SessionUser {
            id: serde_json::json!("7"),
            name: "Admin".into(),
            email: "admin@club.test".into(),
            is_admin: true,
            club_id: Some(3),
            must_change_password: None,
        }
    }

    fn token_with(payload: serde_json::Value) -> String {
        let body = BASE64_URL_SAFE_NO_PAD.encode(payload.to_string());
        format!("eyJhbGciOiJIUzI1NiJ9.{body}.sig")
    }

    #[test]
    fn claims_and_expiry() {
        let session = Session {
            token: token_with(serde_json::json!({"sub": "admin", "exp": 1_700_000_000})),
            user: user(),
        };
        assert_eq!(session.claims().unwrap()["sub"], "admin");
        let before = Utc.timestamp_opt(1_699_999_999, 0).unwrap();
        let after = Utc.timestamp_opt(1_700_000_001, 0).unwrap();
        assert!(!session.is_expired(before));
        assert!(session.is_expired(after));

        let opaque = Session {
            token: "not-a-jwt".into(),
            user: user(),
        };
        assert!(opaque.claims().is_none());
        assert!(!opaque.is_expired(after));
    }

    #[test]
    fn expired_token_is_not_handed_out() {
        let store = SessionStore::in_memory();
        store
            .set(Session {
                token: token_with(serde_json::json!({"exp": 1})),
                user: user(),
            })
            .unwrap();
        assert!(store.current().is_some());
        assert_eq!(store.token(), None);
    }

    #[test]
    fn subscribers_see_set_and_clear() {
        let store = SessionStore::in_memory();
        let mut rx = store.subscribe();
        store
            .set(Session {
                token: "abc".into(),
                user: user(),
            })
            .unwrap();
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().as_ref().map(|s| s.token.clone()), Some("abc".into()));

        store.clear().unwrap();
        assert!(rx.has_changed().unwrap());
        assert!(rx.borrow_and_update().is_none());
        assert_eq!(store.token(), None);
    }

    #[test]
    fn persists_to_disk() {
        let path = std::env::temp_dir()
            .join(format!("padel-admin-session-{}.json", std::process::id()));
        let _ = std::fs::remove_file(&path);

        let store = SessionStore::load(&path).unwrap();
        assert!(store.current().is_none());
        store
            .set(Session {
                token: "persisted".into(),
                user: user(),
            })
            .unwrap();

        let reopened = SessionStore::load(&path).unwrap();
        assert_eq!(reopened.token(), Some("persisted".into()));
        assert_eq!(reopened.current().map(|s| s.user.club_id), Some(Some(3)));

        reopened.clear().unwrap();
        assert!(!path.exists());
    }
}
