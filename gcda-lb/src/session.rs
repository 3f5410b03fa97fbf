//! Session persistence and restoration
//!
//! Holds the authenticated identity for the lifetime of a login session and
//! keeps a JSON copy under the platform state directory so a process restart
//! does not re-prompt. An expired token is treated identically to no
//! session; failed restoration silently clears the stored state.

use std::fs;
use std::path::{Path, PathBuf};

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, TimeZone, Utc};
use serde::Deserialize;
use tracing::{debug, warn};

use gcda_common::api::types::LoginResponse;
use gcda_common::models::Session;
use gcda_common::{Error, Result};

/// File name of the persisted session inside the state directory
const SESSION_FILE: &str = "session.json";

/// Owns the current session and its on-disk copy
#[derive(Debug)]
pub struct SessionStore {
    path: PathBuf,
    current: Option<Session>,
}

impl SessionStore {
    /// Open a store rooted at the given state directory
    ///
    /// Restores a previously persisted session when one exists and its
    /// token has not expired. Anything unreadable, unparseable, or expired
    /// is cleared without raising; the result is simply "no session".
    pub fn open(state_dir: &Path) -> Self {
        let path = state_dir.join(SESSION_FILE);
        let current = Self::restore(&path);
        if let Some(session) = &current {
            debug!(username = %session.username, "Restored persisted session");
        }
        Self { path, current }
    }

    fn restore(path: &Path) -> Option<Session> {
        let content = fs::read_to_string(path).ok()?;
        let session: Session = match serde_json::from_str(&content) {
            Ok(session) => session,
            Err(e) => {
                warn!("Clearing unreadable session file: {}", e);
                let _ = fs::remove_file(path);
                return None;
            }
        };
        if session.is_expired() {
            debug!("Stored session has expired; clearing");
            let _ = fs::remove_file(path);
            return None;
        }
        Some(session)
    }

    /// Install the session from a successful login and persist it
    ///
    /// The expiry instant comes from the token's own `exp` claim; when the
    /// token is not inspectable, the login response's `expires_in` serves
    /// as the fallback.
    pub fn establish(&mut self, login: &LoginResponse) -> Result<()> {
        let expires_at = token_expiry(&login.access_token)
            .unwrap_or_else(|| Utc::now() + chrono::Duration::seconds(login.expires_in));
        let session = Session {
            user_id: login.user.id,
            username: login.user.username.clone(),
            role: login.user.role,
            token: login.access_token.clone(),
            expires_at,
        };
        self.persist(&session)?;
        self.current = Some(session);
        Ok(())
    }

    /// Currently authenticated session, if any
    ///
    /// Expiry is rechecked on every read: a session that lapsed while the
    /// process was running degrades to `None` exactly like a missing one.
    pub fn current(&self) -> Option<&Session> {
        match &self.current {
            Some(session) if !session.is_expired() => Some(session),
            _ => None,
        }
    }

    /// Forget the session, in memory and on disk
    ///
    /// Server-side logout is the caller's (best-effort) concern; local
    /// clearing always succeeds.
    pub fn invalidate(&mut self) {
        self.current = None;
        let _ = fs::remove_file(&self.path);
    }

    fn persist(&self, session: &Session) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(session)
            .map_err(|e| Error::Internal(format!("Session serialization: {}", e)))?;
        fs::write(&self.path, json)?;
        Ok(())
    }
}

/// Read the expiry instant from a JWT's `exp` claim
///
/// Only the unauthenticated payload segment is inspected; the token is
/// otherwise opaque to this client. Any structural surprise yields `None`.
fn token_expiry(token: &str) -> Option<DateTime<Utc>> {
    let payload_b64 = token.split('.').nth(1)?;
    let payload = URL_SAFE_NO_PAD
        .decode(payload_b64.trim_end_matches('='))
        .ok()?;
    let claims: TokenClaims = serde_json::from_slice(&payload).ok()?;
    Utc.timestamp_opt(claims.exp?, 0).single()
}

// ============================================================================
// Token Claim Types
// ============================================================================

#[derive(Debug, Deserialize)]
struct TokenClaims {
    exp: Option<i64>,
}

// ============================================================================
// Tests
// ============================================================================
