// ============================
// crates/guard-lib/src/auth/csrf.rs
// ============================
//! Anti-forgery tokens bound to the current session.
//!
//! A token is minted lazily on first request, bound to the id of the session
//! it was minted for, and mirrored into the tab store. It is only honoured
//! while that same session is valid, so ending or replacing the session
//! invalidates it even if a stale copy survives somewhere.

use crate::metrics::{CSRF_ISSUED, CSRF_REJECTED};
use crate::storage::{get_lossy, keys, set_lossy, TabStore};
use metrics::counter;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use subtle::ConstantTimeEq;
use zeroize::Zeroizing;

use super::session::SessionLifecycle;
use super::token_generator::generate_secure_token_with_size;

/// Name of the hidden form field carrying the token
pub const CSRF_FORM_FIELD: &str = "csrf_token";

/// Default token size in bytes (256 bits)
const DEFAULT_TOKEN_BYTES: usize = 32;

/// Token as persisted in the tab store
#[derive(Serialize, Deserialize)]
struct StoredToken {
    session_id: String,
    token: String,
}

/// Token held in memory; wiped when replaced or dropped
struct BoundToken {
    session_id: String,
    token: Zeroizing<String>,
}

/// Issues and checks the tab's anti-forgery token
pub struct CsrfGuard {
    session: Arc<SessionLifecycle>,
    store: Arc<dyn TabStore>,
    current: Mutex<Option<BoundToken>>,
    token_bytes: usize,
}

impl CsrfGuard {
    pub fn new(session: Arc<SessionLifecycle>, store: Arc<dyn TabStore>) -> Self {
        Self {
            session,
            store,
            current: Mutex::new(None),
            token_bytes: DEFAULT_TOKEN_BYTES,
        }
    }

    /// Return the token of the current session, minting one if needed.
    ///
    /// Without a live session a throwaway token is returned; it is never
    /// stored and never validates.
    pub fn get_token(&self) -> String {
        let session_id = match self.session.require_live() {
            Ok(session_id) => session_id,
            Err(err) => {
                tracing::debug!(
                    code = err.error_code(),
                    "csrf token requested without a live session"
                );
                return generate_secure_token_with_size(self.token_bytes);
            },
        };

        let mut current = self.current.lock();
        if let Some(bound) = current.as_ref().filter(|b| b.session_id == session_id) {
            return String::clone(&bound.token);
        }

        if let Some(stored) = self.load_stored().filter(|s| s.session_id == session_id) {
            let token = stored.token.clone();
            *current = Some(BoundToken {
                session_id: stored.session_id,
                token: Zeroizing::new(stored.token),
            });
            return token;
        }

        let token = generate_secure_token_with_size(self.token_bytes);
        let stored = StoredToken {
            session_id: session_id.clone(),
            token: token.clone(),
        };
        match serde_json::to_string(&stored) {
            Ok(json) => set_lossy(self.store.as_ref(), keys::CSRF_TOKEN, &json),
            Err(e) => tracing::warn!(error = %e, "could not encode csrf token for the tab store"),
        }
        *current = Some(BoundToken {
            session_id,
            token: Zeroizing::new(token.clone()),
        });

        counter!(CSRF_ISSUED).increment(1);
        token
    }

    /// Check a submitted token against the current session's token
    pub fn validate_token(&self, candidate: &str) -> bool {
        let session_id = match self.session.require_live() {
            Ok(session_id) => session_id,
            Err(err) => {
                tracing::debug!(
                    code = err.error_code(),
                    "csrf token submitted without a live session"
                );
                counter!(CSRF_REJECTED).increment(1);
                return false;
            },
        };

        let mut current = self.current.lock();
        if current.as_ref().map_or(true, |b| b.session_id != session_id) {
            // Token minted before a reload lives only in the store
            *current = self
                .load_stored()
                .filter(|s| s.session_id == session_id)
                .map(|s| BoundToken {
                    session_id: s.session_id,
                    token: Zeroizing::new(s.token),
                });
        }

        let valid = current.as_ref().is_some_and(|bound| {
            bool::from(bound.token.as_bytes().ct_eq(candidate.as_bytes()))
        });
        if !valid {
            counter!(CSRF_REJECTED).increment(1);
            tracing::debug!("csrf token rejected");
        }
        valid
    }

    /// `(field name, token)` pair to embed in a form
    pub fn form_field(&self) -> (&'static str, String) {
        (CSRF_FORM_FIELD, self.get_token())
    }

    /// Drop the in-memory token
    pub fn invalidate(&self) {
        self.current.lock().take();
    }

    fn load_stored(&self) -> Option<StoredToken> {
        let raw = get_lossy(self.store.as_ref(), keys::CSRF_TOKEN)?;
        match serde_json::from_str(&raw) {
            Ok(stored) => Some(stored),
            Err(e) => {
                tracing::warn!(error = %e, "ignoring malformed csrf token in tab store");
                None
            },
        }
    }
}
