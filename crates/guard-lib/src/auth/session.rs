// ============================
// crates/guard-lib/src/auth/session.rs
// ============================
//! Inactivity-based session lifecycle.
//!
//! A session is ACTIVE while the user keeps interacting, enters WARNING once
//! `timeout - warn_before` has passed without activity, and is EXPIRED after
//! `timeout`. EXPIRED is terminal: activity never revives it, only
//! [`SessionLifecycle::begin`] starts a new one.
//!
//! The session id and last-activity timestamp are mirrored into the tab store
//! so a reloaded page continues the same inactivity clock.

use crate::clock::{duration_ms, Clock};
use crate::error::GuardError;
use crate::metrics::{SESSION_ENDED, SESSION_STARTED};
use crate::storage::{clear_lossy, get_lossy, keys, set_lossy, TabStore};
use metrics::counter;
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use super::token_generator::generate_session_id;

/// Default inactivity timeout (30 minutes)
pub const DEFAULT_SESSION_TIMEOUT: Duration = Duration::from_secs(30 * 60);

/// Default warning lead time (5 minutes)
pub const DEFAULT_WARN_BEFORE: Duration = Duration::from_secs(5 * 60);

/// Default minimum gap between two activity writes to the store
const DEFAULT_PERSIST_INTERVAL: Duration = Duration::from_secs(1);

/// Timing rules of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionPolicy {
    timeout: Duration,
    warn_before: Duration,
    persist_interval: Duration,
}

impl Default for SessionPolicy {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_SESSION_TIMEOUT,
            warn_before: DEFAULT_WARN_BEFORE,
            persist_interval: DEFAULT_PERSIST_INTERVAL,
        }
    }
}

impl SessionPolicy {
    /// Create a policy; `timeout` must be positive and longer than `warn_before`
    pub fn new(timeout: Duration, warn_before: Duration) -> Result<Self, GuardError> {
        if duration_ms(timeout) == 0 {
            return Err(GuardError::Configuration(
                "session timeout must be at least 1ms".to_string(),
            ));
        }
        if warn_before >= timeout {
            return Err(GuardError::Configuration(format!(
                "session warning lead ({warn_before:?}) must be shorter than the timeout ({timeout:?})"
            )));
        }
        Ok(Self {
            timeout,
            warn_before,
            persist_interval: DEFAULT_PERSIST_INTERVAL,
        })
    }

    #[must_use]
    pub fn with_persist_interval(mut self, interval: Duration) -> Self {
        self.persist_interval = interval;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn warn_before(&self) -> Duration {
        self.warn_before
    }

    pub fn persist_interval(&self) -> Duration {
        self.persist_interval
    }

    /// Phase of a session idle for `elapsed_ms`
    fn phase_after(&self, elapsed_ms: u64) -> SessionPhase {
        let timeout_ms = duration_ms(self.timeout);
        let warn_at = timeout_ms - duration_ms(self.warn_before);
        if elapsed_ms >= timeout_ms {
            SessionPhase::Expired
        } else if elapsed_ms >= warn_at {
            SessionPhase::Warning
        } else {
            SessionPhase::Active
        }
    }
}

/// Logical state of the session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// Within the allowed inactivity window
    Active,
    /// Close to expiry; the user should be told
    Warning,
    /// Timed out, ended, or never started
    Expired,
}

/// Live session data
#[derive(Debug, Clone)]
struct SessionState {
    session_id: String,
    last_activity: u64,
    /// Last activity value written to the store
    last_persisted: u64,
}

/// Owner of the tab's session state
pub struct SessionLifecycle {
    policy: SessionPolicy,
    state: Mutex<Option<SessionState>>,
    store: Arc<dyn TabStore>,
    clock: Arc<dyn Clock>,
}

impl fmt::Debug for SessionLifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionLifecycle")
            .field("policy", &self.policy)
            .field("phase", &self.phase())
            .finish()
    }
}

impl SessionLifecycle {
    /// Create the lifecycle, picking up a session persisted by an earlier page load
    pub fn new(policy: SessionPolicy, store: Arc<dyn TabStore>, clock: Arc<dyn Clock>) -> Self {
        let session_id = get_lossy(store.as_ref(), keys::SESSION_ID);
        let last_activity = get_lossy(store.as_ref(), keys::LAST_ACTIVITY)
            .and_then(|raw| raw.trim().parse::<u64>().ok());

        let state = match (session_id, last_activity) {
            (Some(session_id), Some(last_activity)) => {
                tracing::debug!(%session_id, last_activity, "restored session from tab store");
                Some(SessionState {
                    session_id,
                    last_activity,
                    last_persisted: last_activity,
                })
            },
            _ => None,
        };

        Self {
            policy,
            state: Mutex::new(state),
            store,
            clock,
        }
    }

    pub fn policy(&self) -> SessionPolicy {
        self.policy
    }

    /// Start a brand-new session and return its id
    pub fn begin(&self) -> String {
        let now = self.clock.now_ms();
        let session_id = generate_session_id();

        set_lossy(self.store.as_ref(), keys::SESSION_ID, &session_id);
        set_lossy(self.store.as_ref(), keys::LAST_ACTIVITY, &now.to_string());

        *self.state.lock() = Some(SessionState {
            session_id: session_id.clone(),
            last_activity: now,
            last_persisted: now,
        });

        counter!(SESSION_STARTED).increment(1);
        tracing::info!(%session_id, "session started");
        session_id
    }

    /// Record user activity.
    ///
    /// Refreshes the inactivity clock of an ACTIVE or WARNING session and is a
    /// no-op otherwise. Store writes are throttled to one per persist interval.
    pub fn touch(&self) {
        let now = self.clock.now_ms();
        let mut guard = self.state.lock();
        let Some(state) = guard.as_mut() else {
            return;
        };

        let elapsed = now.saturating_sub(state.last_activity);
        if self.policy.phase_after(elapsed) == SessionPhase::Expired {
            tracing::debug!(session_id = %state.session_id, "activity after expiry ignored");
            return;
        }

        state.last_activity = now;
        if now.saturating_sub(state.last_persisted) >= duration_ms(self.policy.persist_interval) {
            state.last_persisted = now;
            set_lossy(self.store.as_ref(), keys::LAST_ACTIVITY, &now.to_string());
        }
    }

    /// Current phase
    pub fn phase(&self) -> SessionPhase {
        let now = self.clock.now_ms();
        match self.state.lock().as_ref() {
            Some(state) => self
                .policy
                .phase_after(now.saturating_sub(state.last_activity)),
            None => SessionPhase::Expired,
        }
    }

    /// Whether the session is ACTIVE or WARNING
    pub fn is_valid(&self) -> bool {
        self.phase() != SessionPhase::Expired
    }

    /// Whether the session is in its WARNING phase
    pub fn should_warn(&self) -> bool {
        self.phase() == SessionPhase::Warning
    }

    /// Time left before the session expires; zero when it already has
    pub fn remaining(&self) -> Duration {
        let now = self.clock.now_ms();
        match self.state.lock().as_ref() {
            Some(state) => {
                let elapsed = now.saturating_sub(state.last_activity);
                Duration::from_millis(duration_ms(self.policy.timeout).saturating_sub(elapsed))
            },
            None => Duration::ZERO,
        }
    }

    /// End the session and wipe every session-scoped value from the tab store
    pub fn end(&self) {
        let ended = self.state.lock().take();
        clear_lossy(self.store.as_ref());

        if let Some(state) = ended {
            counter!(SESSION_ENDED).increment(1);
            tracing::info!(session_id = %state.session_id, "session ended");
        }
    }

    /// Id of the current session, if one exists (expired or not)
    pub fn session_id(&self) -> Option<String> {
        self.state.lock().as_ref().map(|s| s.session_id.clone())
    }

    /// Id of the current session, only while it is valid
    pub(crate) fn live_session_id(&self) -> Option<String> {
        let now = self.clock.now_ms();
        let guard = self.state.lock();
        let state = guard.as_ref()?;
        let phase = self
            .policy
            .phase_after(now.saturating_sub(state.last_activity));
        (phase != SessionPhase::Expired).then(|| state.session_id.clone())
    }

    /// Id of the live session, or [`GuardError::MissingSession`] when there is none
    pub fn require_live(&self) -> Result<String, GuardError> {
        self.live_session_id().ok_or(GuardError::MissingSession)
    }

    /// Last recorded activity in ms since the epoch
    pub fn last_activity_ms(&self) -> Option<u64> {
        self.state.lock().as_ref().map(|s| s.last_activity)
    }
}
