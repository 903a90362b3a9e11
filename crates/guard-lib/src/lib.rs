// ============================
// crates/guard-lib/src/lib.rs
// ============================
//! Client-side access control and session lifecycle for one tab session.

pub mod activity;
pub mod audit;
pub mod auth;
pub mod clock;
pub mod config;
pub mod error;
pub mod hooks;
pub mod metrics;
pub mod storage;
pub mod validation;

use std::sync::Arc;

use crate::activity::{ActivityMonitor, MonitorHandle};
use crate::audit::{AuditLogger, AuditSink};
use crate::auth::{CsrfGuard, RateLimiter, SessionLifecycle};
use crate::clock::{Clock, SystemClock};
use crate::config::Settings;
use crate::error::GuardError;
use crate::hooks::{LogoutHandler, Notifier, StoredIdentity};
use crate::storage::{FlatFileStore, MemoryStore, TabStore};

/// Name of the login limiter in logs
pub const LOGIN_LIMITER: &str = "login";
/// Name of the registration limiter in logs
pub const REGISTRATION_LIMITER: &str = "registration";

/// Every guard component of one tab, sharing one store and one clock
#[derive(Clone)]
pub struct GuardContext {
    /// Settings the context was built from
    pub settings: Arc<Settings>,
    /// Tab store
    pub store: Arc<dyn TabStore>,
    /// Time source
    pub clock: Arc<dyn Clock>,
    /// Login attempt limiter
    pub login_limiter: RateLimiter,
    /// Registration attempt limiter
    pub registration_limiter: RateLimiter,
    /// Session lifecycle
    pub session: Arc<SessionLifecycle>,
    /// Anti-forgery guard
    pub csrf: Arc<CsrfGuard>,
}

impl GuardContext {
    /// Create a context over an explicit store and clock
    pub fn new(
        settings: Settings,
        store: Arc<dyn TabStore>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, GuardError> {
        settings.validate()?;

        let login_limiter = RateLimiter::with_clock(
            LOGIN_LIMITER,
            settings.login_limit.policy()?,
            clock.clone(),
        );
        let registration_limiter = RateLimiter::with_clock(
            REGISTRATION_LIMITER,
            settings.registration_limit.policy()?,
            clock.clone(),
        );
        let session = Arc::new(SessionLifecycle::new(
            settings.session.policy()?,
            store.clone(),
            clock.clone(),
        ));
        let csrf = Arc::new(CsrfGuard::new(session.clone(), store.clone()));

        Ok(Self {
            settings: Arc::new(settings),
            store,
            clock,
            login_limiter,
            registration_limiter,
            session,
            csrf,
        })
    }

    /// Create a context on the system clock, with the store `settings` asks for.
    ///
    /// A flat-file store that cannot be opened falls back to memory.
    pub fn from_settings(settings: Settings) -> Result<Self, GuardError> {
        let store: Arc<dyn TabStore> = match &settings.store_dir {
            Some(dir) => match FlatFileStore::open(dir) {
                Ok(store) => {
                    tracing::info!(path = %store.path().display(), "using flat-file tab store");
                    Arc::new(store)
                },
                Err(e) => {
                    tracing::warn!(
                        dir = %dir.display(),
                        error = %e,
                        "could not open flat-file tab store, falling back to memory"
                    );
                    Arc::new(MemoryStore::new())
                },
            },
            None => Arc::new(MemoryStore::new()),
        };

        Self::new(settings, store, Arc::new(SystemClock))
    }

    /// Start a new session and return its id
    pub fn begin_session(&self) -> String {
        self.session.begin()
    }

    /// End the session and forget its anti-forgery token
    pub fn end_session(&self) {
        self.session.end();
        self.csrf.invalidate();
    }

    /// Start the liveness check for the current session
    pub fn start_monitor(
        &self,
        logout: Arc<dyn LogoutHandler>,
        notifier: Arc<dyn Notifier>,
    ) -> MonitorHandle {
        ActivityMonitor::new(self.session.clone(), logout, notifier)
            .start(self.settings.activity.check_interval())
    }

    /// Audit logger identifying users through the tab store
    pub fn audit_logger(&self, sink: Arc<dyn AuditSink>) -> AuditLogger {
        AuditLogger::new(Arc::new(StoredIdentity::new(self.store.clone())), sink)
    }
}
