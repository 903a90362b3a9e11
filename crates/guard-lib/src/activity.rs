// ============================
// crates/guard-lib/src/activity.rs
// ============================
//! Activity monitor: feeds user interaction into the session and runs the
//! periodic liveness check that signs the user out once the session expires.

use crate::auth::{SessionLifecycle, SessionPhase};
use crate::error::GuardError;
use crate::hooks::{LogoutHandler, Notifier};
use crate::metrics::{LOGOUT_FAILED, SESSION_EXPIRED};
use metrics::counter;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tabguard_common::NoticeKind;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

const EXPIRED_NOTICE: &str = "Your session has expired. Please sign in again.";

/// Passive interaction reported by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivitySignal {
    PointerMove,
    KeyPress,
    Click,
    Scroll,
}

/// Outcome of one liveness check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Liveness {
    /// Session is active
    Active,
    /// Session is about to expire
    Warning,
    /// Session expired on this check; logout was triggered
    Expired,
    /// Logout already fired earlier; nothing left to do
    Stopped,
}

/// Liveness checker for one session
pub struct ActivityMonitor {
    session: Arc<SessionLifecycle>,
    logout: Arc<dyn LogoutHandler>,
    notifier: Arc<dyn Notifier>,
    /// Set once logout has been triggered for this session
    fired: AtomicBool,
    /// Set while the current warning episode has been announced
    warned: AtomicBool,
}

impl ActivityMonitor {
    pub fn new(
        session: Arc<SessionLifecycle>,
        logout: Arc<dyn LogoutHandler>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            session,
            logout,
            notifier,
            fired: AtomicBool::new(false),
            warned: AtomicBool::new(false),
        }
    }

    /// Run one liveness check.
    ///
    /// Announces the warning phase once per episode. On expiry ends the
    /// session and calls the logout handler, at most once per monitor.
    pub async fn check_once(&self) -> Liveness {
        if self.fired.load(Ordering::Acquire) {
            return Liveness::Stopped;
        }

        match self.session.phase() {
            SessionPhase::Active => {
                self.warned.store(false, Ordering::Release);
                Liveness::Active
            },
            SessionPhase::Warning => {
                if !self.warned.swap(true, Ordering::AcqRel) {
                    let minutes = self.session.remaining().as_secs().div_ceil(60).max(1);
                    self.notifier.notify(
                        NoticeKind::Info,
                        &format!("Your session will expire in {minutes} minute(s) due to inactivity."),
                    );
                }
                Liveness::Warning
            },
            SessionPhase::Expired => {
                if self.fired.swap(true, Ordering::AcqRel) {
                    return Liveness::Stopped;
                }
                self.expire().await;
                Liveness::Expired
            },
        }
    }

    /// Whether logout has been triggered
    pub fn has_fired(&self) -> bool {
        self.fired.load(Ordering::Acquire)
    }

    async fn expire(&self) {
        let session_id = self.session.session_id();
        self.session.end();
        counter!(SESSION_EXPIRED).increment(1);
        tracing::info!(session_id = ?session_id, "session expired, forcing logout");

        self.notifier.notify(NoticeKind::Info, EXPIRED_NOTICE);

        if let Err(e) = self.logout.force_logout().await {
            let err = GuardError::LogoutFailed(format!("{e:#}"));
            counter!(LOGOUT_FAILED).increment(1);
            tracing::error!(error = %err, code = err.error_code(), "forced logout failed");
            self.notifier.notify(NoticeKind::Error, &err.sanitized_message());
        }
    }

    /// Spawn the periodic check on the current tokio runtime.
    ///
    /// The task stops by itself after the session expires (whether or not the
    /// logout succeeded), on [`MonitorHandle::teardown`], or when the handle
    /// is dropped.
    pub fn start(self, check_interval: Duration) -> MonitorHandle {
        let monitor = Arc::new(self);
        let attached = Arc::new(AtomicBool::new(true));
        let (stop_tx, mut stop_rx) = watch::channel(false);

        let task_monitor = monitor.clone();
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(check_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            // The first tick completes immediately
            ticker.tick().await;

            // Only `true` is ever sent on `stop_rx`; a dropped sender also means stop
            loop {
                tokio::select! {
                    _ = ticker.tick() => {},
                    _ = stop_rx.changed() => break,
                }

                // A check may be parked in `force_logout`; stop must still win
                let liveness = tokio::select! {
                    liveness = task_monitor.check_once() => liveness,
                    _ = stop_rx.changed() => break,
                };
                match liveness {
                    Liveness::Expired | Liveness::Stopped => break,
                    Liveness::Active | Liveness::Warning => {},
                }
            }
            tracing::debug!("liveness check stopped");
        });

        MonitorHandle {
            monitor,
            attached,
            stop_tx,
            task: Some(task),
        }
    }
}

/// Stop handle of a running monitor
pub struct MonitorHandle {
    monitor: Arc<ActivityMonitor>,
    attached: Arc<AtomicBool>,
    stop_tx: watch::Sender<bool>,
    task: Option<JoinHandle<()>>,
}

impl MonitorHandle {
    /// Callback the host invokes for every interaction signal
    pub fn listener(&self) -> ActivityListener {
        ActivityListener {
            session: self.monitor.session.clone(),
            attached: self.attached.clone(),
        }
    }

    /// Whether the periodic check is still scheduled
    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Whether logout has been triggered
    pub fn has_fired(&self) -> bool {
        self.monitor.has_fired()
    }

    /// Stop the timer, detach every listener and wait for the task to finish.
    ///
    /// A logout still in flight is abandoned rather than awaited.
    pub async fn teardown(mut self) {
        self.attached.store(false, Ordering::Release);
        // The task may already be gone, in which case nobody is listening
        let _ = self.stop_tx.send(true);

        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                if e.is_panic() {
                    tracing::error!("liveness check task panicked");
                }
            }
        }
    }
}

impl Drop for MonitorHandle {
    fn drop(&mut self) {
        self.attached.store(false, Ordering::Release);
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

/// Forwards interaction signals to the session while its monitor is attached
#[derive(Clone)]
pub struct ActivityListener {
    session: Arc<SessionLifecycle>,
    attached: Arc<AtomicBool>,
}

impl ActivityListener {
    pub fn on_signal(&self, signal: ActivitySignal) {
        if self.attached.load(Ordering::Acquire) {
            tracing::trace!(?signal, "activity");
            self.session.touch();
        }
    }

    pub fn is_attached(&self) -> bool {
        self.attached.load(Ordering::Acquire)
    }
}
