// ============================
// crates/guard-lib/src/hooks.rs
// ============================
//! Collaborators the host application provides to the guard.

use crate::storage::{get_lossy, keys, TabStore};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use tabguard_common::{Identity, NoticeKind};

/// Looks up who is signed in
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn current_identity(&self) -> Option<Identity>;
}

/// Signs the user out when their session expires
#[async_trait]
pub trait LogoutHandler: Send + Sync {
    async fn force_logout(&self) -> anyhow::Result<()>;
}

/// Shows a message to the user
pub trait Notifier: Send + Sync {
    fn notify(&self, kind: NoticeKind, text: &str);
}

/// Identity cached by the host in the tab store under `currentUser`
pub struct StoredIdentity {
    store: Arc<dyn TabStore>,
}

impl StoredIdentity {
    pub fn new(store: Arc<dyn TabStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl IdentityProvider for StoredIdentity {
    async fn current_identity(&self) -> Option<Identity> {
        let raw = get_lossy(self.store.as_ref(), keys::CURRENT_USER)?;
        match serde_json::from_str(&raw) {
            Ok(identity) => Some(identity),
            Err(e) => {
                tracing::warn!(error = %e, "ignoring malformed cached identity");
                None
            },
        }
    }
}

/// Notifier that writes every notice to the log
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, kind: NoticeKind, text: &str) {
        match kind {
            NoticeKind::Error => tracing::error!(notice = text, "user notice"),
            NoticeKind::Info => tracing::info!(notice = text, "user notice"),
        }
    }
}

/// Notifier that keeps every notice, for hosts that render them later
#[derive(Debug, Default)]
pub struct CollectingNotifier {
    notices: Mutex<Vec<(NoticeKind, String)>>,
}

impl CollectingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Notices received so far, oldest first
    pub fn notices(&self) -> Vec<(NoticeKind, String)> {
        self.notices.lock().clone()
    }

    /// Take and clear the received notices
    pub fn drain(&self) -> Vec<(NoticeKind, String)> {
        std::mem::take(&mut *self.notices.lock())
    }
}

impl Notifier for CollectingNotifier {
    fn notify(&self, kind: NoticeKind, text: &str) {
        self.notices.lock().push((kind, text.to_string()));
    }
}
