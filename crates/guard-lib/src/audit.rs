// ============================
// crates/guard-lib/src/audit.rs
// ============================
//! Audit trail of sensitive actions.
//!
//! Records are enriched with whoever is signed in and handed to a sink.
//! A failing sink is logged and otherwise ignored: auditing never blocks the
//! action being audited.

use crate::hooks::IdentityProvider;
use crate::metrics::AUDIT_WRITE_FAILED;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use metrics::counter;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use tabguard_common::{AuditAction, UserId};

/// One audit log entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub action: AuditAction,
    pub details: Value,
    pub user_id: Option<UserId>,
    pub user_name: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// Destination of audit records
#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn write(&self, record: &AuditRecord) -> anyhow::Result<()>;
}

/// Sink that emits each record as a structured `audit` log event
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingAuditSink;

#[async_trait]
impl AuditSink for TracingAuditSink {
    async fn write(&self, record: &AuditRecord) -> anyhow::Result<()> {
        tracing::info!(
            target: "audit",
            action = %record.action,
            user_id = record.user_id.as_deref().unwrap_or("-"),
            details = %record.details,
            timestamp = %record.timestamp.to_rfc3339(),
            "audit"
        );
        Ok(())
    }
}

/// Sink that keeps records in memory
#[derive(Debug, Default)]
pub struct MemoryAuditSink {
    records: Mutex<Vec<AuditRecord>>,
}

impl MemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<AuditRecord> {
        self.records.lock().clone()
    }
}

#[async_trait]
impl AuditSink for MemoryAuditSink {
    async fn write(&self, record: &AuditRecord) -> anyhow::Result<()> {
        self.records.lock().push(record.clone());
        Ok(())
    }
}

/// Writes audit records for sensitive actions
#[derive(Clone)]
pub struct AuditLogger {
    identity: Arc<dyn IdentityProvider>,
    sink: Arc<dyn AuditSink>,
}

impl AuditLogger {
    pub fn new(identity: Arc<dyn IdentityProvider>, sink: Arc<dyn AuditSink>) -> Self {
        Self { identity, sink }
    }

    /// Record `action` with free-form `details`
    pub async fn log_action(&self, action: AuditAction, details: Value) {
        let user = self.identity.current_identity().await;
        let record = AuditRecord {
            action,
            details,
            user_id: user.as_ref().map(|u| u.id.clone()),
            user_name: user.map(|u| u.name),
            timestamp: Utc::now(),
        };

        match self.sink.write(&record).await {
            Ok(()) => tracing::debug!(%action, "audit record written"),
            Err(e) => {
                counter!(AUDIT_WRITE_FAILED).increment(1);
                tracing::error!(%action, error = %e, "failed to write audit record");
            },
        }
    }

    pub async fn log_login(&self, user_id: &str) {
        self.log_action(AuditAction::Login, json!({ "user_id": user_id }))
            .await;
    }

    pub async fn log_logout(&self, user_id: &str) {
        self.log_action(AuditAction::Logout, json!({ "user_id": user_id }))
            .await;
    }

    pub async fn log_user_approval(&self, user_id: &str, admin_id: &str) {
        self.log_action(
            AuditAction::UserApproval,
            json!({ "user_id": user_id, "admin_id": admin_id }),
        )
        .await;
    }

    pub async fn log_exam_submission(&self, user_id: &str, exam_id: &str, score: f64) {
        self.log_action(
            AuditAction::ExamSubmission,
            json!({ "user_id": user_id, "exam_id": exam_id, "score": score }),
        )
        .await;
    }

    pub async fn log_certificate_generation(&self, user_id: &str, exam_id: &str) {
        self.log_action(
            AuditAction::CertificateGenerated,
            json!({ "user_id": user_id, "exam_id": exam_id }),
        )
        .await;
    }
}
