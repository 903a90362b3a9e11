// ================
// common/src/lib.rs
// ================
//! Common types shared between the `tabguard` library and the hosts that embed it.
//! These are the shapes the surrounding application hands to the guard
//! (who is signed in) and the shapes the guard hands back (notices, audit actions).

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque user identifier as issued by the identity backend
pub type UserId = String;

/// Role of a signed-in account
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Regular account
    #[default]
    User,
    /// Account allowed to manage other accounts
    Admin,
}

/// Approval status of an account
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum IdentityStatus {
    /// Registered, waiting for an admin decision
    #[default]
    Pending,
    /// Approved and allowed to sign in
    Active,
    /// Refused by an admin
    Rejected,
}

/// The currently signed-in account, as cached by the host
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    /// Account ID
    pub id: UserId,
    /// Display name
    pub name: String,
    /// Email address, when the backend exposes it
    #[serde(default)]
    pub email: Option<String>,
    /// Account role
    #[serde(default)]
    pub role: Role,
    /// Account status
    #[serde(default)]
    pub status: IdentityStatus,
}

impl Identity {
    /// Whether the account may use admin screens
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Whether the account has been approved
    pub fn is_active(&self) -> bool {
        self.status == IdentityStatus::Active
    }
}

/// Kind of message shown to the user
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum NoticeKind {
    Error,
    Info,
}

impl fmt::Display for NoticeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NoticeKind::Error => f.write_str("error"),
            NoticeKind::Info => f.write_str("info"),
        }
    }
}

/// Sensitive actions that end up in the audit log
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    Login,
    Logout,
    UserApproval,
    ExamSubmission,
    CertificateGenerated,
}

impl AuditAction {
    /// Wire name of the action, as stored in the audit log
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::Login => "LOGIN",
            AuditAction::Logout => "LOGOUT",
            AuditAction::UserApproval => "USER_APPROVAL",
            AuditAction::ExamSubmission => "EXAM_SUBMISSION",
            AuditAction::CertificateGenerated => "CERTIFICATE_GENERATED",
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
