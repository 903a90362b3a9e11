// ==============
// crates/guard-lib/src/metrics.rs

//! Central place for metric keys
pub const RATE_LIMIT_ALLOWED: &str = "rate_limit.allowed";
pub const RATE_LIMIT_DENIED: &str = "rate_limit.denied";
pub const RATE_LIMIT_LOCKOUT: &str = "rate_limit.lockout";
pub const SESSION_STARTED: &str = "session.started";
pub const SESSION_ENDED: &str = "session.ended";
pub const SESSION_EXPIRED: &str = "session.expired";
pub const CSRF_ISSUED: &str = "csrf.issued";
pub const CSRF_REJECTED: &str = "csrf.rejected";
pub const LOGOUT_FAILED: &str = "activity.logout_failed";
pub const AUDIT_WRITE_FAILED: &str = "audit.write_failed";
