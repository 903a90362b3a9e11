// ============================
// crates/guard-lib/src/auth/mod.rs
// ============================
//! Access control: attempt throttling, session lifecycle and CSRF tokens.

pub mod csrf;
pub mod rate_limit;
pub mod session;
pub mod token_generator;

pub use csrf::{CsrfGuard, CSRF_FORM_FIELD};
pub use rate_limit::{RateLimitPolicy, RateLimiter};
pub use session::{
    SessionLifecycle, SessionPhase, SessionPolicy, DEFAULT_SESSION_TIMEOUT, DEFAULT_WARN_BEFORE,
};
pub use token_generator::{generate_secure_token, generate_session_id};
