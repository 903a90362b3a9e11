// ============================
// crates/guard-lib/src/auth/rate_limit.rs
// ============================
//! Sliding-window rate limiting for authentication attempts.

use crate::clock::{duration_ms, Clock, SystemClock};
use crate::error::GuardError;
use crate::metrics::{RATE_LIMIT_ALLOWED, RATE_LIMIT_DENIED, RATE_LIMIT_LOCKOUT};
use dashmap::DashMap;
use metrics::counter;
use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Default number of attempts inside one window
const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Default window length (15 minutes)
const DEFAULT_WINDOW: Duration = Duration::from_secs(15 * 60);

/// Quota applied by [`RateLimiter::check`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitPolicy {
    max_attempts: u32,
    window: Duration,
}

impl Default for RateLimitPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            window: DEFAULT_WINDOW,
        }
    }
}

impl RateLimitPolicy {
    /// Create a policy. A zero window is a configuration error; zero attempts
    /// is accepted and denies everything.
    pub fn new(max_attempts: u32, window: Duration) -> Result<Self, GuardError> {
        if duration_ms(window) == 0 {
            return Err(GuardError::Configuration(
                "rate limit window must be at least 1ms".to_string(),
            ));
        }
        Ok(Self {
            max_attempts,
            window,
        })
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn window(&self) -> Duration {
        self.window
    }
}

/// Per-key sliding-window limiter.
///
/// One instance per purpose (login, registration, ...). Clones share state.
#[derive(Clone)]
pub struct RateLimiter {
    /// Purpose, used in logs
    name: Arc<str>,
    /// Attempt timestamps per key, oldest first
    attempts: Arc<DashMap<String, VecDeque<u64>>>,
    /// When each key last exceeded its quota
    lockouts: Arc<DashMap<String, u64>>,
    /// Quota used by `check` and `remaining`
    policy: RateLimitPolicy,
    clock: Arc<dyn Clock>,
}

impl fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RateLimiter")
            .field("name", &self.name)
            .field("policy", &self.policy)
            .field("keys", &self.attempts.len())
            .field("lockouts", &self.lockouts.len())
            .finish()
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new("default", RateLimitPolicy::default())
    }
}

impl RateLimiter {
    /// Create a limiter on the system clock
    pub fn new(name: &str, policy: RateLimitPolicy) -> Self {
        Self::with_clock(name, policy, Arc::new(SystemClock))
    }

    /// Create a limiter on the given clock
    pub fn with_clock(name: &str, policy: RateLimitPolicy, clock: Arc<dyn Clock>) -> Self {
        Self {
            name: Arc::from(name),
            attempts: Arc::new(DashMap::new()),
            lockouts: Arc::new(DashMap::new()),
            policy,
            clock,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn policy(&self) -> RateLimitPolicy {
        self.policy
    }

    /// Decide whether a new attempt for `key` is admitted, and record it if so.
    ///
    /// Attempts older than `window` age out continuously. When the remaining
    /// count already reaches `max_attempts` the key is stamped as locked out
    /// and the attempt is refused without being recorded.
    pub fn is_allowed(&self, key: &str, max_attempts: u32, window: Duration) -> bool {
        let now = self.clock.now_ms();
        let window_ms = duration_ms(window);

        let mut record = self.attempts.entry(key.to_string()).or_default();
        while let Some(&oldest) = record.front() {
            if now.saturating_sub(oldest) >= window_ms {
                record.pop_front();
            } else {
                break;
            }
        }

        if record.len() >= max_attempts as usize {
            let recorded = record.len();
            drop(record);

            let first_lockout = self.lockouts.insert(key.to_string(), now).is_none();
            if first_lockout {
                counter!(RATE_LIMIT_LOCKOUT).increment(1);
                tracing::warn!(
                    limiter = %self.name,
                    key,
                    attempts = recorded,
                    max_attempts,
                    "key locked out"
                );
            }
            counter!(RATE_LIMIT_DENIED).increment(1);
            return false;
        }

        record.push_back(now);
        drop(record);

        // A stale lockout is forgotten as soon as the key is admitted again
        self.lockouts.remove(key);
        counter!(RATE_LIMIT_ALLOWED).increment(1);
        true
    }

    /// Time until the lockout recorded for `key` runs out, zero if none
    pub fn remaining_time(&self, key: &str, window: Duration) -> Duration {
        let Some(locked_at) = self.lockouts.get(key).map(|entry| *entry) else {
            return Duration::ZERO;
        };

        let window_ms = duration_ms(window);
        let elapsed = self.clock.now_ms().saturating_sub(locked_at);
        if elapsed >= window_ms {
            self.lockouts.remove_if(key, |_, at| *at == locked_at);
            return Duration::ZERO;
        }

        Duration::from_millis(window_ms - elapsed)
    }

    /// Forget every attempt and lockout for `key`
    pub fn reset(&self, key: &str) {
        self.attempts.remove(key);
        self.lockouts.remove(key);
        tracing::debug!(limiter = %self.name, key, "rate limit reset");
    }

    /// `is_allowed` with this limiter's policy
    pub fn check(&self, key: &str) -> bool {
        self.is_allowed(key, self.policy.max_attempts, self.policy.window)
    }

    /// `remaining_time` with this limiter's policy
    pub fn remaining(&self, key: &str) -> Duration {
        self.remaining_time(key, self.policy.window)
    }
}
