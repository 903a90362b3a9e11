// ==============================
// tests/unit/rate_limit_tests.rs
// ==============================
//! Sliding-window behaviour of `RateLimiter`
use guard_lib::auth::{RateLimitPolicy, RateLimiter};
use guard_lib::clock::ManualClock;
use std::sync::Arc;
use std::time::Duration;

use crate::test_utils::START_MS;

const WINDOW: Duration = Duration::from_secs(15 * 60);

fn limiter() -> (RateLimiter, ManualClock) {
    let clock = ManualClock::new(START_MS);
    let limiter = RateLimiter::with_clock(
        "login",
        RateLimitPolicy::new(5, WINDOW).unwrap(),
        Arc::new(clock.clone()),
    );
    (limiter, clock)
}

#[test]
fn test_n_attempts_then_denied() {
    let (limiter, _) = limiter();

    for attempt in 1..=5 {
        assert!(
            limiter.is_allowed("user@example.com", 5, WINDOW),
            "attempt {attempt} should be allowed"
        );
    }
    assert!(!limiter.is_allowed("user@example.com", 5, WINDOW));
    assert!(!limiter.is_allowed("user@example.com", 5, WINDOW));
}

#[test]
fn test_keys_tracked_separately() {
    let (limiter, _) = limiter();

    for _ in 0..5 {
        limiter.check("a@example.com");
    }
    assert!(!limiter.check("a@example.com"));
    assert!(limiter.check("b@example.com"));
    assert_eq!(limiter.remaining("b@example.com"), Duration::ZERO);
}

#[test]
fn test_oldest_attempt_ages_out() {
    let (limiter, clock) = limiter();

    // Attempts at t=0, 1, 2, 3, 4 minutes
    for _ in 0..5 {
        assert!(limiter.check("k"));
        clock.advance(Duration::from_secs(60));
    }
    // t=5min: window still holds all five
    assert!(!limiter.check("k"));

    // t=15min: the t=0 attempt ages out, exactly one slot frees up
    clock.set(START_MS + 15 * 60 * 1000);
    assert!(limiter.check("k"));
    assert!(!limiter.check("k"));
}

#[test]
fn test_remaining_time_counts_down_to_zero() {
    let (limiter, clock) = limiter();
    for _ in 0..5 {
        limiter.check("k");
    }
    assert_eq!(limiter.remaining("k"), Duration::ZERO);

    assert!(!limiter.check("k"));
    assert_eq!(limiter.remaining("k"), WINDOW);

    let mut previous = limiter.remaining("k");
    for _ in 0..14 {
        clock.advance(Duration::from_secs(60));
        let now = limiter.remaining("k");
        assert!(now <= previous);
        previous = now;
    }
    assert_eq!(previous, Duration::from_secs(60));

    clock.advance(Duration::from_secs(60));
    assert_eq!(limiter.remaining("k"), Duration::ZERO);
}

#[test]
fn test_reset_forgets_key() {
    let (limiter, _) = limiter();
    for _ in 0..6 {
        limiter.check("k");
    }
    assert!(limiter.remaining("k") > Duration::ZERO);

    limiter.reset("k");
    assert_eq!(limiter.remaining("k"), Duration::ZERO);
    for _ in 0..5 {
        assert!(limiter.check("k"));
    }
}

#[test]
fn test_zero_limit_denies_everything() {
    let (limiter, _) = limiter();
    assert!(!limiter.is_allowed("k", 0, WINDOW));
    assert_eq!(limiter.remaining_time("k", WINDOW), WINDOW);
}

#[test]
fn test_empty_key_is_a_key() {
    let (limiter, _) = limiter();
    assert!(limiter.is_allowed("", 1, WINDOW));
    assert!(!limiter.is_allowed("", 1, WINDOW));
    assert!(limiter.is_allowed(" ", 1, WINDOW));
}

#[test]
fn test_lockout_follows_the_callers_window() {
    let (limiter, clock) = limiter();
    let hour = Duration::from_secs(60 * 60);

    for _ in 0..5 {
        assert!(limiter.is_allowed("slow@example.com", 5, hour));
    }
    assert!(!limiter.is_allowed("slow@example.com", 5, hour));

    // Outside the limiter's own 15 minute policy, but checks through the
    // policy never touch a key counted under the longer window
    clock.advance(Duration::from_secs(20 * 60));
    assert!(limiter.check("other@example.com"));
    assert_eq!(
        limiter.remaining_time("slow@example.com", hour),
        Duration::from_secs(40 * 60)
    );
    assert!(!limiter.is_allowed("slow@example.com", 5, hour));

    // Only once the hour has passed do the attempts age out
    clock.advance(hour);
    assert!(limiter.is_allowed("slow@example.com", 5, hour));
}

#[test]
fn test_zero_window_policy_rejected() {
    assert!(RateLimitPolicy::new(5, Duration::ZERO).is_err());
}

#[test]
fn test_clones_share_state() {
    let (limiter, _) = limiter();
    let other = limiter.clone();
    for _ in 0..5 {
        limiter.check("k");
    }
    assert!(!other.check("k"));
}
