// ===========================
// tests/unit/session_tests.rs
// ===========================
//! Phase transitions of `SessionLifecycle`
use guard_lib::auth::{SessionLifecycle, SessionPhase, SessionPolicy};
use guard_lib::clock::ManualClock;
use guard_lib::error::GuardError;
use guard_lib::storage::{keys, MemoryStore, TabStore};
use std::sync::Arc;
use std::time::Duration;

use crate::test_utils::START_MS;

const MINUTE: Duration = Duration::from_secs(60);

fn lifecycle() -> (SessionLifecycle, Arc<MemoryStore>, ManualClock) {
    let clock = ManualClock::new(START_MS);
    let store = Arc::new(MemoryStore::new());
    let session = SessionLifecycle::new(
        SessionPolicy::default(),
        store.clone(),
        Arc::new(clock.clone()),
    );
    (session, store, clock)
}

#[test]
fn test_no_session_is_expired() {
    let (session, _, _) = lifecycle();
    assert_eq!(session.phase(), SessionPhase::Expired);
    assert!(!session.is_valid());
    assert!(!session.should_warn());
    assert_eq!(session.remaining(), Duration::ZERO);
    assert_eq!(session.session_id(), None);
}

#[test]
fn test_phase_boundaries() {
    let (session, _, clock) = lifecycle();
    session.begin();

    // 24:59 idle
    clock.advance(24 * MINUTE + Duration::from_secs(59));
    assert_eq!(session.phase(), SessionPhase::Active);

    // 25:00 idle: warning starts
    clock.advance(Duration::from_secs(1));
    assert!(session.is_valid());
    assert!(session.should_warn());
    assert_eq!(session.remaining(), 5 * MINUTE);

    // 29:59.999 idle: still valid
    clock.advance(5 * MINUTE - Duration::from_millis(1));
    assert!(session.is_valid());

    // 30:00 idle: expired
    clock.advance(Duration::from_millis(1));
    assert!(!session.is_valid());
    assert!(!session.should_warn());
    assert_eq!(session.remaining(), Duration::ZERO);
}

#[test]
fn test_touch_keeps_session_alive() {
    let (session, _, clock) = lifecycle();
    session.begin();

    for _ in 0..10 {
        clock.advance(20 * MINUTE);
        session.touch();
        assert!(session.is_valid());
        assert!(!session.should_warn());
    }
}

#[test]
fn test_touch_during_warning_returns_to_active() {
    let (session, _, clock) = lifecycle();
    session.begin();

    clock.advance(27 * MINUTE);
    assert!(session.should_warn());
    session.touch();
    assert_eq!(session.phase(), SessionPhase::Active);
}

#[test]
fn test_expired_session_is_not_revived() {
    let (session, _, clock) = lifecycle();
    let id = session.begin();

    clock.advance(31 * MINUTE);
    session.touch();
    assert!(!session.is_valid());
    assert_eq!(session.session_id(), Some(id));

    // Only an explicit begin starts over
    let fresh = session.begin();
    assert!(session.is_valid());
    assert_eq!(session.session_id(), Some(fresh));
}

#[test]
fn test_begin_mirrors_into_store() {
    let (session, store, _) = lifecycle();
    let id = session.begin();

    assert!(id.starts_with("sess_"));
    assert_eq!(store.get(keys::SESSION_ID).unwrap(), Some(id));
    assert_eq!(
        store.get(keys::LAST_ACTIVITY).unwrap(),
        Some(START_MS.to_string())
    );
}

#[test]
fn test_end_clears_store() {
    let (session, store, _) = lifecycle();
    session.begin();
    store.set(keys::CURRENT_USER, r#"{"id":"1","name":"x"}"#).unwrap();

    session.end();
    assert!(!session.is_valid());
    assert_eq!(store.get(keys::SESSION_ID).unwrap(), None);
    assert_eq!(store.get(keys::CURRENT_USER).unwrap(), None);

    // Ending twice is harmless
    session.end();
}

#[test]
fn test_touch_writes_are_throttled() {
    let (session, store, clock) = lifecycle();
    session.begin();

    clock.advance(Duration::from_millis(300));
    session.touch();
    // Within the persist interval: memory moves, store does not
    assert_eq!(session.last_activity_ms(), Some(START_MS + 300));
    assert_eq!(
        store.get(keys::LAST_ACTIVITY).unwrap(),
        Some(START_MS.to_string())
    );

    clock.advance(Duration::from_millis(700));
    session.touch();
    assert_eq!(
        store.get(keys::LAST_ACTIVITY).unwrap(),
        Some((START_MS + 1000).to_string())
    );
}

#[test]
fn test_require_live_reports_missing_session() {
    let (session, _, clock) = lifecycle();
    let err = session.require_live().unwrap_err();
    assert!(matches!(err, GuardError::MissingSession));
    assert_eq!(err.error_code(), "SESS_001");

    let session_id = session.begin();
    assert_eq!(session.require_live().unwrap(), session_id);

    // An expired session counts as missing even though its id is still known
    clock.advance(30 * MINUTE);
    assert_eq!(session.session_id(), Some(session_id));
    assert!(matches!(
        session.require_live(),
        Err(GuardError::MissingSession)
    ));
}

#[test]
fn test_custom_policy() {
    let clock = ManualClock::new(START_MS);
    let policy = SessionPolicy::new(Duration::from_secs(10), Duration::from_secs(3)).unwrap();
    let session = SessionLifecycle::new(policy, Arc::new(MemoryStore::new()), Arc::new(clock.clone()));
    session.begin();

    clock.advance(Duration::from_secs(7));
    assert!(session.should_warn());
    clock.advance(Duration::from_secs(3));
    assert!(!session.is_valid());
}

#[test]
fn test_invalid_policies() {
    assert!(SessionPolicy::new(Duration::ZERO, Duration::ZERO).is_err());
    assert!(SessionPolicy::new(MINUTE, MINUTE).is_err());
    assert!(SessionPolicy::new(MINUTE, 2 * MINUTE).is_err());
    assert!(SessionPolicy::new(MINUTE, Duration::ZERO).is_ok());
}
