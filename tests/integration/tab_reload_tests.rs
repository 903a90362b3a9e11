// =====================================
// tests/integration/tab_reload_tests.rs
// =====================================
//! A reloaded tab continues the session it had before
use guard_lib::clock::ManualClock;
use guard_lib::config::Settings;
use guard_lib::storage::{FlatFileStore, TabStore};
use guard_lib::GuardContext;
use std::sync::Arc;
use std::time::Duration;
use tempfile::tempdir;

use crate::test_utils::START_MS;

fn open_tab(dir: &std::path::Path, clock: &ManualClock) -> GuardContext {
    let store: Arc<dyn TabStore> = Arc::new(FlatFileStore::open(dir).unwrap());
    GuardContext::new(Settings::default(), store, Arc::new(clock.clone())).unwrap()
}

#[test]
fn test_reload_keeps_session_and_token() {
    let dir = tempdir().unwrap();
    let clock = ManualClock::new(START_MS);

    let tab = open_tab(dir.path(), &clock);
    let session_id = tab.begin_session();
    let token = tab.csrf.get_token();
    drop(tab);

    clock.advance(Duration::from_secs(10 * 60));
    let reloaded = open_tab(dir.path(), &clock);
    assert_eq!(reloaded.session.session_id(), Some(session_id));
    assert!(reloaded.session.is_valid());
    assert_eq!(reloaded.session.remaining(), Duration::from_secs(20 * 60));
    assert!(reloaded.csrf.validate_token(&token));
}

#[test]
fn test_reload_continues_inactivity_clock() {
    let dir = tempdir().unwrap();
    let clock = ManualClock::new(START_MS);

    let tab = open_tab(dir.path(), &clock);
    tab.begin_session();
    clock.advance(Duration::from_secs(5 * 60));
    tab.session.touch();
    drop(tab);

    // Idle long enough to expire counting from the last touch
    clock.advance(Duration::from_secs(30 * 60));
    let reloaded = open_tab(dir.path(), &clock);
    assert!(!reloaded.session.is_valid());
}

#[test]
fn test_reload_loses_at_most_one_persist_interval() {
    let dir = tempdir().unwrap();
    let clock = ManualClock::new(START_MS);

    let tab = open_tab(dir.path(), &clock);
    tab.begin_session();
    clock.advance(Duration::from_millis(1500));
    tab.session.touch();
    // Inside the persist interval, so only held in memory
    clock.advance(Duration::from_millis(300));
    tab.session.touch();
    assert_eq!(tab.session.last_activity_ms(), Some(START_MS + 1800));
    drop(tab);

    let reloaded = open_tab(dir.path(), &clock);
    let restored = reloaded.session.last_activity_ms().unwrap();
    assert_eq!(restored, START_MS + 1500);
    let persist_interval = Settings::default().session.persist_interval_ms;
    assert!(START_MS + 1800 - restored < persist_interval);
    // The restored session counts idle time from the older timestamp
    assert_eq!(
        reloaded.session.remaining(),
        Duration::from_millis(30 * 60 * 1000 - 300)
    );
}

#[test]
fn test_reload_after_logout_has_no_session() {
    let dir = tempdir().unwrap();
    let clock = ManualClock::new(START_MS);

    let tab = open_tab(dir.path(), &clock);
    tab.begin_session();
    let token = tab.csrf.get_token();
    tab.end_session();
    drop(tab);

    let reloaded = open_tab(dir.path(), &clock);
    assert_eq!(reloaded.session.session_id(), None);
    assert!(!reloaded.csrf.validate_token(&token));
}

#[test]
fn test_attempt_history_is_per_tab_instance() {
    let dir = tempdir().unwrap();
    let clock = ManualClock::new(START_MS);

    let tab = open_tab(dir.path(), &clock);
    for _ in 0..5 {
        tab.login_limiter.check("k@example.com");
    }
    assert!(!tab.login_limiter.check("k@example.com"));

    // Attempt history lives in memory only
    let reloaded = open_tab(dir.path(), &clock);
    assert!(reloaded.login_limiter.check("k@example.com"));
}
