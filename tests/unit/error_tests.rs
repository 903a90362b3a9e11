// =========================
// tests/unit/error_tests.rs
// =========================
//! Unit tests for the error module
use guard_lib::error::GuardError;
use guard_lib::storage::StoreError;

#[test]
fn test_error_codes_are_distinct() {
    let errors = [
        GuardError::Configuration("bad".to_string()),
        GuardError::MissingSession,
        GuardError::TransientStore(StoreError::Unavailable("x".to_string())),
        GuardError::LogoutFailed("x".to_string()),
    ];

    let mut codes: Vec<_> = errors.iter().map(GuardError::error_code).collect();
    codes.sort_unstable();
    codes.dedup();
    assert_eq!(codes.len(), errors.len());
}

#[test]
fn test_sanitized_messages_hide_details() {
    let secret = "token=eyJhbGciOi at /home/alice/.cache";
    let errors = [
        GuardError::Configuration(secret.to_string()),
        GuardError::TransientStore(StoreError::Unavailable(secret.to_string())),
        GuardError::LogoutFailed(secret.to_string()),
    ];

    for err in errors {
        assert!(err.to_string().contains(secret));
        assert!(!err.sanitized_message().contains(secret));
        assert!(!err.sanitized_message().is_empty());
    }
}

#[test]
fn test_store_errors_convert_and_recover() {
    let err: GuardError = StoreError::Full { used: 5_300_000, limit: 5_242_880 }.into();
    assert_eq!(err.error_code(), "STORE_001");
    assert!(err.is_recoverable());
}

#[test]
fn test_missing_session_prompts_sign_in() {
    assert_eq!(
        GuardError::MissingSession.sanitized_message(),
        "Please sign in to continue"
    );
}
