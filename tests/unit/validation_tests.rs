// ==============================
// tests/unit/validation_tests.rs
// ==============================
//! Form validation used by the sign-in and sign-up flows
use guard_lib::validation::{
    is_valid_uuid, password_strength, sanitize_html, sanitize_input, validate_email,
    validate_name, validate_password, validate_phone, Strength, ValidationError,
};

#[test]
fn test_email_length_limit() {
    let local = "a".repeat(64);
    let domain = format!("{}.com", "b".repeat(254 - 64 - 1 - 4));
    let longest = format!("{local}@{domain}");
    assert_eq!(longest.len(), 254);
    assert!(validate_email(&longest).is_ok());

    let too_long = format!("{local}@b{domain}");
    assert!(matches!(
        validate_email(&too_long),
        Err(ValidationError::InvalidEmail(_))
    ));
}

#[test]
fn test_phone_formats() {
    for phone in ["01012345678", "+201112345678", "0 122 345 6789", "1512345678"] {
        assert!(validate_phone(phone).is_ok(), "{phone}");
    }
    for phone in ["+2001012345678", "0101234567", "01a12345678", "+44 7700 900123"] {
        assert!(validate_phone(phone).is_err(), "{phone}");
    }
}

#[test]
fn test_name_rules() {
    assert!(validate_name("Lee").is_ok());
    assert!(validate_name("Nour El-Din").is_ok());
    assert!(validate_name("Jo3").is_err());
    assert!(matches!(
        validate_name("<b>Ann</b>"),
        Err(ValidationError::InvalidName(_))
    ));
}

#[test]
fn test_password_strength_ladder() {
    let cases = [
        ("", Strength::VeryWeak),
        ("a", Strength::Weak),
        ("aB", Strength::Medium),
        ("aB1", Strength::Strong),
        ("aB1!", Strength::VeryStrong),
        ("Password12345!", Strength::VeryStrong),
    ];
    for (password, expected) in cases {
        assert_eq!(password_strength(password).strength, expected, "{password:?}");
    }
}

#[test]
fn test_password_issues_listed() {
    let report = password_strength("PASSWORD");
    assert!(!report.is_valid);
    assert_eq!(
        report.issues,
        vec![
            "Add at least one lowercase letter".to_string(),
            "Add at least one number".to_string(),
        ]
    );

    let err = validate_password("short1A").unwrap_err();
    assert!(err.to_string().contains("at least 8 characters"));
}

#[test]
fn test_strength_is_ordered() {
    assert!(Strength::VeryWeak < Strength::Weak);
    assert!(Strength::Strong < Strength::VeryStrong);
    assert_eq!(
        serde_json::to_value(Strength::VeryStrong).unwrap(),
        "very_strong"
    );
}

#[test]
fn test_uuid_check() {
    assert!(is_valid_uuid("123e4567-e89b-12d3-a456-426614174000"));
    assert!(!is_valid_uuid("123e4567-e89b-12d3-a456-42661417400"));
    assert!(!is_valid_uuid(" 123e4567-e89b-12d3-a456-426614174000"));
}

#[test]
fn test_sanitizers() {
    assert_eq!(sanitize_input("O'Brien"), "O''Brien");
    assert_eq!(sanitize_input(r"C:\temp"), r"C:\\temp");
    assert_eq!(sanitize_html("a & b"), "a &amp; b");
    assert_eq!(
        sanitize_html(r#"<img src="x">"#),
        "&lt;img src=&quot;x&quot;&gt;"
    );
}

#[test]
fn test_sanitize_html_cannot_break_out_of_attribute() {
    let hostile = r#"x" onmouseover="alert(1)"#;
    let attribute = format!(r#"<a title="{}">"#, sanitize_html(hostile));
    assert_eq!(attribute.matches('"').count(), 2);

    let single = format!("<a title='{}'>", sanitize_html("it's"));
    assert_eq!(single, "<a title='it&#x27;s'>");
}
