// ============================
// crates/guard-lib/src/validation/mod.rs
// ============================
//! Input validation and sanitisation for sign-up and profile forms.

use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::sync::LazyLock;
use thiserror::Error;

// Common validation constants
const MIN_PASSWORD_LENGTH: usize = 8;
const STRONG_PASSWORD_LENGTH: usize = 12;
const MAX_EMAIL_LENGTH: usize = 254; // RFC 5321 SMTP limit

/// Characters that count as "special" in a password
const SPECIAL_CHARS: &str = r#"!@#$%^&*()_+-=[]{};':"\|,.<>/?"#;

// Regex patterns for validation
static EMAIL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap());
// Egyptian mobile numbers: 01xxxxxxxxx, +201xxxxxxxxx or 1xxxxxxxxx
static PHONE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:\+20|0)?1[0-9]{9}$").unwrap());
// Arabic or Latin letters, spaces and hyphens
static NAME_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\x{0600}-\x{06FF}A-Za-z\s-]{3,100}$").unwrap());
static UUID_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}$").unwrap()
});

/// Possible validation errors
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Invalid email: {0}")]
    InvalidEmail(String),

    #[error("Invalid phone number: {0}")]
    InvalidPhone(String),

    #[error("Invalid name: {0}")]
    InvalidName(String),

    #[error("Invalid password: {0}")]
    InvalidPassword(String),
}

/// Result type for validation operations
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Validate an email address
pub fn validate_email(email: &str) -> ValidationResult<&str> {
    if email.is_empty() {
        return Err(ValidationError::InvalidEmail(
            "Email address cannot be empty".to_string(),
        ));
    }

    if email.len() > MAX_EMAIL_LENGTH {
        return Err(ValidationError::InvalidEmail(format!(
            "Email address cannot exceed {MAX_EMAIL_LENGTH} characters"
        )));
    }

    if !EMAIL_REGEX.is_match(email) {
        return Err(ValidationError::InvalidEmail(
            "Invalid email address format".to_string(),
        ));
    }

    Ok(email)
}

/// Validate an Egyptian mobile number, returning it without whitespace
pub fn validate_phone(phone: &str) -> ValidationResult<String> {
    let cleaned: String = phone.chars().filter(|c| !c.is_whitespace()).collect();

    if !PHONE_REGEX.is_match(&cleaned) {
        return Err(ValidationError::InvalidPhone(
            "Expected a mobile number like 01xxxxxxxxx or +201xxxxxxxxx".to_string(),
        ));
    }

    Ok(cleaned)
}

/// Validate a display name
pub fn validate_name(name: &str) -> ValidationResult<&str> {
    if !NAME_REGEX.is_match(name) {
        return Err(ValidationError::InvalidName(
            "Name must be 3 to 100 letters, spaces or hyphens".to_string(),
        ));
    }

    Ok(name)
}

/// Whether `id` is a hyphenated UUID
pub fn is_valid_uuid(id: &str) -> bool {
    UUID_REGEX.is_match(id)
}

/// Strength label of a password
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Strength {
    VeryWeak,
    Weak,
    Medium,
    Strong,
    VeryStrong,
}

impl Strength {
    fn from_score(score: u8) -> Self {
        match score {
            0 => Strength::VeryWeak,
            1 => Strength::Weak,
            2 => Strength::Medium,
            3 => Strength::Strong,
            _ => Strength::VeryStrong,
        }
    }
}

impl fmt::Display for Strength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Strength::VeryWeak => "very weak",
            Strength::Weak => "weak",
            Strength::Medium => "medium",
            Strength::Strong => "strong",
            Strength::VeryStrong => "very strong",
        };
        f.write_str(label)
    }
}

/// Outcome of a password strength check
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PasswordReport {
    /// Meets the minimum requirements
    pub is_valid: bool,
    pub strength: Strength,
    /// What is missing, in display order
    pub issues: Vec<String>,
}

fn has_special(password: &str) -> bool {
    password.chars().any(|c| SPECIAL_CHARS.contains(c))
}

/// Score a password and list what it is missing.
///
/// Valid passwords have at least 8 characters, an uppercase letter, a
/// lowercase letter and a digit. Special characters only raise the score.
pub fn password_strength(password: &str) -> PasswordReport {
    let length = password.chars().count();
    let has_upper = password.chars().any(|c| c.is_ascii_uppercase());
    let has_lower = password.chars().any(|c| c.is_ascii_lowercase());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());

    let score = [
        length >= MIN_PASSWORD_LENGTH,
        length >= STRONG_PASSWORD_LENGTH,
        has_upper,
        has_lower,
        has_digit,
        has_special(password),
    ]
    .iter()
    .filter(|&&met| met)
    .count();

    let mut issues = Vec::new();
    if length < MIN_PASSWORD_LENGTH {
        issues.push(format!("Must be at least {MIN_PASSWORD_LENGTH} characters"));
    }
    if !has_upper {
        issues.push("Add at least one uppercase letter".to_string());
    }
    if !has_lower {
        issues.push("Add at least one lowercase letter".to_string());
    }
    if !has_digit {
        issues.push("Add at least one number".to_string());
    }

    PasswordReport {
        is_valid: issues.is_empty(),
        strength: Strength::from_score(u8::try_from(score).unwrap_or(u8::MAX)),
        issues,
    }
}

/// Validate a password against the minimum requirements
pub fn validate_password(password: &str) -> ValidationResult<&str> {
    let report = password_strength(password);
    if !report.is_valid {
        return Err(ValidationError::InvalidPassword(report.issues.join("; ")));
    }
    Ok(password)
}

/// Escape quotes and backslashes for inclusion in a quoted SQL literal
pub fn sanitize_input(input: &str) -> String {
    input
        .replace('\'', "''")
        .replace('"', "\"\"")
        .replace('\\', "\\\\")
        .trim()
        .to_string()
}

/// Escape text for inclusion in HTML.
///
/// Quotes are escaped too, so the result is safe inside a quoted attribute
/// value as well as in element content.
pub fn sanitize_html(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}
