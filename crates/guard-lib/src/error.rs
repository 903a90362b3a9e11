// crates/guard-lib/src/error.rs

//! Central error type.
use crate::storage::StoreError;
use thiserror::Error;

/// Guard error types with error codes and context
#[derive(Error, Debug)]
pub enum GuardError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("No session has been established")]
    MissingSession,

    #[error("Tab store error: {0}")]
    TransientStore(#[from] StoreError),

    #[error("Forced logout failed: {0}")]
    LogoutFailed(String),
}

impl GuardError {
    /// Whether the subsystem can carry on after this error
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, GuardError::Configuration(_))
    }

    /// Get the error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            GuardError::Configuration(_) => "CFG_001",
            GuardError::MissingSession => "SESS_001",
            GuardError::TransientStore(_) => "STORE_001",
            GuardError::LogoutFailed(_) => "AUTH_004",
        }
    }

    /// Get a message suitable for showing to the user
    pub fn sanitized_message(&self) -> String {
        match self {
            GuardError::Configuration(_) => "The application is misconfigured".to_string(),
            GuardError::MissingSession => "Please sign in to continue".to_string(),
            GuardError::TransientStore(_) => {
                "Session data could not be saved in this browser".to_string()
            },
            GuardError::LogoutFailed(_) => {
                "Your session expired but sign-out did not complete, please reload the page"
                    .to_string()
            },
        }
    }
}

impl From<figment::Error> for GuardError {
    fn from(err: figment::Error) -> Self {
        GuardError::Configuration(err.to_string())
    }
}
