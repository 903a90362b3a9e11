// ============================
// crates/guard-lib/src/config.rs
// ============================
//! Configuration management.
use crate::auth::{RateLimitPolicy, SessionPolicy};
use crate::error::GuardError;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default config file looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "tabguard.toml";

/// Prefix of environment overrides, e.g. `TABGUARD_SESSION__TIMEOUT_MS`
pub const ENV_PREFIX: &str = "TABGUARD_";

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Guard settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Log level
    pub log_level: String,
    /// Directory of the flat-file tab store; in-memory when absent
    pub store_dir: Option<PathBuf>,
    /// Login attempt limit
    pub login_limit: RateLimitSettings,
    /// Registration attempt limit
    pub registration_limit: RateLimitSettings,
    /// Session inactivity settings
    pub session: SessionSettings,
    /// Activity monitor settings
    pub activity: ActivitySettings,
}

/// Sliding-window limit for one purpose
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitSettings {
    /// Attempts allowed inside the window
    pub max_attempts: u32,
    /// Window length in milliseconds
    pub window_ms: u64,
}

/// Session inactivity settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    /// Inactivity after which the session expires
    pub timeout_ms: u64,
    /// How long before expiry the user gets warned
    pub warn_before_ms: u64,
    /// Minimum gap between two writes of the activity timestamp to the store
    pub persist_interval_ms: u64,
}

/// Activity monitor settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActivitySettings {
    /// Period of the liveness check
    pub check_interval_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            store_dir: None,
            login_limit: RateLimitSettings {
                max_attempts: 5,
                window_ms: 15 * 60 * 1000, // 15 minutes
            },
            registration_limit: RateLimitSettings {
                max_attempts: 3,
                window_ms: 60 * 60 * 1000, // 1 hour
            },
            session: SessionSettings::default(),
            activity: ActivitySettings::default(),
        }
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            timeout_ms: 30 * 60 * 1000,    // 30 minutes
            warn_before_ms: 5 * 60 * 1000, // 5 minutes
            persist_interval_ms: 1000,
        }
    }
}

impl Default for ActivitySettings {
    fn default() -> Self {
        Self {
            check_interval_ms: 1000,
        }
    }
}

impl RateLimitSettings {
    /// Build the limiter policy, rejecting a zero window
    pub fn policy(&self) -> Result<RateLimitPolicy, GuardError> {
        RateLimitPolicy::new(self.max_attempts, Duration::from_millis(self.window_ms))
    }
}

impl SessionSettings {
    /// Build the session policy, rejecting degenerate timeouts
    pub fn policy(&self) -> Result<SessionPolicy, GuardError> {
        Ok(SessionPolicy::new(
            Duration::from_millis(self.timeout_ms),
            Duration::from_millis(self.warn_before_ms),
        )?
        .with_persist_interval(Duration::from_millis(self.persist_interval_ms)))
    }
}

impl ActivitySettings {
    /// Liveness check period
    pub fn check_interval(&self) -> Duration {
        Duration::from_millis(self.check_interval_ms)
    }
}

impl Settings {
    /// Load settings from defaults, `tabguard.toml` and `TABGUARD_*` variables
    pub fn load() -> Result<Self, GuardError> {
        Self::load_from(DEFAULT_CONFIG_FILE)
    }

    /// Load settings from defaults, the given TOML file and `TABGUARD_*` variables
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, GuardError> {
        let settings: Settings = Figment::from(Serialized::defaults(Settings::default()))
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()?;

        settings.validate()?;
        Ok(settings)
    }

    /// Start a builder from the defaults
    pub fn builder() -> SettingsBuilder {
        SettingsBuilder::default()
    }

    /// Reject values the guard cannot run with
    pub fn validate(&self) -> Result<(), GuardError> {
        if !LOG_LEVELS.contains(&self.log_level.to_ascii_lowercase().as_str()) {
            return Err(GuardError::Configuration(format!(
                "log_level must be one of {LOG_LEVELS:?}, got {:?}",
                self.log_level
            )));
        }
        if self.activity.check_interval_ms == 0 {
            return Err(GuardError::Configuration(
                "activity.check_interval_ms must be positive".to_string(),
            ));
        }
        self.login_limit.policy()?;
        self.registration_limit.policy()?;
        self.session.policy()?;
        Ok(())
    }
}

/// Fluent builder over [`Settings`]
#[derive(Debug, Default)]
pub struct SettingsBuilder {
    settings: Settings,
}

impl SettingsBuilder {
    pub fn log_level(mut self, level: impl Into<String>) -> Self {
        self.settings.log_level = level.into();
        self
    }

    pub fn store_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.settings.store_dir = Some(dir.into());
        self
    }

    pub fn login_limit(mut self, max_attempts: u32, window_ms: u64) -> Self {
        self.settings.login_limit = RateLimitSettings {
            max_attempts,
            window_ms,
        };
        self
    }

    pub fn registration_limit(mut self, max_attempts: u32, window_ms: u64) -> Self {
        self.settings.registration_limit = RateLimitSettings {
            max_attempts,
            window_ms,
        };
        self
    }

    pub fn session_timeout(mut self, timeout_ms: u64, warn_before_ms: u64) -> Self {
        self.settings.session.timeout_ms = timeout_ms;
        self.settings.session.warn_before_ms = warn_before_ms;
        self
    }

    pub fn persist_interval(mut self, persist_interval_ms: u64) -> Self {
        self.settings.session.persist_interval_ms = persist_interval_ms;
        self
    }

    pub fn check_interval(mut self, check_interval_ms: u64) -> Self {
        self.settings.activity.check_interval_ms = check_interval_ms;
        self
    }

    /// Validate and return the settings
    pub fn build(self) -> Result<Settings, GuardError> {
        self.settings.validate()?;
        Ok(self.settings)
    }
}
