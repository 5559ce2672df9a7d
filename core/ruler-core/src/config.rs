//! Runtime configuration.
//!
//! Loaded from TOML. Every key is optional:
//!
//! ```toml
//! password = "youaskedforit"
//! lock_hour = 19                 # 24-hour clock, local time
//! lock_minute = 55
//! poll_interval_secs = 5
//! keep_on_top_interval_ms = 500
//! ```

use chrono::{NaiveDateTime, Timelike};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::error::{Result, RulerError};

const DEFAULT_PASSWORD: &str = "youaskedforit";
const DEFAULT_LOCK_HOUR: u32 = 19;
const DEFAULT_LOCK_MINUTE: u32 = 55;
const DEFAULT_POLL_INTERVAL_SECS: u64 = 5;
const DEFAULT_KEEP_ON_TOP_INTERVAL_MS: u64 = 500;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RulerConfig {
    #[serde(default = "default_password")]
    pub password: String,
    #[serde(default = "default_lock_hour")]
    pub lock_hour: u32,
    #[serde(default = "default_lock_minute")]
    pub lock_minute: u32,
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    #[serde(default = "default_keep_on_top_interval_ms")]
    pub keep_on_top_interval_ms: u64,
}

fn default_password() -> String {
    DEFAULT_PASSWORD.to_string()
}

fn default_lock_hour() -> u32 {
    DEFAULT_LOCK_HOUR
}

fn default_lock_minute() -> u32 {
    DEFAULT_LOCK_MINUTE
}

fn default_poll_interval_secs() -> u64 {
    DEFAULT_POLL_INTERVAL_SECS
}

fn default_keep_on_top_interval_ms() -> u64 {
    DEFAULT_KEEP_ON_TOP_INTERVAL_MS
}

impl Default for RulerConfig {
    fn default() -> Self {
        Self {
            password: default_password(),
            lock_hour: DEFAULT_LOCK_HOUR,
            lock_minute: DEFAULT_LOCK_MINUTE,
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
            keep_on_top_interval_ms: DEFAULT_KEEP_ON_TOP_INTERVAL_MS,
        }
    }
}

impl RulerConfig {
    /// Loads and validates the config at `path`. A missing file yields defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs_err::read_to_string(path)
            .map_err(|err| RulerError::io(format!("read config {}", path.display()), err))?;
        let config: RulerConfig =
            toml::from_str(&content).map_err(|err| RulerError::ConfigMalformed {
                path: path.to_path_buf(),
                details: err.to_string(),
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Like [`RulerConfig::load`], but falls back to defaults on any error.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(err) => {
                tracing::warn!(
                    error = %err,
                    path = %path.display(),
                    "Failed to load config; using defaults"
                );
                Self::default()
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.password.is_empty() {
            return Err(RulerError::InvalidConfig("password must not be empty".into()));
        }
        if self.lock_hour > 23 {
            return Err(RulerError::InvalidConfig(format!(
                "lock_hour must be 0-23, got {}",
                self.lock_hour
            )));
        }
        if self.lock_minute > 59 {
            return Err(RulerError::InvalidConfig(format!(
                "lock_minute must be 0-59, got {}",
                self.lock_minute
            )));
        }
        if self.poll_interval_secs == 0 {
            return Err(RulerError::InvalidConfig(
                "poll_interval_secs must be positive".into(),
            ));
        }
        if self.keep_on_top_interval_ms == 0 {
            return Err(RulerError::InvalidConfig(
                "keep_on_top_interval_ms must be positive".into(),
            ));
        }
        Ok(())
    }

    pub fn schedule(&self) -> LockSchedule {
        LockSchedule {
            hour: self.lock_hour,
            minute: self.lock_minute,
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn keep_on_top_interval(&self) -> Duration {
        Duration::from_millis(self.keep_on_top_interval_ms)
    }
}

/// The lock window: a single minute of the day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockSchedule {
    pub hour: u32,
    pub minute: u32,
}

impl LockSchedule {
    pub fn new(hour: u32, minute: u32) -> Self {
        Self { hour, minute }
    }

    /// True during the lock minute (seconds ignored).
    pub fn is_lock_minute(&self, now: NaiveDateTime) -> bool {
        now.hour() == self.hour && now.minute() == self.minute
    }

    /// True once the clock is strictly past the lock minute for today.
    pub fn has_passed(&self, now: NaiveDateTime) -> bool {
        now.hour() > self.hour || (now.hour() == self.hour && now.minute() > self.minute)
    }
}

impl std::fmt::Display for LockSchedule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}
