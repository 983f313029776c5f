//! Configuration validation rules.
//!
//! This module provides validation logic for `AppConfig` values
//! after they have been loaded from environment, files, or defaults.

use crate::config::AppConfig;
use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },

    #[error("missing required configuration: {field} ({hint})")]
    Missing { field: String, hint: String },
}

impl From<ConfigError> for crate::Error {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Missing { .. } => crate::Error::NotConfigured(err.to_string()),
            _ => crate::Error::InvalidInput(err.to_string()),
        }
    }
}

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `poll_interval_ms` is outside 50ms..=10s
    /// - `run_timeout_ms` is outside 1s..=10min
    /// - `max_validation_attempts` is outside 1..=20
    /// - `discovery_top_n` is outside 1..=50
    /// - `user_agent` is empty
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.poll_interval_ms < 50 {
            return Err(ConfigError::Invalid {
                field: "poll_interval_ms".into(),
                reason: "must be at least 50ms".into(),
            });
        }
        if self.poll_interval_ms > 10_000 {
            return Err(ConfigError::Invalid {
                field: "poll_interval_ms".into(),
                reason: "must not exceed 10 seconds (10000ms)".into(),
            });
        }

        if self.run_timeout_ms < 1_000 {
            return Err(ConfigError::Invalid { field: "run_timeout_ms".into(), reason: "must be at least 1s".into() });
        }
        if self.run_timeout_ms > 600_000 {
            return Err(ConfigError::Invalid {
                field: "run_timeout_ms".into(),
                reason: "must not exceed 10 minutes (600000ms)".into(),
            });
        }

        if !(1..=20).contains(&self.max_validation_attempts) {
            return Err(ConfigError::Invalid {
                field: "max_validation_attempts".into(),
                reason: "must be between 1 and 20".into(),
            });
        }

        if !(1..=50).contains(&self.discovery_top_n) {
            return Err(ConfigError::Invalid {
                field: "discovery_top_n".into(),
                reason: "must be between 1 and 50".into(),
            });
        }

        if self.user_agent.is_empty() {
            return Err(ConfigError::Invalid { field: "user_agent".into(), reason: "must not be empty".into() });
        }

        if self.poll_interval_ms >= self.run_timeout_ms {
            tracing::warn!(
                poll_interval_ms = self.poll_interval_ms,
                run_timeout_ms = self.run_timeout_ms,
                "poll interval is not shorter than the run timeout; runs get a single status check"
            );
        }

        Ok(())
    }
}
