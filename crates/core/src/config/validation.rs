//! Configuration validation rules.
//!
//! This module provides validation logic for `AppConfig` values
//! after they have been loaded from environment, files, or defaults.

use crate::config::{AppConfig, MAX_WINDOW_SECS};
use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },
}

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `max_bytes` is 0 or exceeds 50MB
    /// - `timeout_ms` is less than 100ms or exceeds 5 minutes
    /// - `user_agent` or `bind_addr` is empty
    /// - `freshness_secs` is 0
    /// - any cache window exceeds one year
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_bytes == 0 {
            return Err(ConfigError::Invalid { field: "max_bytes".into(), reason: "must be greater than 0".into() });
        }
        if self.max_bytes > 50 * 1024 * 1024 {
            return Err(ConfigError::Invalid { field: "max_bytes".into(), reason: "must not exceed 50MB".into() });
        }

        if self.timeout_ms < 100 {
            return Err(ConfigError::Invalid { field: "timeout_ms".into(), reason: "must be at least 100ms".into() });
        }
        if self.timeout_ms > 300_000 {
            return Err(ConfigError::Invalid {
                field: "timeout_ms".into(),
                reason: "must not exceed 5 minutes (300000ms)".into(),
            });
        }

        if self.user_agent.is_empty() {
            return Err(ConfigError::Invalid { field: "user_agent".into(), reason: "must not be empty".into() });
        }

        if self.bind_addr.trim().is_empty() {
            return Err(ConfigError::Invalid { field: "bind_addr".into(), reason: "must not be empty".into() });
        }

        if self.freshness_secs == 0 {
            return Err(ConfigError::Invalid {
                field: "freshness_secs".into(),
                reason: "must be greater than 0".into(),
            });
        }

        for (field, value) in [
            ("freshness_secs", self.freshness_secs),
            ("rate_limit_secs", self.rate_limit_secs),
            ("memo_secs", self.memo_secs),
        ] {
            if value > MAX_WINDOW_SECS {
                return Err(ConfigError::Invalid { field: field.into(), reason: "must not exceed one year".into() });
            }
        }

        if self.memo_secs > self.freshness_secs {
            tracing::warn!(
                memo_secs = self.memo_secs,
                freshness_secs = self.freshness_secs,
                "memo_secs exceeds freshness_secs; feeds may be served older than the freshness window"
            );
        }

        if self.rate_limit_secs > self.freshness_secs {
            tracing::warn!(
                rate_limit_secs = self.rate_limit_secs,
                freshness_secs = self.freshness_secs,
                "rate_limit_secs exceeds freshness_secs; refreshes may reuse responses older than the freshness window"
            );
        }

        Ok(())
    }
}
