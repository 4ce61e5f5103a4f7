// Validator configuration

use serde::{Deserialize, Serialize};
use std::env;

/// Environment variable overriding [`ValidatorConfig::failure_status`]
pub const ENV_FAILURE_STATUS: &str = "PARAPET_FAILURE_STATUS";
/// Environment variable overriding [`ValidatorConfig::error_key`]
pub const ENV_ERROR_KEY: &str = "PARAPET_ERROR_KEY";
/// Environment variable overriding [`ValidatorConfig::log_failures`]
pub const ENV_LOG_FAILURES: &str = "PARAPET_LOG_FAILURES";

/// Settings for the default error formatter and request-time logging.
///
/// Can be embedded in an application's own TOML/JSON configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidatorConfig {
    /// Status returned for failed validation
    pub failure_status: u16,
    /// Key of the message in the default error body
    pub error_key: String,
    /// Emit a debug event for each failed request
    pub log_failures: bool,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            failure_status: 400,
            error_key: "error".to_string(),
            log_failures: true,
        }
    }
}

impl ValidatorConfig {
    /// Load configuration from `PARAPET_*` environment variables, falling
    /// back to defaults for anything unset or unparsable.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let failure_status = lookup(ENV_FAILURE_STATUS)
            .and_then(|v| v.trim().parse::<u16>().ok())
            .filter(|status| (400..600).contains(status))
            .unwrap_or(defaults.failure_status);

        let error_key = lookup(ENV_ERROR_KEY)
            .filter(|v| !v.trim().is_empty())
            .unwrap_or(defaults.error_key);

        let log_failures = lookup(ENV_LOG_FAILURES)
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(defaults.log_failures);

        Self {
            failure_status,
            error_key,
            log_failures,
        }
    }

    /// Set the failure status
    pub fn with_failure_status(mut self, status: u16) -> Self {
        self.failure_status = status;
        self
    }

    /// Set the error body key
    pub fn with_error_key(mut self, key: impl Into<String>) -> Self {
        self.error_key = key.into();
        self
    }

    /// Enable or disable failure logging
    pub fn with_log_failures(mut self, enabled: bool) -> Self {
        self.log_failures = enabled;
        self
    }
}
