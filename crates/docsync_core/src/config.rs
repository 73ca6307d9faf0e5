//! Sync engine configuration.
//!
//! # Responsibility
//! - Hold tunables for cursor handling, write retry and echo detection.
//! - Load them from JSON with per-field defaults.
//!
//! # Invariants
//! - A config accepted by `validate` never produces a zero-attempt retry
//!   policy or an empty echo window.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Duration;

/// Where the cursor goes after a write settles or a remote snapshot lands.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CursorPolicy {
    /// Put back the selection captured before the update, clamped to bounds.
    #[default]
    RestoreSelection,
    /// Always move the caret to the end of the document.
    JumpToEnd,
}

/// Exponential backoff for transient write failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Total attempts including the first one.
    pub max_attempts: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
    pub multiplier: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_backoff_ms: 250,
            max_backoff_ms: 8_000,
            multiplier: 2,
        }
    }
}

impl RetryPolicy {
    /// Delay before attempt `attempt + 1`, given `attempt` has just failed.
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1);
        let factor = u64::from(self.multiplier).saturating_pow(exponent);
        let millis = self
            .initial_backoff_ms
            .saturating_mul(factor)
            .min(self.max_backoff_ms);
        Duration::from_millis(millis)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    pub cursor_policy: CursorPolicy,
    pub retry: RetryPolicy,
    /// How many of a session's own outbound snapshots are remembered for
    /// late-echo detection.
    pub outbound_history: usize,
    /// `key=value` query parameter that requests viewer access.
    pub viewer_param: String,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            cursor_policy: CursorPolicy::default(),
            retry: RetryPolicy::default(),
            outbound_history: 16,
            viewer_param: "access=viewer".to_string(),
        }
    }
}

impl SyncConfig {
    /// Parses and validates a JSON config; absent fields take defaults.
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(text).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.retry.max_attempts == 0 {
            return Err(ConfigError::Invalid("retry.max_attempts must be >= 1"));
        }
        if self.retry.multiplier == 0 {
            return Err(ConfigError::Invalid("retry.multiplier must be >= 1"));
        }
        if self.retry.initial_backoff_ms > self.retry.max_backoff_ms {
            return Err(ConfigError::Invalid(
                "retry.initial_backoff_ms must not exceed retry.max_backoff_ms",
            ));
        }
        if self.outbound_history == 0 {
            return Err(ConfigError::Invalid("outbound_history must be >= 1"));
        }
        if self.viewer_marker().is_none() {
            return Err(ConfigError::Invalid(
                "viewer_param must have the form key=value",
            ));
        }
        Ok(())
    }

    /// Splits `viewer_param` into its query key and value.
    pub fn viewer_marker(&self) -> Option<(&str, &str)> {
        let (key, value) = self.viewer_param.split_once('=')?;
        let key = key.trim();
        let value = value.trim();
        if key.is_empty() || value.is_empty() {
            return None;
        }
        Some((key, value))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    Parse(String),
    Invalid(&'static str),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Parse(message) => write!(f, "failed to parse sync config: {message}"),
            Self::Invalid(message) => write!(f, "invalid sync config: {message}"),
        }
    }
}

impl Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::{ConfigError, CursorPolicy, RetryPolicy, SyncConfig};
    use std::time::Duration;

    #[test]
    fn backoff_grows_and_caps() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff_for(1), Duration::from_millis(250));
        assert_eq!(policy.backoff_for(2), Duration::from_millis(500));
        assert_eq!(policy.backoff_for(4), Duration::from_millis(2_000));
        assert_eq!(policy.backoff_for(10), Duration::from_millis(8_000));
        assert_eq!(policy.backoff_for(u32::MAX), Duration::from_millis(8_000));
    }

    #[test]
    fn json_fills_missing_fields_with_defaults() {
        let config =
            SyncConfig::from_json_str(r#"{ "cursor_policy": "jump_to_end", "retry": { "max_attempts": 2 } }"#)
                .unwrap();
        assert_eq!(config.cursor_policy, CursorPolicy::JumpToEnd);
        assert_eq!(config.retry.max_attempts, 2);
        assert_eq!(config.retry.initial_backoff_ms, 250);
        assert_eq!(config.outbound_history, 16);
        assert_eq!(config.viewer_marker(), Some(("access", "viewer")));
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(matches!(
            SyncConfig::from_json_str(r#"{ "outbound_history": 0 }"#),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            SyncConfig::from_json_str(r#"{ "viewer_param": "viewer" }"#),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            SyncConfig::from_json_str("not json"),
            Err(ConfigError::Parse(_))
        ));
    }
}
