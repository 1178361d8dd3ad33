//! Serde-friendly retry configuration (requires the `serde` feature).
//!
//! [`RetryConfig`] is the shape a retry policy takes in a config file or an
//! environment-driven settings struct. Every field has a default, so an empty
//! table yields the standard policy: 5 attempts, 2000 ms apart.
//!
//! # Example
//!
//! ```rust
//! use persevere::{RetryConfig, RetryPolicy};
//! use std::time::Duration;
//!
//! let config: RetryConfig = serde_json::from_str(
//!     r#"{ "max_attempts": 3, "delay_ms": 250, "strategy": "exponential" }"#,
//! )
//! .unwrap();
//!
//! let policy = RetryPolicy::try_from(config).unwrap();
//! assert_eq!(policy.max_attempts(), 3);
//! assert_eq!(policy.delay_before_retry(2), Some(Duration::from_millis(500)));
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::retry::{PolicyError, RetryPolicy, DEFAULT_DELAY, DEFAULT_MAX_ATTEMPTS};

/// Delay schedule names accepted in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyKind {
    /// Same delay before every retry.
    #[default]
    Constant,
    /// Delay grows by `delay_ms` each retry.
    Linear,
    /// Delay doubles each retry.
    Exponential,
}

/// Retry settings as they appear in configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RetryConfig {
    /// Total attempts, including the first. Must be at least 1.
    pub max_attempts: u32,
    /// Base delay in milliseconds.
    pub delay_ms: u64,
    /// How the delay evolves between retries.
    pub strategy: StrategyKind,
    /// Optional cap on any single delay, in milliseconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_delay_ms: Option<u64>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            delay_ms: DEFAULT_DELAY.as_millis() as u64,
            strategy: StrategyKind::Constant,
            max_delay_ms: None,
        }
    }
}

impl TryFrom<RetryConfig> for RetryPolicy {
    type Error = PolicyError;

    fn try_from(config: RetryConfig) -> Result<Self, Self::Error> {
        if config.max_attempts == 0 {
            return Err(PolicyError::ZeroAttempts);
        }

        let delay = Duration::from_millis(config.delay_ms);
        let mut policy = match config.strategy {
            StrategyKind::Constant => RetryPolicy::constant(delay),
            StrategyKind::Linear => RetryPolicy::linear(delay),
            StrategyKind::Exponential => RetryPolicy::exponential(delay),
        }
        .with_max_attempts(config.max_attempts);

        if let Some(max_ms) = config.max_delay_ms {
            policy = policy.with_max_delay(Duration::from_millis(max_ms));
        }

        policy.validate()?;
        Ok(policy)
    }
}
