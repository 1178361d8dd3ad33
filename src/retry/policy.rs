//! Retry policy types and configuration.

use std::time::Duration;

use super::error::PolicyError;

/// Attempt budget used when none is given.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Delay between attempts used when none is given.
pub const DEFAULT_DELAY: Duration = Duration::from_millis(2000);

/// A retry policy describing how many times to attempt an operation and how
/// long to wait between attempts.
///
/// Policies are pure data. They describe retry behavior but never execute
/// it, so they can be cloned, compared and inspected freely.
///
/// `max_attempts` counts every attempt, including the first one. A policy
/// with `max_attempts == 1` runs the operation once and never waits.
///
/// # Examples
///
/// ```rust
/// use persevere::RetryPolicy;
/// use std::time::Duration;
///
/// // The default: 5 attempts, 2 seconds apart
/// let policy = RetryPolicy::default();
/// assert_eq!(policy.max_attempts(), 5);
/// assert_eq!(policy.delay_before_retry(1), Some(Duration::from_secs(2)));
///
/// // Exponential backoff with a cap
/// let policy = RetryPolicy::exponential(Duration::from_millis(100))
///     .with_max_attempts(4)
///     .with_max_delay(Duration::from_millis(250));
///
/// assert_eq!(policy.delay_before_retry(1), Some(Duration::from_millis(100)));
/// assert_eq!(policy.delay_before_retry(2), Some(Duration::from_millis(200)));
/// assert_eq!(policy.delay_before_retry(3), Some(Duration::from_millis(250)));
/// assert_eq!(policy.delay_before_retry(4), None);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    strategy: RetryStrategy,
    max_attempts: u32,
    max_delay: Option<Duration>,
    jitter: JitterStrategy,
}

/// The schedule of delays between attempts.
#[derive(Debug, Clone, PartialEq)]
pub enum RetryStrategy {
    /// Fixed delay between attempts.
    Constant(Duration),
    /// Delay grows linearly: base * n for the n-th retry.
    Linear {
        /// Base delay duration.
        base: Duration,
    },
    /// Delay doubles: base * 2^(n-1) for the n-th retry.
    Exponential {
        /// Base delay duration.
        base: Duration,
    },
}

/// Strategy for adding randomness to delays.
///
/// Only takes effect with the `jitter` feature; otherwise every variant
/// leaves the delay untouched.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum JitterStrategy {
    /// No jitter applied.
    #[default]
    None,
    /// Add ±percentage randomness to delay.
    Proportional(f64),
    /// Random delay between 0 and calculated delay.
    Full,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::constant(DEFAULT_DELAY)
    }
}

impl RetryPolicy {
    /// Create a policy with constant delay between attempts.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use persevere::RetryPolicy;
    /// use std::time::Duration;
    ///
    /// let policy = RetryPolicy::constant(Duration::from_millis(500))
    ///     .with_max_attempts(3);
    ///
    /// assert_eq!(policy.delay_before_retry(1), Some(Duration::from_millis(500)));
    /// assert_eq!(policy.delay_before_retry(2), Some(Duration::from_millis(500)));
    /// assert_eq!(policy.delay_before_retry(3), None); // third attempt is the last
    /// ```
    pub fn constant(delay: Duration) -> Self {
        Self::with_strategy(RetryStrategy::Constant(delay))
    }

    /// Create a policy with linearly increasing delay.
    pub fn linear(base: Duration) -> Self {
        Self::with_strategy(RetryStrategy::Linear { base })
    }

    /// Create a policy with exponentially increasing delay.
    pub fn exponential(base: Duration) -> Self {
        Self::with_strategy(RetryStrategy::Exponential { base })
    }

    fn with_strategy(strategy: RetryStrategy) -> Self {
        Self {
            strategy,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            max_delay: None,
            jitter: JitterStrategy::None,
        }
    }

    /// Create a constant-delay policy, rejecting an empty attempt budget.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use persevere::{PolicyError, RetryPolicy};
    /// use std::time::Duration;
    ///
    /// let policy = RetryPolicy::fixed(3, Duration::from_millis(10)).unwrap();
    /// assert_eq!(policy.max_attempts(), 3);
    ///
    /// assert_eq!(
    ///     RetryPolicy::fixed(0, Duration::from_millis(10)),
    ///     Err(PolicyError::ZeroAttempts)
    /// );
    /// ```
    pub fn fixed(max_attempts: u32, delay: Duration) -> Result<Self, PolicyError> {
        if max_attempts == 0 {
            return Err(PolicyError::ZeroAttempts);
        }
        Ok(Self::constant(delay).with_max_attempts(max_attempts))
    }

    /// Set the total number of attempts, including the first one.
    ///
    /// Values below 1 are raised to 1: an operation is always attempted at
    /// least once.
    pub fn with_max_attempts(mut self, n: u32) -> Self {
        self.max_attempts = n.max(1);
        self
    }

    /// Cap every computed delay at `d`.
    pub fn with_max_delay(mut self, d: Duration) -> Self {
        self.max_delay = Some(d);
        self
    }

    /// Add proportional jitter to delays.
    ///
    /// `0.25` means the actual delay lands within ±25% of the computed one.
    /// The factor is clamped to `[0, 1]`. Requires the `jitter` feature to
    /// have any effect.
    pub fn with_jitter(mut self, factor: f64) -> Self {
        self.jitter = JitterStrategy::Proportional(factor.clamp(0.0, 1.0));
        self
    }

    /// Use full jitter: a random delay between zero and the computed delay.
    ///
    /// Requires the `jitter` feature to have any effect.
    pub fn with_full_jitter(mut self) -> Self {
        self.jitter = JitterStrategy::Full;
        self
    }

    /// Total attempts allowed, including the first.
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Get the maximum delay cap.
    pub fn max_delay(&self) -> Option<Duration> {
        self.max_delay
    }

    /// Get the jitter strategy.
    pub fn jitter(&self) -> &JitterStrategy {
        &self.jitter
    }

    /// Get the delay strategy.
    pub fn strategy(&self) -> &RetryStrategy {
        &self.strategy
    }

    /// Delay to wait before the `retry`-th retry (1-based), without jitter.
    ///
    /// Retry `n` is attempt `n + 1`, so this returns `None` once `retry`
    /// reaches `max_attempts`: there is no attempt left to wait for.
    pub fn delay_before_retry(&self, retry: u32) -> Option<Duration> {
        if retry == 0 || retry >= self.max_attempts {
            return None;
        }

        let base_delay = match &self.strategy {
            RetryStrategy::Constant(d) => *d,
            RetryStrategy::Linear { base } => base.saturating_mul(retry),
            RetryStrategy::Exponential { base } => {
                base.saturating_mul(2u32.saturating_pow(retry - 1))
            }
        };

        Some(self.cap(base_delay))
    }

    /// Delay before the `retry`-th retry with jitter applied.
    ///
    /// This is what the executor sleeps for.
    pub fn jittered_delay_before_retry(&self, retry: u32) -> Option<Duration> {
        let base_delay = self.delay_before_retry(retry)?;
        Some(self.cap(self.jitter.apply(base_delay)))
    }

    /// Check the policy's invariants.
    pub fn validate(&self) -> Result<(), PolicyError> {
        if self.max_attempts == 0 {
            return Err(PolicyError::ZeroAttempts);
        }
        if let Some(max) = self.max_delay {
            let base = self.strategy.base();
            if max < base {
                return Err(PolicyError::MaxDelayBelowBase { base, max });
            }
        }
        Ok(())
    }

    fn cap(&self, delay: Duration) -> Duration {
        match self.max_delay {
            Some(max) => delay.min(max),
            None => delay,
        }
    }
}

impl RetryStrategy {
    /// The delay before the first retry.
    pub fn base(&self) -> Duration {
        match self {
            RetryStrategy::Constant(d) => *d,
            RetryStrategy::Linear { base } | RetryStrategy::Exponential { base } => *base,
        }
    }
}

impl JitterStrategy {
    /// Apply jitter to a computed delay.
    pub fn apply(&self, base_delay: Duration) -> Duration {
        match self {
            JitterStrategy::None => base_delay,
            #[cfg(feature = "jitter")]
            JitterStrategy::Proportional(factor) => {
                use rand::Rng;
                let base_secs = base_delay.as_secs_f64();
                let jitter_range = base_secs * factor;
                let min = (base_secs - jitter_range).max(0.0);
                let max = base_secs + jitter_range;
                if max <= min {
                    return base_delay;
                }
                let jittered = rand::rng().random_range(min..=max);
                Duration::try_from_secs_f64(jittered).unwrap_or(Duration::MAX)
            }
            #[cfg(not(feature = "jitter"))]
            JitterStrategy::Proportional(_) => base_delay,
            #[cfg(feature = "jitter")]
            JitterStrategy::Full => {
                use rand::Rng;
                let max_secs = base_delay.as_secs_f64();
                if max_secs == 0.0 {
                    Duration::ZERO
                } else {
                    let jittered = rand::rng().random_range(0.0..=max_secs);
                    Duration::try_from_secs_f64(jittered)
                        .map_or(base_delay, |d| d.min(base_delay))
                }
            }
            #[cfg(not(feature = "jitter"))]
            JitterStrategy::Full => base_delay,
        }
    }
}
