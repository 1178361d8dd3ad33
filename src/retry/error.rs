//! Error types for retry operations.

use std::time::Duration;

/// Error returned when a retried operation did not succeed.
///
/// Only the error of the last attempt is kept. Errors from earlier attempts
/// are handed to the observer and then dropped.
///
/// # Examples
///
/// ```rust
/// use persevere::{RetryError, RetryExecutor, RetryPolicy};
/// use std::time::Duration;
///
/// # tokio_test::block_on(async {
/// let executor = RetryExecutor::new(
///     RetryPolicy::constant(Duration::from_millis(1)).with_max_attempts(3),
/// );
///
/// match executor.run(|| async { Err::<(), _>("always fails") }).await {
///     Err(RetryError::Exhausted { error, attempts, .. }) => {
///         assert_eq!(error, "always fails");
///         assert_eq!(attempts, 3);
///     }
///     other => panic!("Expected exhaustion, got {:?}", other),
/// }
/// # });
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryError<E> {
    /// Every allowed attempt failed.
    Exhausted {
        /// The error from the final attempt.
        error: E,
        /// Total number of attempts made.
        attempts: u32,
        /// Time from the first attempt until giving up.
        elapsed: Duration,
    },
    /// The retry predicate classified the error as permanent.
    Aborted {
        /// The rejected error.
        error: E,
        /// The attempt (1-based) that produced it.
        attempt: u32,
        /// Time from the first attempt until giving up.
        elapsed: Duration,
    },
}

impl<E> RetryError<E> {
    /// Extract the last error, discarding metadata.
    pub fn into_error(self) -> E {
        match self {
            Self::Exhausted { error, .. } | Self::Aborted { error, .. } => error,
        }
    }

    /// Get a reference to the last error.
    pub fn error(&self) -> &E {
        match self {
            Self::Exhausted { error, .. } | Self::Aborted { error, .. } => error,
        }
    }

    /// Number of attempts made before giving up.
    pub fn attempts(&self) -> u32 {
        match self {
            Self::Exhausted { attempts, .. } => *attempts,
            Self::Aborted { attempt, .. } => *attempt,
        }
    }

    /// Time spent from the first attempt until giving up.
    pub fn elapsed(&self) -> Duration {
        match self {
            Self::Exhausted { elapsed, .. } | Self::Aborted { elapsed, .. } => *elapsed,
        }
    }

    /// Returns true if the attempt budget ran out.
    pub fn is_exhausted(&self) -> bool {
        matches!(self, Self::Exhausted { .. })
    }

    /// Returns true if the predicate stopped the retries.
    pub fn is_aborted(&self) -> bool {
        matches!(self, Self::Aborted { .. })
    }
}

impl<E: std::fmt::Display> std::fmt::Display for RetryError<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Exhausted {
                error,
                attempts,
                elapsed,
            } => write!(
                f,
                "retry exhausted after {} attempts ({:?}): {}",
                attempts, elapsed, error
            ),
            Self::Aborted { error, attempt, .. } => write!(
                f,
                "retry aborted on attempt {}, error is not retriable: {}",
                attempt, error
            ),
        }
    }
}

impl<E: std::error::Error + 'static> std::error::Error for RetryError<E> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(self.error())
    }
}

/// Error returned when an operation times out.
///
/// Produced by [`with_timeout`](crate::with_timeout). It can wrap either the
/// timeout itself or the inner error of an operation that finished in time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimeoutError<E> {
    /// The operation timed out.
    Timeout {
        /// The timeout duration that was exceeded.
        duration: Duration,
    },
    /// An inner error occurred before timeout.
    Inner(E),
}

impl<E> TimeoutError<E> {
    /// Create a timeout error.
    pub fn timeout(duration: Duration) -> Self {
        Self::Timeout { duration }
    }

    /// Create an inner error.
    pub fn inner(error: E) -> Self {
        Self::Inner(error)
    }

    /// Returns true if this is a timeout error.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// Returns true if this is an inner error.
    pub fn is_inner(&self) -> bool {
        matches!(self, Self::Inner(_))
    }

    /// Get the inner error if present.
    pub fn into_inner(self) -> Option<E> {
        match self {
            Self::Inner(e) => Some(e),
            Self::Timeout { .. } => None,
        }
    }
}

impl<E: std::fmt::Display> std::fmt::Display for TimeoutError<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Timeout { duration } => write!(f, "operation timed out after {:?}", duration),
            Self::Inner(e) => write!(f, "{}", e),
        }
    }
}

impl<E: std::error::Error + 'static> std::error::Error for TimeoutError<E> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Timeout { .. } => None,
            Self::Inner(e) => Some(e),
        }
    }
}

/// Error returned when a retry policy is malformed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PolicyError {
    /// The attempt budget was zero; at least one attempt is required.
    ZeroAttempts,
    /// The delay cap is smaller than the first delay.
    MaxDelayBelowBase {
        /// The delay before the first retry.
        base: Duration,
        /// The configured cap.
        max: Duration,
    },
}

impl std::fmt::Display for PolicyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ZeroAttempts => write!(f, "retry policy must allow at least one attempt"),
            Self::MaxDelayBelowBase { base, max } => write!(
                f,
                "retry policy max delay {:?} is below the base delay {:?}",
                max, base
            ),
        }
    }
}

impl std::error::Error for PolicyError {}
