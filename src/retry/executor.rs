//! The retry loop.

use std::future::Future;

use tokio::time::Instant;

use super::error::RetryError;
use super::observer::{RetryAll, RetryEvent, RetryObserver, RetryPredicate, TracingObserver};
use super::policy::RetryPolicy;

/// Runs fallible async operations under a [`RetryPolicy`].
///
/// Each attempt calls the operation factory again, so every attempt gets a
/// fresh future. Attempts are strictly sequential: the next attempt starts
/// only after the previous one resolved and its delay elapsed. Nothing is
/// spawned, and an executor holds no mutable state, so one executor can be
/// shared by any number of concurrent invocations.
///
/// The executor does not make operations idempotent. Only hand it work that
/// is safe to repeat, such as reads or upserts.
///
/// # Examples
///
/// ```rust
/// use persevere::{RetryExecutor, RetryPolicy};
/// use std::sync::atomic::{AtomicU32, Ordering};
/// use std::time::Duration;
///
/// # tokio_test::block_on(async {
/// let calls = AtomicU32::new(0);
/// let calls = &calls;
/// let executor = RetryExecutor::new(
///     RetryPolicy::constant(Duration::from_millis(1)).with_max_attempts(5),
/// );
///
/// let value = executor
///     .run(move || async move {
///         if calls.fetch_add(1, Ordering::SeqCst) < 2 {
///             Err("transient")
///         } else {
///             Ok("profile")
///         }
///     })
///     .await;
///
/// assert_eq!(value, Ok("profile"));
/// assert_eq!(calls.load(Ordering::SeqCst), 3);
/// # });
/// ```
#[derive(Debug, Clone)]
pub struct RetryExecutor<P = RetryAll, O = TracingObserver> {
    policy: RetryPolicy,
    predicate: P,
    observer: O,
}

impl RetryExecutor {
    /// Create an executor that retries every error and logs failures
    /// through `tracing`.
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            policy,
            predicate: RetryAll,
            observer: TracingObserver,
        }
    }
}

impl Default for RetryExecutor {
    fn default() -> Self {
        Self::new(RetryPolicy::default())
    }
}

impl<P, O> RetryExecutor<P, O> {
    /// Only retry errors for which `predicate` returns true.
    ///
    /// Rejected errors end the run immediately with
    /// [`RetryError::Aborted`], without waiting.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use persevere::{RetryExecutor, RetryPolicy};
    /// use std::time::Duration;
    ///
    /// # tokio_test::block_on(async {
    /// let executor = RetryExecutor::new(RetryPolicy::constant(Duration::from_millis(1)))
    ///     .retry_if(|status: &u16| *status >= 500);
    ///
    /// let result = executor.run(|| async { Err::<(), _>(400u16) }).await;
    /// let err = result.unwrap_err();
    /// assert!(err.is_aborted());
    /// assert_eq!(err.attempts(), 1);
    /// # });
    /// ```
    pub fn retry_if<P2>(self, predicate: P2) -> RetryExecutor<P2, O> {
        RetryExecutor {
            policy: self.policy,
            predicate,
            observer: self.observer,
        }
    }

    /// Replace the observer that receives failed attempts.
    pub fn with_observer<O2>(self, observer: O2) -> RetryExecutor<P, O2> {
        RetryExecutor {
            policy: self.policy,
            predicate: self.predicate,
            observer,
        }
    }

    /// The policy this executor runs under.
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Run `operation` until it succeeds, the predicate rejects its error, or
    /// the attempt budget runs out.
    ///
    /// On success the value is returned at once: no further attempt and no
    /// delay. On exhaustion only the last attempt's error is returned.
    pub async fn run<T, E, F, Fut>(&self, mut operation: F) -> Result<T, RetryError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        P: RetryPredicate<E>,
        O: RetryObserver<E>,
    {
        let start = Instant::now();
        let max_attempts = self.policy.max_attempts();
        let mut attempt = 0u32;

        loop {
            attempt += 1;
            let error = match operation().await {
                Ok(value) => return Ok(value),
                Err(error) => error,
            };

            let retriable = self.predicate.should_retry(&error);
            let next_delay = if retriable {
                self.policy.jittered_delay_before_retry(attempt)
            } else {
                None
            };

            self.observer.on_failure(&RetryEvent {
                attempt,
                max_attempts,
                remaining: max_attempts.saturating_sub(attempt),
                error: &error,
                next_delay,
                elapsed: start.elapsed(),
            });

            match next_delay {
                Some(delay) => {
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                }
                None if retriable => {
                    return Err(RetryError::Exhausted {
                        error,
                        attempts: attempt,
                        elapsed: start.elapsed(),
                    });
                }
                None => {
                    return Err(RetryError::Aborted {
                        error,
                        attempt,
                        elapsed: start.elapsed(),
                    });
                }
            }
        }
    }
}

/// Run `operation` under the default policy: 5 attempts, 2 seconds apart.
///
/// Returns the last attempt's error if every attempt fails.
pub async fn with_retry<T, E, F, Fut>(operation: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Debug,
{
    RetryExecutor::new(RetryPolicy::default())
        .run(operation)
        .await
        .map_err(RetryError::into_error)
}

/// Run `operation` up to `max_attempts` times, waiting `delay` between
/// attempts.
///
/// A `max_attempts` of 0 is treated as 1. Returns the last attempt's error if
/// every attempt fails.
///
/// # Examples
///
/// ```rust
/// use persevere::run_with_retry;
/// use std::time::Duration;
///
/// # tokio_test::block_on(async {
/// let result = run_with_retry(
///     || async { Err::<(), _>("boom") },
///     2,
///     Duration::from_millis(5),
/// )
/// .await;
///
/// assert_eq!(result, Err("boom"));
/// # });
/// ```
pub async fn run_with_retry<T, E, F, Fut>(
    operation: F,
    max_attempts: u32,
    delay: std::time::Duration,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Debug,
{
    let policy = RetryPolicy::constant(delay).with_max_attempts(max_attempts);
    RetryExecutor::new(policy)
        .run(operation)
        .await
        .map_err(RetryError::into_error)
}
