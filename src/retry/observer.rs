//! Hooks for classifying and watching failed attempts.

use std::fmt;
use std::time::Duration;

/// Information about a failed attempt, passed to observers.
#[derive(Debug, Clone)]
pub struct RetryEvent<'a, E> {
    /// Which attempt just failed (1-indexed).
    pub attempt: u32,
    /// Total attempts allowed by the policy.
    pub max_attempts: u32,
    /// Attempts still available after this one.
    pub remaining: u32,
    /// The error from the failed attempt.
    pub error: &'a E,
    /// Delay before the next attempt, or `None` if this failure is final.
    pub next_delay: Option<Duration>,
    /// Total elapsed time since the first attempt.
    pub elapsed: Duration,
}

impl<E> RetryEvent<'_, E> {
    /// Returns true if another attempt follows this failure.
    pub fn will_retry(&self) -> bool {
        self.next_delay.is_some()
    }
}

/// Receives one event per failed attempt.
///
/// Observers are synchronous and are called on the executor's task right
/// before it sleeps or gives up, so they should not block.
///
/// Any `Fn(&RetryEvent<'_, E>)` closure is an observer:
///
/// ```rust
/// use persevere::{RetryEvent, RetryExecutor, RetryPolicy};
/// use std::sync::atomic::{AtomicU32, Ordering};
/// use std::time::Duration;
///
/// # tokio_test::block_on(async {
/// let failures = AtomicU32::new(0);
/// let executor = RetryExecutor::new(
///     RetryPolicy::constant(Duration::from_millis(1)).with_max_attempts(2),
/// )
/// .with_observer(|_: &RetryEvent<'_, &str>| {
///     failures.fetch_add(1, Ordering::SeqCst);
/// });
///
/// let _ = executor.run(|| async { Err::<(), _>("down") }).await;
/// assert_eq!(failures.load(Ordering::SeqCst), 2);
/// # });
/// ```
pub trait RetryObserver<E> {
    /// Called after every failed attempt.
    fn on_failure(&self, event: &RetryEvent<'_, E>);
}

impl<E, F> RetryObserver<E> for F
where
    F: Fn(&RetryEvent<'_, E>),
{
    fn on_failure(&self, event: &RetryEvent<'_, E>) {
        self(event)
    }
}

/// Default observer: one `WARN` event per failed attempt via `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl<E: fmt::Debug> RetryObserver<E> for TracingObserver {
    fn on_failure(&self, event: &RetryEvent<'_, E>) {
        match event.next_delay {
            Some(delay) => tracing::warn!(
                attempt = event.attempt,
                max_attempts = event.max_attempts,
                remaining = event.remaining,
                delay = ?delay,
                error = ?event.error,
                "operation failed, retrying"
            ),
            None => tracing::warn!(
                attempt = event.attempt,
                max_attempts = event.max_attempts,
                remaining = event.remaining,
                elapsed = ?event.elapsed,
                error = ?event.error,
                "operation failed, giving up"
            ),
        }
    }
}

/// Observer that ignores every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl<E> RetryObserver<E> for NoopObserver {
    fn on_failure(&self, _event: &RetryEvent<'_, E>) {}
}

/// Decides whether an error is worth another attempt.
///
/// Any `Fn(&E) -> bool` closure is a predicate.
pub trait RetryPredicate<E> {
    /// Returns true if the operation should be attempted again.
    fn should_retry(&self, error: &E) -> bool;
}

impl<E, F> RetryPredicate<E> for F
where
    F: Fn(&E) -> bool,
{
    fn should_retry(&self, error: &E) -> bool {
        self(error)
    }
}

/// Default predicate: every error is retried.
#[derive(Debug, Clone, Copy, Default)]
pub struct RetryAll;

impl<E> RetryPredicate<E> for RetryAll {
    fn should_retry(&self, _error: &E) -> bool {
        true
    }
}
