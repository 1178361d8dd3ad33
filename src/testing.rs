//! Testing utilities for code that retries.
//!
//! This module provides helpers for asserting on retry behavior without
//! capturing process output: an observer that records every failed attempt,
//! a scripted operation that counts its calls, and assertion macros for
//! [`RetryError`](crate::RetryError) outcomes.
//!
//! # Examples
//!
//! ```rust
//! use persevere::testing::{RecordingObserver, ScriptedOperation};
//! use persevere::{RetryExecutor, RetryPolicy};
//! use std::time::Duration;
//!
//! # tokio_test::block_on(async {
//! let op = ScriptedOperation::fails_then_succeeds(2, "timeout", "ok");
//! let recorder = RecordingObserver::new();
//!
//! let executor = RetryExecutor::new(RetryPolicy::fixed(3, Duration::from_millis(1)).unwrap())
//!     .with_observer(recorder.clone());
//!
//! assert_eq!(executor.run(|| op.call()).await, Ok("ok"));
//! assert_eq!(op.calls(), 3);
//! assert_eq!(recorder.attempts(), vec![1, 2]);
//! # });
//! ```

use std::fmt;
use std::future::{ready, Ready};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::retry::{RetryEvent, RetryObserver};

/// A failed attempt as seen by a [`RecordingObserver`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedFailure {
    /// Which attempt failed (1-indexed).
    pub attempt: u32,
    /// Attempts still available after this one.
    pub remaining: u32,
    /// Delay before the next attempt, `None` when the failure was final.
    pub next_delay: Option<Duration>,
    /// The attempt's error, rendered with `Display`.
    pub error: String,
}

/// Observer that keeps every failed attempt in memory.
///
/// Clones share the same record, so keep one clone and hand the other to
/// the executor.
#[derive(Debug, Clone, Default)]
pub struct RecordingObserver {
    failures: Arc<Mutex<Vec<RecordedFailure>>>,
}

impl RecordingObserver {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every failure recorded so far, oldest first.
    pub fn failures(&self) -> Vec<RecordedFailure> {
        self.lock().clone()
    }

    /// The attempt numbers of every recorded failure.
    pub fn attempts(&self) -> Vec<u32> {
        self.lock().iter().map(|f| f.attempt).collect()
    }

    /// Number of recorded failures.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Returns true if nothing failed.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<RecordedFailure>> {
        // A panicking test thread must not hide the record from the others.
        self.failures
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl<E: fmt::Display> RetryObserver<E> for RecordingObserver {
    fn on_failure(&self, event: &RetryEvent<'_, E>) {
        self.lock().push(RecordedFailure {
            attempt: event.attempt,
            remaining: event.remaining,
            next_delay: event.next_delay,
            error: event.error.to_string(),
        });
    }
}

/// An operation that replays a fixed script of outcomes and counts calls.
///
/// Call `n` (1-indexed) yields entry `n - 1` of the script. Once the script
/// runs out, the last entry repeats. Clones share the call counter.
#[derive(Debug, Clone)]
pub struct ScriptedOperation<T, E> {
    script: Arc<Vec<Result<T, E>>>,
    calls: Arc<AtomicU32>,
}

impl<T: Clone, E: Clone> ScriptedOperation<T, E> {
    /// Create an operation from an explicit script.
    ///
    /// # Panics
    ///
    /// Panics if `script` is empty.
    pub fn new(script: Vec<Result<T, E>>) -> Self {
        assert!(!script.is_empty(), "ScriptedOperation needs at least one outcome");
        Self {
            script: Arc::new(script),
            calls: Arc::new(AtomicU32::new(0)),
        }
    }

    /// Fail `failures` times with `error`, then succeed with `value` forever.
    pub fn fails_then_succeeds(failures: u32, error: E, value: T) -> Self {
        let mut script: Vec<Result<T, E>> = (0..failures).map(|_| Err(error.clone())).collect();
        script.push(Ok(value));
        Self::new(script)
    }

    /// Fail every call with `error`.
    pub fn always_fails(error: E) -> Self {
        Self::new(vec![Err(error)])
    }

    /// Perform one call.
    pub fn call(&self) -> Ready<Result<T, E>> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) as usize;
        let index = n.min(self.script.len() - 1);
        ready(self.script[index].clone())
    }

    /// Number of calls made so far.
    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

/// Assert that a retry run gave up after exhausting its attempts.
///
/// # Example
///
/// ```rust
/// use persevere::{assert_exhausted, RetryError};
/// use std::time::Duration;
///
/// let result: Result<(), _> = Err(RetryError::Exhausted {
///     error: "boom",
///     attempts: 2,
///     elapsed: Duration::from_millis(5),
/// });
/// assert_exhausted!(result, 2);
/// ```
#[macro_export]
macro_rules! assert_exhausted {
    ($result:expr, $attempts:expr) => {
        match $result {
            Err($crate::RetryError::Exhausted { attempts, .. }) => {
                assert_eq!(
                    attempts, $attempts,
                    "Expected exhaustion after {} attempts, got {}",
                    $attempts, attempts
                );
            }
            other => {
                panic!(
                    "Expected Exhausted after {} attempts, got: {:?}",
                    $attempts, other
                );
            }
        }
    };
}

/// Assert that a retry run stopped because its error was not retriable.
///
/// # Example
///
/// ```rust
/// use persevere::{assert_aborted, RetryError};
/// use std::time::Duration;
///
/// let result: Result<(), _> = Err(RetryError::Aborted {
///     error: "400",
///     attempt: 1,
///     elapsed: Duration::ZERO,
/// });
/// assert_aborted!(result);
/// ```
#[macro_export]
macro_rules! assert_aborted {
    ($result:expr) => {
        match $result {
            Err($crate::RetryError::Aborted { .. }) => {}
            other => {
                panic!("Expected Aborted, got: {:?}", other);
            }
        }
    };
}

#[cfg(feature = "proptest")]
use proptest::prelude::*;

#[cfg(feature = "proptest")]
impl Arbitrary for crate::RetryPolicy {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_args: Self::Parameters) -> Self::Strategy {
        use crate::RetryPolicy;

        (
            1u32..=10,
            0u64..=50,
            0u8..3,
            proptest::option::of(0u64..=200),
            0u8..3,
            0.0f64..=1.0,
        )
            .prop_map(|(max_attempts, delay_ms, kind, cap_extra_ms, jitter, factor)| {
                let delay = Duration::from_millis(delay_ms);
                let mut policy = match kind {
                    0 => RetryPolicy::constant(delay),
                    1 => RetryPolicy::linear(delay),
                    _ => RetryPolicy::exponential(delay),
                }
                .with_max_attempts(max_attempts);

                // The cap never drops below the base delay
                if let Some(extra_ms) = cap_extra_ms {
                    policy = policy.with_max_delay(Duration::from_millis(delay_ms + extra_ms));
                }
                match jitter {
                    0 => policy,
                    1 => policy.with_jitter(factor),
                    _ => policy.with_full_jitter(),
                }
            })
            .boxed()
    }
}
