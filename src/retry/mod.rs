//! Bounded retry execution for fallible async operations.
//!
//! The pieces are kept apart so each can be tested on its own:
//!
//! - **[`RetryPolicy`]**: pure data. How many attempts, how long to wait.
//! - **[`RetryExecutor`]**: the loop. Runs an operation under a policy.
//! - **[`RetryPredicate`]**: which errors are worth another attempt.
//! - **[`RetryObserver`]**: where failed attempts are reported.
//!
//! # Quick Start
//!
//! ```rust
//! use persevere::{RetryExecutor, RetryPolicy};
//! use std::time::Duration;
//!
//! # tokio_test::block_on(async {
//! let executor = RetryExecutor::new(
//!     RetryPolicy::constant(Duration::from_millis(10)).with_max_attempts(3),
//! );
//!
//! let fid = 3621u64;
//! let user = executor
//!     .run(move || async move { Ok::<_, String>(format!("user:{}", fid)) })
//!     .await;
//!
//! assert_eq!(user, Ok("user:3621".to_string()));
//! # });
//! ```
//!
//! # Delay Strategies
//!
//! - **Constant**: Fixed delay between attempts (the default, 2 seconds)
//! - **Linear**: Delay grows linearly (100ms, 200ms, 300ms, ...)
//! - **Exponential**: Delay doubles each retry (100ms, 200ms, 400ms, ...)
//!
//! With the `jitter` feature, delays can be randomized to spread out
//! concurrent callers.
//!
//! # Error Types
//!
//! - [`RetryError`]: the run failed; carries the last attempt's error
//! - [`TimeoutError`]: produced by [`with_timeout`]
//! - [`PolicyError`]: a policy or config that cannot be run

mod error;
mod executor;
mod observer;
mod policy;
mod timeout;

pub use error::{PolicyError, RetryError, TimeoutError};
pub use executor::{run_with_retry, with_retry, RetryExecutor};
pub use observer::{
    NoopObserver, RetryAll, RetryEvent, RetryObserver, RetryPredicate, TracingObserver,
};
pub use policy::{JitterStrategy, RetryPolicy, RetryStrategy, DEFAULT_DELAY, DEFAULT_MAX_ATTEMPTS};
pub use timeout::with_timeout;

#[cfg(test)]
mod tests;
