//! # Persevere
//!
//! Bounded retry execution for fallible async operations.
//!
//! Network-facing call sites (database lookups, identity and pricing APIs,
//! notification endpoints) fail transiently. `persevere` runs such an
//! operation up to a fixed number of attempts, waits between attempts, and
//! hands back the last error once the budget is spent.
//!
//! ## Quick Example
//!
//! ```rust
//! use persevere::run_with_retry;
//! use std::sync::atomic::{AtomicU32, Ordering};
//! use std::time::Duration;
//!
//! # tokio_test::block_on(async {
//! let calls = AtomicU32::new(0);
//! let calls = &calls;
//!
//! // Fails twice, then succeeds
//! let result = run_with_retry(
//!     move || async move {
//!         match calls.fetch_add(1, Ordering::SeqCst) {
//!             0 | 1 => Err("connection reset"),
//!             _ => Ok("ok"),
//!         }
//!     },
//!     3,
//!     Duration::from_millis(10),
//! )
//! .await;
//!
//! assert_eq!(result, Ok("ok"));
//! assert_eq!(calls.load(Ordering::SeqCst), 3);
//! # });
//! ```
//!
//! ## Features
//!
//! - `jitter`: randomize delays (`rand`)
//! - `serde`: [`RetryConfig`] for loading policies from configuration
//! - `proptest`: `Arbitrary` for [`RetryPolicy`]

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

#[cfg(feature = "serde")]
pub mod config;
pub mod retry;
pub mod testing;

// Re-exports
#[cfg(feature = "serde")]
pub use config::{RetryConfig, StrategyKind};
pub use retry::{
    run_with_retry, with_retry, with_timeout, JitterStrategy, NoopObserver, PolicyError, RetryAll,
    RetryError, RetryEvent, RetryExecutor, RetryObserver, RetryPolicy, RetryPredicate,
    RetryStrategy, TimeoutError, TracingObserver, DEFAULT_DELAY, DEFAULT_MAX_ATTEMPTS,
};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::retry::{
        run_with_retry, with_retry, with_timeout, NoopObserver, RetryAll, RetryError, RetryEvent,
        RetryExecutor, RetryObserver, RetryPolicy, RetryPredicate, TimeoutError, TracingObserver,
    };
}
