//! Operation-level deadlines.
//!
//! The executor never times anything out on its own: an attempt that never
//! settles blocks the run forever. Callers that need a deadline wrap each
//! attempt's future with [`with_timeout`] inside the operation closure, which
//! turns a stalled attempt into an ordinary (and retriable) failure.

use std::future::Future;
use std::time::Duration;

use super::error::TimeoutError;

/// Add a timeout to a fallible future.
///
/// If the future doesn't complete within `duration`, it is dropped and the
/// call fails with [`TimeoutError::Timeout`].
///
/// # Example
///
/// ```rust
/// use persevere::{with_timeout, RetryExecutor, RetryPolicy, TimeoutError};
/// use std::time::Duration;
///
/// # tokio_test::block_on(async {
/// let executor = RetryExecutor::new(
///     RetryPolicy::constant(Duration::from_millis(1)).with_max_attempts(2),
/// );
///
/// let result = executor
///     .run(|| {
///         with_timeout(Duration::from_millis(10), async {
///             tokio::time::sleep(Duration::from_secs(10)).await;
///             Ok::<_, String>(42)
///         })
///     })
///     .await;
///
/// assert!(matches!(
///     result.unwrap_err().into_error(),
///     TimeoutError::Timeout { .. }
/// ));
/// # });
/// ```
pub async fn with_timeout<T, E, Fut>(duration: Duration, future: Fut) -> Result<T, TimeoutError<E>>
where
    Fut: Future<Output = Result<T, E>>,
{
    match tokio::time::timeout(duration, future).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(TimeoutError::Inner(e)),
        Err(_) => Err(TimeoutError::Timeout { duration }),
    }
}
