//! Behavior tests for the retry executor.
//!
//! Timing tests run on tokio's paused clock, so elapsed times are exact sums
//! of the delays the executor slept for.

use super::*;
use crate::testing::{RecordingObserver, ScriptedOperation};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

fn fixed(max_attempts: u32, delay_ms: u64) -> RetryPolicy {
    RetryPolicy::constant(Duration::from_millis(delay_ms)).with_max_attempts(max_attempts)
}

#[tokio::test(start_paused = true)]
async fn test_immediate_success_runs_once_without_delay() {
    let op = ScriptedOperation::<_, &str>::new(vec![Ok(42)]);
    let recorder = RecordingObserver::new();
    let executor = RetryExecutor::new(fixed(5, 1000)).with_observer(recorder.clone());

    let start = Instant::now();
    let result = executor.run(|| op.call()).await;

    assert_eq!(result, Ok(42));
    assert_eq!(op.calls(), 1);
    assert_eq!(start.elapsed(), Duration::ZERO);
    assert!(recorder.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_always_failing_runs_exactly_max_attempts() {
    let op = ScriptedOperation::<(), _>::new(vec![
        Err("first"),
        Err("second"),
        Err("third"),
        Err("fourth"),
    ]);
    let executor = RetryExecutor::new(fixed(4, 10)).with_observer(NoopObserver);

    let result = executor.run(|| op.call()).await;

    assert_eq!(op.calls(), 4);
    let err = result.unwrap_err();
    assert!(err.is_exhausted());
    assert_eq!(err.attempts(), 4);
    // Only the last attempt's error survives
    assert_eq!(err.into_error(), "fourth");
}

#[tokio::test(start_paused = true)]
async fn test_eventual_success_stops_at_first_success() {
    let op = ScriptedOperation::fails_then_succeeds(2, "transient failure", "success");
    let executor = RetryExecutor::new(fixed(5, 1));

    let result = executor.run(|| op.call()).await;

    assert_eq!(result, Ok("success"));
    assert_eq!(op.calls(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_no_attempts_after_success_despite_remaining_budget() {
    let op = ScriptedOperation::fails_then_succeeds(1, "flaky", 7);
    let recorder = RecordingObserver::new();
    let executor = RetryExecutor::new(fixed(10, 50)).with_observer(recorder.clone());

    let start = Instant::now();
    assert_eq!(executor.run(|| op.call()).await, Ok(7));

    assert_eq!(op.calls(), 2);
    assert_eq!(recorder.attempts(), vec![1]);
    // One delay between the failure and the success, nothing after
    assert_eq!(start.elapsed(), Duration::from_millis(50));
}

#[tokio::test(start_paused = true)]
async fn test_single_attempt_never_delays_or_retries() {
    let failing = ScriptedOperation::<(), _>::always_fails("nope");
    let recorder = RecordingObserver::new();
    let executor = RetryExecutor::new(fixed(1, 5000)).with_observer(recorder.clone());

    let start = Instant::now();
    let result = executor.run(|| failing.call()).await;

    assert_eq!(failing.calls(), 1);
    assert_eq!(start.elapsed(), Duration::ZERO);
    assert_eq!(result.unwrap_err().attempts(), 1);
    assert_eq!(recorder.failures()[0].next_delay, None);
    assert_eq!(recorder.failures()[0].remaining, 0);

    let succeeding = ScriptedOperation::<_, &str>::new(vec![Ok("fine")]);
    assert_eq!(executor.run(|| succeeding.call()).await, Ok("fine"));
    assert_eq!(succeeding.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_fails_twice_then_ok_waits_two_delays() {
    let op = ScriptedOperation::fails_then_succeeds(2, "error", "ok");
    let executor = RetryExecutor::new(fixed(3, 10));

    let start = Instant::now();
    let result = executor.run(|| op.call()).await;

    assert_eq!(result, Ok("ok"));
    assert_eq!(op.calls(), 3);
    assert_eq!(start.elapsed(), Duration::from_millis(20));
}

#[tokio::test(start_paused = true)]
async fn test_boom_twice_waits_one_delay_and_rejects_with_boom() {
    let op = ScriptedOperation::<(), _>::always_fails("boom");

    let start = Instant::now();
    let result = run_with_retry(|| op.call(), 2, Duration::from_millis(5)).await;

    assert_eq!(result, Err("boom"));
    assert_eq!(op.calls(), 2);
    // No delay after the final attempt
    assert_eq!(start.elapsed(), Duration::from_millis(5));
}

#[tokio::test(start_paused = true)]
async fn test_with_retry_uses_five_attempts_two_seconds_apart() {
    let op = ScriptedOperation::fails_then_succeeds(4, "rate limited", "price");

    let start = Instant::now();
    let result = with_retry(|| op.call()).await;

    assert_eq!(result, Ok("price"));
    assert_eq!(op.calls(), 5);
    assert_eq!(start.elapsed(), Duration::from_secs(8));

    let op = ScriptedOperation::<(), _>::always_fails("down");
    assert_eq!(with_retry(|| op.call()).await, Err("down"));
    assert_eq!(op.calls(), 5);
}

#[tokio::test(start_paused = true)]
async fn test_run_with_retry_treats_zero_attempts_as_one() {
    let op = ScriptedOperation::<(), _>::always_fails("down");

    let result = run_with_retry(|| op.call(), 0, Duration::from_millis(10)).await;

    assert_eq!(result, Err("down"));
    assert_eq!(op.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_observer_sees_every_failure_with_countdown() {
    let op = ScriptedOperation::<(), _>::always_fails("unavailable");
    let recorder = RecordingObserver::new();
    let executor = RetryExecutor::new(fixed(5, 2)).with_observer(recorder.clone());

    let _ = executor.run(|| op.call()).await;

    let failures = recorder.failures();
    assert_eq!(recorder.attempts(), vec![1, 2, 3, 4, 5]);
    assert_eq!(
        failures.iter().map(|f| f.remaining).collect::<Vec<_>>(),
        vec![4, 3, 2, 1, 0]
    );
    assert!(failures[..4]
        .iter()
        .all(|f| f.next_delay == Some(Duration::from_millis(2))));
    assert_eq!(failures[4].next_delay, None);
    assert!(failures.iter().all(|f| f.error == "unavailable"));
}

#[tokio::test(start_paused = true)]
async fn test_closure_observer_receives_events() {
    let hook_calls = Arc::new(AtomicU32::new(0));
    let op = ScriptedOperation::fails_then_succeeds(2, "transient", "success");

    let executor = RetryExecutor::new(fixed(5, 1)).with_observer({
        let hook_calls = hook_calls.clone();
        move |event: &RetryEvent<'_, &str>| {
            assert!(event.will_retry());
            hook_calls.fetch_add(1, Ordering::SeqCst);
        }
    });

    assert!(executor.run(|| op.call()).await.is_ok());
    assert_eq!(hook_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test(start_paused = true)]
async fn test_retry_if_skips_non_retryable_errors() {
    #[derive(Debug, PartialEq, Clone)]
    #[allow(dead_code)]
    enum TestError {
        Transient,
        Permanent,
    }

    let op = ScriptedOperation::<(), _>::always_fails(TestError::Permanent);
    let executor = RetryExecutor::new(fixed(5, 100))
        .retry_if(|err: &TestError| matches!(err, TestError::Transient));

    let start = Instant::now();
    let result = executor.run(|| op.call()).await;

    assert_eq!(op.calls(), 1); // No retries for permanent error
    assert_eq!(start.elapsed(), Duration::ZERO);
    crate::assert_aborted!(result.clone());
    assert_eq!(result.unwrap_err().into_error(), TestError::Permanent);
}

#[tokio::test(start_paused = true)]
async fn test_retry_if_retries_transient_until_permanent() {
    #[derive(Debug, PartialEq, Clone)]
    enum ApiError {
        Status(u16),
    }

    let op = ScriptedOperation::<(), _>::new(vec![
        Err(ApiError::Status(503)),
        Err(ApiError::Status(502)),
        Err(ApiError::Status(400)),
    ]);
    let recorder = Arc::new(Mutex::new(Vec::new()));
    let executor = RetryExecutor::new(fixed(5, 10))
        .retry_if(|ApiError::Status(code): &ApiError| *code >= 500)
        .with_observer({
            let recorder = recorder.clone();
            move |event: &RetryEvent<'_, ApiError>| {
                recorder
                    .lock()
                    .unwrap()
                    .push((event.attempt, event.next_delay));
            }
        });

    let start = Instant::now();
    let err = executor.run(|| op.call()).await.unwrap_err();

    assert!(err.is_aborted());
    assert_eq!(err.attempts(), 3);
    assert_eq!(err.error(), &ApiError::Status(400));
    assert_eq!(start.elapsed(), Duration::from_millis(20));
    assert_eq!(
        *recorder.lock().unwrap(),
        vec![
            (1, Some(Duration::from_millis(10))),
            (2, Some(Duration::from_millis(10))),
            (3, None),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_attempts_are_sequential_and_spaced_by_delay() {
    let started = Arc::new(Mutex::new(Vec::new()));
    let executor = RetryExecutor::new(fixed(4, 25)).with_observer(NoopObserver);

    let result = executor
        .run({
            let started = started.clone();
            move || {
                let started = started.clone();
                async move {
                    started.lock().unwrap().push(Instant::now());
                    // Each attempt takes a while before failing
                    tokio::time::sleep(Duration::from_millis(5)).await;
                    Err::<(), _>("slow failure")
                }
            }
        })
        .await;

    crate::assert_exhausted!(result, 4);
    let started = started.lock().unwrap();
    assert_eq!(started.len(), 4);
    for pair in started.windows(2) {
        // 5ms of work plus the 25ms delay
        assert_eq!(pair[1] - pair[0], Duration::from_millis(30));
    }
}

#[tokio::test(start_paused = true)]
async fn test_exponential_backoff_timing() {
    let op = ScriptedOperation::fails_then_succeeds(3, "retry", "done");
    let executor = RetryExecutor::new(
        RetryPolicy::exponential(Duration::from_millis(10)).with_max_attempts(5),
    );

    let start = Instant::now();
    assert_eq!(executor.run(|| op.call()).await, Ok("done"));

    // 10ms + 20ms + 40ms
    assert_eq!(start.elapsed(), Duration::from_millis(70));
}

#[tokio::test(start_paused = true)]
async fn test_exhausted_reports_elapsed_time() {
    let op = ScriptedOperation::<(), _>::always_fails("down");
    let executor = RetryExecutor::new(
        RetryPolicy::linear(Duration::from_millis(100)).with_max_attempts(3),
    );

    let err = executor.run(|| op.call()).await.unwrap_err();

    // 100ms + 200ms
    assert_eq!(err.elapsed(), Duration::from_millis(300));
}

#[tokio::test(start_paused = true)]
async fn test_retry_with_timeout_per_attempt() {
    let attempts = Arc::new(AtomicU32::new(0));
    let executor = RetryExecutor::new(fixed(5, 1));

    let start = Instant::now();
    let result = executor
        .run({
            let attempts = attempts.clone();
            move || {
                let attempts = attempts.clone();
                with_timeout(Duration::from_millis(10), async move {
                    let n = attempts.fetch_add(1, Ordering::SeqCst);
                    if n < 2 {
                        // First two attempts take too long
                        tokio::time::sleep(Duration::from_millis(100)).await;
                    }
                    Ok::<_, String>("success")
                })
            }
        })
        .await;

    assert_eq!(result, Ok("success"));
    assert_eq!(attempts.load(Ordering::SeqCst), 3);
    // Two 10ms timeouts and two 1ms delays
    assert_eq!(start.elapsed(), Duration::from_millis(22));
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_invocations_share_one_executor() {
    let executor = RetryExecutor::new(fixed(3, 10)).with_observer(NoopObserver);
    let ops: Vec<_> = (0..3u32)
        .map(|failures| ScriptedOperation::fails_then_succeeds(failures, "busy", failures))
        .collect();

    let results =
        futures::future::join_all(ops.iter().map(|op| executor.run(move || op.call()))).await;

    assert_eq!(results, vec![Ok(0), Ok(1), Ok(2)]);
    assert_eq!(
        ops.iter().map(|op| op.calls()).collect::<Vec<_>>(),
        vec![1, 2, 3]
    );
}

#[tokio::test(start_paused = true)]
async fn test_operation_side_effects_repeat_per_attempt() {
    let writes = Arc::new(Mutex::new(Vec::new()));
    let executor = RetryExecutor::new(fixed(3, 1)).with_observer(NoopObserver);

    let result = executor
        .run({
            let writes = writes.clone();
            move || {
                let writes = writes.clone();
                async move {
                    let mut writes = writes.lock().unwrap();
                    writes.push("insert");
                    if writes.len() < 3 {
                        Err("write conflict")
                    } else {
                        Ok(writes.len())
                    }
                }
            }
        })
        .await;

    assert_eq!(result, Ok(3));
    assert_eq!(*writes.lock().unwrap(), vec!["insert"; 3]);
}

#[tokio::test]
async fn test_dropping_run_cancels_pending_retries() {
    let op = ScriptedOperation::<(), _>::always_fails("down");
    let executor = RetryExecutor::new(fixed(5, 60_000)).with_observer(NoopObserver);

    let outcome = tokio::time::timeout(Duration::from_millis(20), executor.run(|| op.call())).await;

    assert!(outcome.is_err());
    assert_eq!(op.calls(), 1);
}
