//! Retry Patterns Example
//!
//! Demonstrates the retry executor on the kinds of calls a social mini-app
//! backend makes:
//! - Looking up a user profile with the default policy
//! - Backoff strategies compared
//! - Refusing to retry permanent HTTP errors
//! - Per-attempt timeouts
//! - Watching retries with a custom observer

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use persevere::prelude::*;

#[derive(Debug, Clone, PartialEq)]
enum ApiError {
    Status(u16),
    Network(String),
}

impl ApiError {
    fn is_transient(&self) -> bool {
        match self {
            ApiError::Status(code) => *code >= 500 || *code == 429,
            ApiError::Network(_) => true,
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiError::Status(code) => write!(f, "HTTP {}", code),
            ApiError::Network(msg) => write!(f, "network error: {}", msg),
        }
    }
}

// ==================== Basic Retry ====================

/// Example 1: A flaky profile lookup
///
/// The lookup fails twice with a network error, then succeeds.
async fn example_basic_retry() {
    println!("\n=== Example 1: Basic Retry ===");

    let attempts = Arc::new(AtomicU32::new(0));
    let fid = 3621u64;

    let result = run_with_retry(
        {
            let attempts = attempts.clone();
            move || {
                let attempts = attempts.clone();
                async move {
                    let n = attempts.fetch_add(1, Ordering::SeqCst);
                    println!("  Attempt {} for fid {}", n + 1, fid);
                    if n < 2 {
                        Err(ApiError::Network("connection reset".into()))
                    } else {
                        Ok(format!("@user{}", fid))
                    }
                }
            }
        },
        5,
        Duration::from_millis(100),
    )
    .await;

    match result {
        Ok(username) => println!(
            "Found {} after {} attempts",
            username,
            attempts.load(Ordering::SeqCst)
        ),
        Err(e) => println!("Lookup failed: {}", e),
    }
}

// ==================== Backoff Strategies ====================

/// Example 2: Comparing delay schedules
async fn example_backoff_strategies() {
    println!("\n=== Example 2: Backoff Strategies ===");

    let policies = [
        ("Constant", RetryPolicy::constant(Duration::from_millis(100))),
        ("Linear", RetryPolicy::linear(Duration::from_millis(100))),
        (
            "Exponential (capped at 500ms)",
            RetryPolicy::exponential(Duration::from_millis(100))
                .with_max_delay(Duration::from_millis(500)),
        ),
    ];

    for (name, policy) in policies {
        let delays: Vec<_> = (1..policy.max_attempts())
            .filter_map(|retry| policy.delay_before_retry(retry))
            .collect();
        println!("{} delays: {:?}", name, delays);
    }
}

// ==================== Conditional Retry ====================

/// Example 3: Only retrying transient errors
///
/// A 400 from an image-generation API will never succeed on retry.
async fn example_conditional_retry() {
    println!("\n=== Example 3: Conditional Retry ===");

    let executor = RetryExecutor::new(RetryPolicy::constant(Duration::from_millis(50)))
        .retry_if(ApiError::is_transient);

    let attempts = AtomicU32::new(0);
    let attempts = &attempts;
    let result = executor
        .run(move || async move {
            attempts.fetch_add(1, Ordering::SeqCst);
            Err::<(), _>(ApiError::Status(400))
        })
        .await;

    match result {
        Err(e) => println!(
            "Gave up after {} attempt(s): {}",
            attempts.load(Ordering::SeqCst),
            e
        ),
        Ok(()) => println!("Unexpected success"),
    }
}

// ==================== Timeouts ====================

/// Example 4: Per-attempt timeouts
///
/// The first attempt hangs; the timeout turns it into a retriable failure.
async fn example_timeout() {
    println!("\n=== Example 4: Per-Attempt Timeout ===");

    let attempts = AtomicU32::new(0);
    let attempts = &attempts;
    let executor = RetryExecutor::new(
        RetryPolicy::constant(Duration::from_millis(20)).with_max_attempts(3),
    );

    let result = executor
        .run(move || {
            with_timeout(Duration::from_millis(100), async move {
                if attempts.fetch_add(1, Ordering::SeqCst) == 0 {
                    tokio::time::sleep(Duration::from_secs(5)).await;
                }
                Ok::<_, ApiError>("0.0042 ETH")
            })
        })
        .await;

    println!("Token price: {:?}", result.map_err(|e| e.to_string()));
}

// ==================== Observers ====================

/// Example 5: Custom observer
async fn example_observer() {
    println!("\n=== Example 5: Custom Observer ===");

    let executor = RetryExecutor::new(
        RetryPolicy::constant(Duration::from_millis(10)).with_max_attempts(3),
    )
    .with_observer(|event: &RetryEvent<'_, ApiError>| {
        println!(
            "  attempt {}/{} failed ({}), {} left, next delay {:?}",
            event.attempt, event.max_attempts, event.error, event.remaining, event.next_delay
        );
    });

    let result = executor
        .run(|| async { Err::<(), _>(ApiError::Status(503)) })
        .await;

    if let Err(e) = result {
        println!("{}", e);
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::WARN)
        .init();

    example_basic_retry().await;
    example_backoff_strategies().await;
    example_conditional_retry().await;
    example_timeout().await;
    example_observer().await;
}
