//! Integration tests for the retry executor
//!
//! Exercises retriers end to end: real thread sleeping, cross-thread
//! cancellation, shared retriers under concurrency, and policies classifying
//! `std::io::Error` kinds.

#![cfg(feature = "test-utils")]

use std::io;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use tryer::testing::MockSleeper;
use tryer::{CancelToken, Outcome, Retrier, RetryError, RetryOptions};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

fn fast_options(attempts: u32) -> RetryOptions {
    RetryOptions {
        attempts,
        base: Duration::from_millis(2),
        max_interval: Duration::from_millis(10),
        max_wait: Duration::from_secs(5),
        exponent: 2.0,
        jitter: 0.5,
    }
}

/// Ensures transient I/O errors are retried until the operation recovers.
#[test]
fn test_policy_retries_transient_io_errors() {
    init_tracing();
    let retrier = Retrier::with_policy(
        |err: &io::Error| {
            matches!(err.kind(), io::ErrorKind::ConnectionReset | io::ErrorKind::TimedOut)
        },
        fast_options(5),
    )
    .expect("valid options")
    .named("fetch-profile");

    let attempts = AtomicU32::new(0);
    let execution = retrier.run(|| {
        let current = attempts.fetch_add(1, Ordering::SeqCst);
        if current < 2 {
            Err(io::Error::new(io::ErrorKind::ConnectionReset, "connection reset by peer"))
        } else {
            Ok("profile")
        }
    });

    assert_eq!(execution.outcome, Outcome::Success("profile"));
    assert_eq!(execution.failures.len(), 2);
    assert!(execution.failures.iter().all(|err| err.kind() == io::ErrorKind::ConnectionReset));
    assert_eq!(attempts.load(Ordering::SeqCst), 3);
}

/// Validates that permanent errors stop the execution after one attempt.
#[test]
fn test_policy_stops_on_permanent_error() {
    init_tracing();
    let retrier = Retrier::with_policy(
        |err: &io::Error| err.kind() != io::ErrorKind::PermissionDenied,
        fast_options(5),
    )
    .expect("valid options");

    let attempts = AtomicU32::new(0);
    let execution = retrier.run(|| {
        attempts.fetch_add(1, Ordering::SeqCst);
        Err::<(), _>(io::Error::new(io::ErrorKind::PermissionDenied, "denied"))
    });

    assert_eq!(execution.outcome, Outcome::Cancelled);
    assert_eq!(execution.failures.len(), 1);
    assert_eq!(attempts.load(Ordering::SeqCst), 1);
    assert_eq!(
        execution.into_result().expect_err("cancelled"),
        RetryError::Cancelled { attempts: 1 }
    );
}

/// Validates the thread sleeper really waits between attempts.
#[test]
fn test_real_delays_are_slept() {
    init_tracing();
    let retrier = Retrier::new(RetryOptions { jitter: 0.0, ..fast_options(3) })
        .expect("valid options");

    let start = Instant::now();
    let execution = retrier.run(|| Err::<(), _>("down"));

    assert_eq!(execution.outcome, Outcome::MaxAttemptsReached);
    assert_eq!(execution.delays, vec![Duration::from_millis(2), Duration::from_millis(4)]);
    assert!(start.elapsed() >= Duration::from_millis(6));
}

/// Validates another thread can interrupt a long delay promptly.
///
/// Assertions:
/// - Outcome is `Interrupted` after the first failure.
/// - The execution returns long before the 10s delay would have elapsed.
#[test]
fn test_cancel_from_another_thread() {
    init_tracing();
    let retrier = Retrier::new(RetryOptions {
        attempts: 3,
        base: Duration::from_secs(10),
        max_interval: Duration::from_secs(10),
        max_wait: Duration::from_secs(60),
        exponent: 1.0,
        jitter: 0.0,
    })
    .expect("valid options");
    let token = CancelToken::new();

    let canceller = {
        let token = token.clone();
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(50));
            token.cancel();
        })
    };

    let start = Instant::now();
    let execution = retrier.run_cancellable(|| Err::<(), _>("down"), &token);
    canceller.join().expect("canceller panicked");

    assert_eq!(execution.outcome, Outcome::Interrupted);
    assert_eq!(execution.failures.len(), 1);
    assert!(execution.delays.is_empty());
    assert!(start.elapsed() < Duration::from_secs(5));
}

/// Validates concurrent executions sharing one retrier draw independent jitter.
///
/// Assertions:
/// - Every thread exhausts its attempts.
/// - No two threads observe the same delay sequence.
#[test]
fn test_concurrent_executions_decorrelate_jitter() {
    init_tracing();
    let retrier = Arc::new(
        Retrier::new(RetryOptions {
            attempts: 6,
            base: Duration::from_millis(100),
            max_interval: Duration::from_secs(10),
            max_wait: Duration::from_secs(600),
            exponent: 2.0,
            jitter: 1.0,
        })
        .expect("valid options")
        .with_sleeper(MockSleeper::new()),
    );

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let retrier = Arc::clone(&retrier);
            thread::spawn(move || retrier.run(|| Err::<(), _>("down")))
        })
        .collect();

    let sequences: Vec<Vec<Duration>> = handles
        .into_iter()
        .map(|handle| {
            let execution = handle.join().expect("retry thread panicked");
            assert_eq!(execution.outcome, Outcome::MaxAttemptsReached);
            assert_eq!(execution.failures.len(), 6);
            execution.delays
        })
        .collect();

    for (i, left) in sequences.iter().enumerate() {
        for right in &sequences[i + 1..] {
            assert_ne!(left, right, "two executions produced identical jitter");
        }
    }
}

/// Validates scoped threads can borrow one retrier without `Arc`.
#[test]
fn test_scoped_threads_share_retrier() {
    let sleeper = MockSleeper::new();
    let retrier = Retrier::new(RetryOptions { jitter: 0.0, ..fast_options(4) })
        .expect("valid options")
        .with_sleeper(sleeper.clone());

    let total_calls = AtomicU32::new(0);
    thread::scope(|scope| {
        for _ in 0..4 {
            scope.spawn(|| {
                let execution = retrier.run(|| {
                    total_calls.fetch_add(1, Ordering::SeqCst);
                    Err::<(), _>("down")
                });
                assert_eq!(execution.attempts(), 4);
            });
        }
    });

    assert_eq!(total_calls.load(Ordering::SeqCst), 16);
    assert_eq!(sleeper.calls(), 12);
    assert_eq!(sleeper.total(), Duration::from_millis(4 * (2 + 4 + 8)));
}

/// Validates the outcome converts into an `anyhow`-compatible error.
#[test]
fn test_into_result_with_question_mark() -> anyhow::Result<()> {
    let retrier = Retrier::new(fast_options(2))?.with_sleeper(MockSleeper::new());

    let value = retrier.run(|| Ok::<_, io::Error>(5)).into_result()?;
    assert_eq!(value, 5);

    let error = retrier
        .run(|| Err::<(), _>(io::Error::other("down")))
        .into_result()
        .expect_err("every attempt fails");
    let error = anyhow::Error::from(error);
    assert_eq!(error.to_string(), "reached maximum attempts (2)");
    Ok(())
}
