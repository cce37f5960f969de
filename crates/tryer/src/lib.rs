//! Blocking retry executor with exponential backoff and jitter.
//!
//! A [`Retrier`] re-runs a fallible operation until it succeeds, a
//! caller-supplied [`RetryPolicy`] declares the failure permanent, the attempt
//! ceiling is reached, or the next delay would exhaust the cumulative wait
//! budget. Every per-attempt error is handed back alongside the [`Outcome`].
//!
//! ```
//! use std::time::Duration;
//!
//! use tryer::{Outcome, Retrier, RetryOptions};
//!
//! let retrier = Retrier::new(RetryOptions {
//!     attempts: 4,
//!     base: Duration::from_millis(1),
//!     max_interval: Duration::from_millis(4),
//!     max_wait: Duration::from_millis(100),
//!     exponent: 2.0,
//!     jitter: 0.5,
//! })
//! .unwrap();
//!
//! let execution = retrier.run(|| Err::<(), _>("unreachable host"));
//! assert_eq!(execution.outcome, Outcome::MaxAttemptsReached);
//! assert_eq!(execution.failures.len(), 4);
//! ```
//!
//! # Features
//!
//! - `serde` (default): serde support and TOML loading for [`RetryOptions`]
//! - `test-utils`: exposes [`testing::MockSleeper`] for downstream tests

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::complexity, clippy::suspicious)]

pub mod backoff;
pub mod cancel;
pub mod config;
pub mod error;
pub mod retrier;
pub mod seed;
pub mod sleeper;
pub mod trace;

// Testing utilities
// ---------------------------------------------------------------
#[cfg(any(feature = "test-utils", test))]
pub mod testing;

pub use backoff::Backoff;
pub use cancel::CancelToken;
pub use config::{RetryOptions, RetryOptionsBuilder};
#[cfg(feature = "serde")]
pub use error::OptionsError;
pub use error::{ConfigError, RetryError};
pub use retrier::{Execution, Outcome, Retrier, RetryPolicy};
pub use sleeper::{Sleeper, ThreadSleeper, Wake};
