//! Test doubles for retry executions
//!
//! Available to this crate's own tests and, with the `test-utils` feature, to
//! downstream test suites.
//!
//! # Examples
//!
//! ```
//! use std::time::Duration;
//!
//! use tryer::sleeper::{Sleeper, Wake};
//! use tryer::testing::MockSleeper;
//!
//! let sleeper = MockSleeper::new();
//! assert_eq!(sleeper.sleep(Duration::from_millis(40), None), Wake::Elapsed);
//! assert_eq!(sleeper.sleep(Duration::from_millis(80), None), Wake::Elapsed);
//!
//! assert_eq!(sleeper.total(), Duration::from_millis(120));
//! assert_eq!(sleeper.calls(), 2);
//! ```

use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::cancel::CancelToken;
use crate::sleeper::{Sleeper, Wake};

/// Sleeper that records requested delays instead of blocking
///
/// Clones share the same record, so a test can keep one handle while the
/// retrier owns another. A cancelled token is honoured immediately and the
/// interrupted delay is not recorded.
#[derive(Debug, Clone, Default)]
pub struct MockSleeper {
    delays: Arc<Mutex<Vec<Duration>>>,
}

impl MockSleeper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every delay slept so far, in order
    pub fn delays(&self) -> Vec<Duration> {
        // Test utility: panic on poisoned mutex to fail tests early
        self.delays.lock().expect("mutex poisoned").clone()
    }

    /// Sum of all delays slept so far
    pub fn total(&self) -> Duration {
        self.delays().iter().sum()
    }

    /// Number of completed sleeps
    pub fn calls(&self) -> usize {
        self.delays.lock().expect("mutex poisoned").len()
    }
}

impl Sleeper for MockSleeper {
    fn sleep(&self, delay: Duration, cancel: Option<&CancelToken>) -> Wake {
        if cancel.is_some_and(CancelToken::is_cancelled) {
            return Wake::Cancelled;
        }
        self.delays.lock().expect("mutex poisoned").push(delay);
        Wake::Elapsed
    }
}
