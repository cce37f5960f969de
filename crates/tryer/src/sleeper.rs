//! How a retry delay is waited out
//!
//! The retrier never sleeps directly; it asks a [`Sleeper`]. Production code
//! uses [`ThreadSleeper`], which blocks the calling thread. Tests can swap in
//! [`MockSleeper`](crate::testing::MockSleeper) to record delays without
//! waiting for them.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::cancel::CancelToken;

/// How a call to [`Sleeper::sleep`] ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wake {
    /// The full delay passed
    Elapsed,
    /// The cancellation token fired first
    Cancelled,
}

/// Strategy for waiting out a delay
pub trait Sleeper: Send + Sync {
    /// Block for `delay`, or until `cancel` fires if a token is given.
    fn sleep(&self, delay: Duration, cancel: Option<&CancelToken>) -> Wake;
}

impl<T: Sleeper + ?Sized> Sleeper for Arc<T> {
    fn sleep(&self, delay: Duration, cancel: Option<&CancelToken>) -> Wake {
        (**self).sleep(delay, cancel)
    }
}

/// Blocks the calling thread
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, delay: Duration, cancel: Option<&CancelToken>) -> Wake {
        match cancel {
            Some(token) if token.wait_timeout(delay) => Wake::Cancelled,
            Some(_) => Wake::Elapsed,
            None => {
                thread::sleep(delay);
                Wake::Elapsed
            }
        }
    }
}
