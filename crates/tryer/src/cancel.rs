//! Cooperative cancellation of retry delays
//!
//! A [`CancelToken`] is a shared flag. Clones observe the same flag, so one
//! clone can be handed to a retrying thread while another is kept to cancel
//! it. Cancelling wakes every thread currently waiting on the token.
//!
//! ```
//! use std::thread;
//! use std::time::Duration;
//!
//! use tryer::CancelToken;
//!
//! let token = CancelToken::new();
//! let waiter = {
//!     let token = token.clone();
//!     thread::spawn(move || token.wait_timeout(Duration::from_secs(30)))
//! };
//!
//! token.cancel();
//! assert!(waiter.join().unwrap());
//! ```

use std::fmt;
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::time::{Duration, Instant};

struct State {
    cancelled: Mutex<bool>,
    signal: Condvar,
}

impl State {
    fn lock(&self) -> MutexGuard<'_, bool> {
        match self.cancelled.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn wait_timeout<'a>(
        &self,
        guard: MutexGuard<'a, bool>,
        duration: Duration,
    ) -> MutexGuard<'a, bool> {
        match self.signal.wait_timeout(guard, duration) {
            Ok((guard, _)) => guard,
            Err(poisoned) => poisoned.into_inner().0,
        }
    }
}

/// Shared, clonable cancellation flag
#[derive(Clone)]
pub struct CancelToken {
    state: Arc<State>,
}

impl CancelToken {
    #[must_use]
    pub fn new() -> Self {
        Self { state: Arc::new(State { cancelled: Mutex::new(false), signal: Condvar::new() }) }
    }

    /// Set the flag and wake all waiters. Idempotent.
    pub fn cancel(&self) {
        let mut cancelled = self.state.lock();
        if *cancelled {
            return;
        }
        *cancelled = true;
        drop(cancelled);
        self.state.signal.notify_all();
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        *self.state.lock()
    }

    /// Block for up to `timeout`, returning early if the token is cancelled.
    ///
    /// Returns `true` if the token was cancelled (before or during the wait).
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let deadline = Instant::now().checked_add(timeout);
        let mut cancelled = self.state.lock();
        loop {
            if *cancelled {
                return true;
            }
            let remaining = match deadline {
                Some(deadline) => deadline.saturating_duration_since(Instant::now()),
                None => timeout,
            };
            if remaining.is_zero() {
                return false;
            }
            cancelled = self.state.wait_timeout(cancelled, remaining);
        }
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CancelToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CancelToken").field("cancelled", &self.is_cancelled()).finish()
    }
}
