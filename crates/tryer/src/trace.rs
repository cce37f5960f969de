//! Structured logging for retry executions
//!
//! Events go through the standard `tracing` macros; the crate never installs
//! a subscriber.

use std::time::Duration;

use tracing::{debug, info, warn};

/// Operation name used when the retrier was not given one
pub const UNNAMED_OPERATION: &str = "operation";

/// Log sink for a single execution
#[derive(Debug)]
pub struct ExecutionLog<'a> {
    operation: &'a str,
    max_attempts: u32,
}

impl<'a> ExecutionLog<'a> {
    pub fn start(operation: &'a str, max_attempts: u32) -> Self {
        debug!(operation, max_attempts, "Starting retry execution");
        Self { operation, max_attempts }
    }

    pub fn record_attempt(&self, attempt: usize) {
        debug!(
            operation = self.operation,
            attempt,
            max_attempts = self.max_attempts,
            "Executing operation"
        );
    }

    pub fn record_failure(&self, attempt: usize, error: &dyn std::fmt::Debug) {
        warn!(
            operation = self.operation,
            attempt,
            max_attempts = self.max_attempts,
            error = ?error,
            "Attempt failed"
        );
    }

    pub fn record_delay(&self, attempt: usize, delay: Duration, total_delay: Duration) {
        debug!(
            operation = self.operation,
            attempt,
            delay_ms = delay.as_millis() as u64,
            total_delay_ms = total_delay.as_millis() as u64,
            "Retrying after delay"
        );
    }

    pub fn record_success(&self, attempts: usize, total_delay: Duration) {
        if attempts > 1 {
            info!(
                operation = self.operation,
                attempts,
                total_delay_ms = total_delay.as_millis() as u64,
                "Operation succeeded after retries"
            );
        } else {
            debug!(operation = self.operation, "Operation succeeded on first attempt");
        }
    }

    pub fn record_cancelled(&self, attempts: usize) {
        warn!(operation = self.operation, attempts, "Retry policy rejected failure, not retrying");
    }

    pub fn record_exhausted(&self, total_delay: Duration) {
        warn!(
            operation = self.operation,
            max_attempts = self.max_attempts,
            total_delay_ms = total_delay.as_millis() as u64,
            "All retry attempts exhausted"
        );
    }

    pub fn record_timeout(&self, attempts: usize, next_delay: Duration, max_wait: Duration) {
        warn!(
            operation = self.operation,
            attempts,
            next_delay_ms = next_delay.as_millis() as u64,
            max_wait_ms = max_wait.as_millis() as u64,
            "Cumulative wait budget exhausted"
        );
    }

    pub fn record_interrupted(&self, attempts: usize) {
        warn!(operation = self.operation, attempts, "Retry delay interrupted by cancellation");
    }
}
