//! Exponential backoff with proportional jitter
//!
//! For retry index `i` (the number of retries already performed):
//!
//! ```text
//! raw    = base * exponent^i
//! capped = min(max_interval, raw)
//! delay  = capped * (1 - U[0,1) * jitter)
//! ```
//!
//! The arithmetic is done on nanosecond counts in `f64`, so `jitter = 0`
//! yields `capped` exactly for any duration below 2^53 nanoseconds.

use std::time::Duration;

use rand::Rng;

use crate::config::RetryOptions;

/// The backoff curve of one validated `RetryOptions`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Backoff {
    base_nanos: f64,
    max_interval_nanos: f64,
    exponent: f64,
    jitter: f64,
}

impl Backoff {
    /// Build the curve. The options are assumed to be valid.
    pub fn new(options: &RetryOptions) -> Self {
        Self {
            base_nanos: options.base.as_nanos() as f64,
            max_interval_nanos: options.max_interval.as_nanos() as f64,
            exponent: options.exponent,
            jitter: options.jitter,
        }
    }

    /// Delay for `retry` before jitter, capped at `max_interval`
    pub fn capped(&self, retry: u32) -> Duration {
        nanos_to_duration(self.capped_nanos(retry))
    }

    /// Delay for `retry` with a fresh jitter sample drawn from `rng`
    pub fn delay<R: Rng + ?Sized>(&self, retry: u32, rng: &mut R) -> Duration {
        self.jittered(retry, rng.gen::<f64>())
    }

    /// Delay for `retry` given a uniform sample in `[0, 1)`
    ///
    /// Out-of-range samples are clamped, so the result never exceeds the
    /// capped delay and never goes negative.
    pub fn jittered(&self, retry: u32, sample: f64) -> Duration {
        let capped = self.capped_nanos(retry);
        if self.jitter == 0.0 {
            return nanos_to_duration(capped);
        }
        let sample = if sample.is_nan() { 0.0 } else { sample.clamp(0.0, 1.0) };
        nanos_to_duration(capped * (1.0 - sample * self.jitter))
    }

    fn capped_nanos(&self, retry: u32) -> f64 {
        let power = i32::try_from(retry).unwrap_or(i32::MAX);
        let raw = self.base_nanos * self.exponent.powi(power);
        // `raw` is +inf once the power overflows; `min` folds it into the cap
        raw.min(self.max_interval_nanos)
    }
}

fn nanos_to_duration(nanos: f64) -> Duration {
    if nanos <= 0.0 {
        return Duration::ZERO;
    }
    // Float-to-int `as` saturates
    Duration::from_nanos(nanos as u64)
}
