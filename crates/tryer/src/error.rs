//! Error types for retry construction and execution
//!
//! Two disjoint taxonomies live here:
//!
//! 1. **[`ConfigError`]**: raised by [`Retrier::new`](crate::Retrier::new) when
//!    a [`RetryOptions`](crate::RetryOptions) value violates one of its
//!    invariants. One variant per invariant, each carrying the offending
//!    value.
//! 2. **[`RetryError`]**: the non-success terminal outcomes of an execution,
//!    expressed as a `std::error::Error` so callers can propagate them with
//!    `?` via [`Execution::into_result`](crate::Execution::into_result).
//!
//! Loading options from TOML has its own error, [`OptionsError`], which is
//! only available with the `serde` feature.

use std::time::Duration;

use thiserror::Error;

/// A `RetryOptions` invariant was violated.
///
/// Invariants are checked in declaration order and the first violation wins.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// `attempts` must allow at least one invocation
    #[error("expected attempts to be at least 1, got {got}")]
    Attempts { got: u32 },

    /// `base` must be a non-zero duration
    #[error("expected base to be greater than zero, got {got:?}")]
    Base { got: Duration },

    /// `max_interval` must not be shorter than `base`
    #[error("expected max_interval to be at least base, got max_interval {max_interval:?} and base {base:?}")]
    MaxIntervalBelowBase { max_interval: Duration, base: Duration },

    /// `max_wait` must not be shorter than `base`
    #[error("expected max_wait to be at least base, got max_wait {max_wait:?} and base {base:?}")]
    MaxWaitBelowBase { max_wait: Duration, base: Duration },

    /// `exponent` must be at least 1
    #[error("expected exponent to be greater than or equal to 1, got {got:.2}")]
    Exponent { got: f64 },

    /// `jitter` must lie in `[0, 1]`
    #[error("expected jitter to be between 0 and 1, got {got:.2}")]
    Jitter { got: f64 },
}

impl ConfigError {
    /// Name of the `RetryOptions` field that failed validation.
    pub fn field(&self) -> &'static str {
        match self {
            Self::Attempts { .. } => "attempts",
            Self::Base { .. } => "base",
            Self::MaxIntervalBelowBase { .. } => "max_interval",
            Self::MaxWaitBelowBase { .. } => "max_wait",
            Self::Exponent { .. } => "exponent",
            Self::Jitter { .. } => "jitter",
        }
    }
}

/// Why an execution ended without success.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RetryError {
    /// The retry policy rejected the latest failure
    #[error("further retries cancelled after {attempts} attempt(s)")]
    Cancelled { attempts: usize },

    /// The next delay would have used up the cumulative wait budget
    #[error("timed out after {attempts} attempt(s) and {waited:?} of waiting")]
    TimedOut { attempts: usize, waited: Duration },

    /// Every permitted attempt failed
    #[error("reached maximum attempts ({attempts})")]
    MaxAttemptsReached { attempts: usize },

    /// `execute` was called without an operation
    #[error("no operation supplied")]
    NoOperationSupplied,

    /// A cancellation token interrupted a delay
    #[error("interrupted while waiting to retry after {attempts} attempt(s)")]
    Interrupted { attempts: usize },
}

/// Failure to load `RetryOptions` from TOML.
#[cfg(feature = "serde")]
#[derive(Debug, Error)]
pub enum OptionsError {
    #[error("failed to read retry options from {path:?}: {source}")]
    Io {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse retry options: {0}")]
    Parse(#[from] toml::de::Error),
}

#[cfg(test)]
mod tests {
    //! Unit tests for error display and field naming.
    use super::*;

    /// Validates `ConfigError::field` for every variant.
    ///
    /// Assertions:
    /// - Each variant reports the field it guards.
    #[test]
    fn test_config_error_field_names() {
        let ms = Duration::from_millis(1);
        let cases = [
            (ConfigError::Attempts { got: 0 }, "attempts"),
            (ConfigError::Base { got: Duration::ZERO }, "base"),
            (ConfigError::MaxIntervalBelowBase { max_interval: ms, base: ms * 2 }, "max_interval"),
            (ConfigError::MaxWaitBelowBase { max_wait: ms, base: ms * 2 }, "max_wait"),
            (ConfigError::Exponent { got: 0.5 }, "exponent"),
            (ConfigError::Jitter { got: 1.5 }, "jitter"),
        ];

        for (error, field) in cases {
            assert_eq!(error.field(), field);
            assert!(error.to_string().contains(field), "message should name {field}: {error}");
        }
    }

    /// Validates the messages carry the received values.
    #[test]
    fn test_config_error_display_includes_value() {
        assert_eq!(
            ConfigError::Attempts { got: 0 }.to_string(),
            "expected attempts to be at least 1, got 0"
        );
        assert_eq!(
            ConfigError::Jitter { got: 1.5 }.to_string(),
            "expected jitter to be between 0 and 1, got 1.50"
        );
    }

    #[test]
    fn test_retry_error_display() {
        assert_eq!(
            RetryError::MaxAttemptsReached { attempts: 3 }.to_string(),
            "reached maximum attempts (3)"
        );
        assert_eq!(RetryError::NoOperationSupplied.to_string(), "no operation supplied");
    }
}
