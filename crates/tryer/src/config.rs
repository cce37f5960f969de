//! Retry configuration
//!
//! [`RetryOptions`] describes the shape of a backoff curve and the budgets an
//! execution may spend. It is plain data: nothing is validated until the
//! options are handed to [`Retrier::new`](crate::Retrier::new) (or checked
//! explicitly with [`RetryOptions::validate`]), after which the retrier keeps
//! its own immutable copy.
//!
//! With the `serde` feature the options can be loaded from TOML. Durations are
//! written as integer milliseconds and every field falls back to its default
//! when omitted:
//!
//! ```toml
//! attempts = 5
//! base = 50          # milliseconds
//! max_interval = 2000
//! max_wait = 10000
//! exponent = 1.5
//! jitter = 0.25
//! ```

use std::time::Duration;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Default number of total invocations
pub const DEFAULT_ATTEMPTS: u32 = 3;

/// Default delay before the first retry
pub const DEFAULT_BASE: Duration = Duration::from_millis(30);

/// Default ceiling for a single delay
pub const DEFAULT_MAX_INTERVAL: Duration = Duration::from_secs(1);

/// Default ceiling for the sum of all delays
pub const DEFAULT_MAX_WAIT: Duration = Duration::from_secs(2);

/// Default growth rate of the backoff curve
pub const DEFAULT_EXPONENT: f64 = 2.0;

/// Default share of each delay subject to randomization
pub const DEFAULT_JITTER: f64 = 0.5;

/// Configuration for a [`Retrier`](crate::Retrier)
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default, deny_unknown_fields))]
pub struct RetryOptions {
    /// Hard ceiling on the number of operation invocations (>= 1)
    pub attempts: u32,
    /// Delay before the first retry (> 0)
    #[cfg_attr(feature = "serde", serde(with = "duration_millis"))]
    pub base: Duration,
    /// Ceiling applied to any single delay (>= `base`)
    #[cfg_attr(feature = "serde", serde(with = "duration_millis"))]
    pub max_interval: Duration,
    /// Ceiling on the cumulative delay across all retries (>= `base`)
    #[cfg_attr(feature = "serde", serde(with = "duration_millis"))]
    pub max_wait: Duration,
    /// Growth rate of the backoff curve (>= 1)
    pub exponent: f64,
    /// Fraction of each delay subject to randomization, in `[0, 1]`
    ///
    /// For a computed delay of 300ms:
    ///
    /// | jitter | resulting delay |
    /// |--------|-----------------|
    /// | 0      | exactly 300ms |
    /// | 0.25   | between 225ms and 300ms |
    /// | 0.5    | between 150ms and 300ms |
    /// | 1      | between 0 and 300ms |
    pub jitter: f64,
}

impl Default for RetryOptions {
    fn default() -> Self {
        Self {
            attempts: DEFAULT_ATTEMPTS,
            base: DEFAULT_BASE,
            max_interval: DEFAULT_MAX_INTERVAL,
            max_wait: DEFAULT_MAX_WAIT,
            exponent: DEFAULT_EXPONENT,
            jitter: DEFAULT_JITTER,
        }
    }
}

impl RetryOptions {
    /// Create a builder seeded with the defaults
    pub fn builder() -> RetryOptionsBuilder {
        RetryOptionsBuilder::new()
    }

    /// Check every invariant, in field order, returning the first violation.
    ///
    /// NaN is rejected for both `exponent` and `jitter`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.attempts < 1 {
            return Err(ConfigError::Attempts { got: self.attempts });
        }

        if self.base.is_zero() {
            return Err(ConfigError::Base { got: self.base });
        }

        if self.max_interval < self.base {
            return Err(ConfigError::MaxIntervalBelowBase {
                max_interval: self.max_interval,
                base: self.base,
            });
        }

        if self.max_wait < self.base {
            return Err(ConfigError::MaxWaitBelowBase { max_wait: self.max_wait, base: self.base });
        }

        if self.exponent.is_nan() || self.exponent < 1.0 {
            return Err(ConfigError::Exponent { got: self.exponent });
        }

        if !(0.0..=1.0).contains(&self.jitter) {
            return Err(ConfigError::Jitter { got: self.jitter });
        }

        Ok(())
    }

    /// Parse options from a TOML document. Missing fields take their defaults.
    ///
    /// The result is not validated.
    #[cfg(feature = "serde")]
    pub fn from_toml_str(input: &str) -> Result<Self, crate::error::OptionsError> {
        Ok(toml::from_str(input)?)
    }

    /// Read and parse options from a TOML file.
    ///
    /// The result is not validated.
    #[cfg(feature = "serde")]
    pub fn from_toml_file(
        path: impl AsRef<std::path::Path>,
    ) -> Result<Self, crate::error::OptionsError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| {
            crate::error::OptionsError::Io { path: path.to_path_buf(), source }
        })?;
        let options = Self::from_toml_str(&contents)?;
        tracing::debug!(path = %path.display(), "Loaded retry options from file");
        Ok(options)
    }
}

/// Builder for [`RetryOptions`] with a fluent API
#[derive(Debug, Default)]
pub struct RetryOptionsBuilder {
    options: RetryOptions,
}

impl RetryOptionsBuilder {
    pub fn new() -> Self {
        Self { options: RetryOptions::default() }
    }

    pub fn attempts(mut self, attempts: u32) -> Self {
        self.options.attempts = attempts;
        self
    }

    pub fn base(mut self, base: Duration) -> Self {
        self.options.base = base;
        self
    }

    pub fn max_interval(mut self, max_interval: Duration) -> Self {
        self.options.max_interval = max_interval;
        self
    }

    pub fn max_wait(mut self, max_wait: Duration) -> Self {
        self.options.max_wait = max_wait;
        self
    }

    pub fn exponent(mut self, exponent: f64) -> Self {
        self.options.exponent = exponent;
        self
    }

    pub fn jitter(mut self, jitter: f64) -> Self {
        self.options.jitter = jitter;
        self
    }

    /// Disable randomization so every delay equals its capped value
    pub fn no_jitter(self) -> Self {
        self.jitter(0.0)
    }

    /// Validate and return the options
    pub fn build(self) -> Result<RetryOptions, ConfigError> {
        self.options.validate()?;
        Ok(self.options)
    }
}

/// Serde adapter storing a `Duration` as integer milliseconds
///
/// ```rust
/// use std::time::Duration;
///
/// use serde::{Deserialize, Serialize};
/// use tryer::config::duration_millis;
///
/// #[derive(Serialize, Deserialize)]
/// struct Example {
///     #[serde(with = "duration_millis")]
///     timeout: Duration,
/// }
/// ```
#[cfg(feature = "serde")]
pub mod duration_millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    /// Serde serialization result type
    type SerializeResult<S> = Result<<S as Serializer>::Ok, <S as Serializer>::Error>;

    /// Serialize a Duration as milliseconds (u64), saturating at `u64::MAX`
    pub fn serialize<S>(duration: &Duration, serializer: S) -> SerializeResult<S>
    where
        S: Serializer,
    {
        let millis = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX);
        serializer.serialize_u64(millis)
    }

    /// Deserialize milliseconds (u64) into a Duration
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}
