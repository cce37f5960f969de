//! The retry executor
//!
//! A [`Retrier`] is built once from validated [`RetryOptions`] and an optional
//! [`RetryPolicy`], then used for any number of executions, possibly from many
//! threads at once. Each execution:
//!
//! 1. invokes the operation,
//! 2. stops on success, on a failure the policy rejects, or once `attempts`
//!    invocations have failed,
//! 3. otherwise computes the next backoff delay and sleeps it, unless the
//!    running total of delays would reach `max_wait`.
//!
//! Every failure is kept, in order, in the returned [`Execution`].
//!
//! ```
//! use std::time::Duration;
//!
//! use tryer::{Outcome, Retrier, RetryOptions};
//!
//! let options = RetryOptions::builder()
//!     .attempts(3)
//!     .base(Duration::from_millis(1))
//!     .max_interval(Duration::from_millis(5))
//!     .max_wait(Duration::from_millis(50))
//!     .build()
//!     .unwrap();
//! let retrier = Retrier::with_policy(|err: &&str| *err != "permanent", options).unwrap();
//!
//! let mut calls = 0;
//! let execution = retrier.run(|| {
//!     calls += 1;
//!     if calls < 3 { Err("transient") } else { Ok(calls) }
//! });
//!
//! assert_eq!(execution.failures, vec!["transient", "transient"]);
//! assert_eq!(execution.outcome, Outcome::Success(3));
//! ```

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tracing::instrument;

use crate::backoff::Backoff;
use crate::cancel::CancelToken;
use crate::config::RetryOptions;
use crate::error::{ConfigError, RetryError};
use crate::seed::SeedSequence;
use crate::sleeper::{Sleeper, ThreadSleeper, Wake};
use crate::trace::{ExecutionLog, UNNAMED_OPERATION};

/// Decides whether a failure is worth another attempt.
///
/// Only ever called with the error of the attempt that just failed.
pub type RetryPolicy<E> = Arc<dyn Fn(&E) -> bool + Send + Sync>;

/// How an execution ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<T> {
    /// The operation succeeded and returned this value
    Success(T),
    /// The retry policy rejected the latest failure
    Cancelled,
    /// The next delay would have used up the cumulative wait budget
    TimedOut,
    /// Every permitted attempt failed
    MaxAttemptsReached,
    /// No operation was given; nothing ran
    NoOperationSupplied,
    /// A cancellation token fired before or during a delay
    Interrupted,
}

impl<T> Outcome<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }
}

impl<T> fmt::Display for Outcome<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success(_) => write!(f, "success"),
            Self::Cancelled => write!(f, "cancelled by retry policy"),
            Self::TimedOut => write!(f, "timed out"),
            Self::MaxAttemptsReached => write!(f, "max attempts reached"),
            Self::NoOperationSupplied => write!(f, "no operation supplied"),
            Self::Interrupted => write!(f, "interrupted"),
        }
    }
}

/// Record of one execution
#[derive(Debug, Clone)]
pub struct Execution<T, E> {
    /// Errors from failed attempts, in attempt order
    pub failures: Vec<E>,
    /// Terminal outcome
    pub outcome: Outcome<T>,
    /// Delays actually slept between attempts, in order
    pub delays: Vec<Duration>,
}

impl<T, E> Execution<T, E> {
    fn finish(failures: Vec<E>, delays: Vec<Duration>, outcome: Outcome<T>) -> Self {
        Self { failures, outcome, delays }
    }

    /// Number of times the operation was invoked
    pub fn attempts(&self) -> usize {
        self.failures.len() + usize::from(self.outcome.is_success())
    }

    pub fn is_success(&self) -> bool {
        self.outcome.is_success()
    }

    /// Total time spent sleeping between attempts
    pub fn total_delay(&self) -> Duration {
        self.delays.iter().sum()
    }

    /// Mean delay between attempts, `None` if no delay was slept
    pub fn average_delay(&self) -> Option<Duration> {
        let count = u32::try_from(self.delays.len()).ok().filter(|count| *count > 0)?;
        Some(self.total_delay() / count)
    }

    /// Error from the most recent failed attempt
    pub fn last_failure(&self) -> Option<&E> {
        self.failures.last()
    }

    /// Convert into the success value or the reason there is none.
    ///
    /// The per-attempt errors are dropped; read [`Execution::failures`] first
    /// if they matter.
    pub fn into_result(self) -> Result<T, RetryError> {
        let attempts = self.attempts();
        let waited = self.total_delay();
        match self.outcome {
            Outcome::Success(value) => Ok(value),
            Outcome::Cancelled => Err(RetryError::Cancelled { attempts }),
            Outcome::TimedOut => Err(RetryError::TimedOut { attempts, waited }),
            Outcome::MaxAttemptsReached => Err(RetryError::MaxAttemptsReached { attempts }),
            Outcome::NoOperationSupplied => Err(RetryError::NoOperationSupplied),
            Outcome::Interrupted => Err(RetryError::Interrupted { attempts }),
        }
    }
}

/// Immutable, validated retry executor
///
/// `E` is the operation's error type; `S` decides how delays are waited out.
pub struct Retrier<E, S = ThreadSleeper> {
    options: RetryOptions,
    backoff: Backoff,
    policy: Option<RetryPolicy<E>>,
    sleeper: S,
    name: Option<String>,
    seeds: SeedSequence,
}

impl<E> Retrier<E, ThreadSleeper> {
    /// Build a retrier that treats every failure as retryable.
    pub fn new(options: RetryOptions) -> Result<Self, ConfigError> {
        Self::with_optional_policy(None, options)
    }

    /// Build a retrier that consults `policy` after every failure.
    pub fn with_policy<P>(policy: P, options: RetryOptions) -> Result<Self, ConfigError>
    where
        P: Fn(&E) -> bool + Send + Sync + 'static,
    {
        Self::with_optional_policy(Some(Arc::new(policy)), options)
    }

    /// Build a retrier from an optional policy.
    ///
    /// The options are validated here and never again.
    pub fn with_optional_policy(
        policy: Option<RetryPolicy<E>>,
        options: RetryOptions,
    ) -> Result<Self, ConfigError> {
        options.validate()?;
        Ok(Self {
            backoff: Backoff::new(&options),
            options,
            policy,
            sleeper: ThreadSleeper,
            name: None,
            seeds: SeedSequence::from_clock(),
        })
    }
}

impl<E, S> Retrier<E, S> {
    /// Replace the sleeper, keeping everything else.
    pub fn with_sleeper<S2: Sleeper>(self, sleeper: S2) -> Retrier<E, S2> {
        Retrier {
            options: self.options,
            backoff: self.backoff,
            policy: self.policy,
            sleeper,
            name: self.name,
            seeds: self.seeds,
        }
    }

    /// Label used in log events.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn name(&self) -> &str {
        self.name.as_deref().unwrap_or(UNNAMED_OPERATION)
    }

    pub fn options(&self) -> &RetryOptions {
        &self.options
    }

    pub fn backoff(&self) -> &Backoff {
        &self.backoff
    }

    pub fn has_policy(&self) -> bool {
        self.policy.is_some()
    }

    fn should_retry(&self, error: &E) -> bool {
        self.policy.as_ref().map_or(true, |policy| policy(error))
    }
}

impl<E, S> Retrier<E, S>
where
    E: fmt::Debug,
    S: Sleeper,
{
    /// Run `operation` under this retrier's budgets.
    pub fn run<T, F>(&self, operation: F) -> Execution<T, E>
    where
        F: FnMut() -> Result<T, E>,
    {
        self.drive(Some(operation), None)
    }

    /// Like [`run`](Self::run), but `None` yields
    /// [`Outcome::NoOperationSupplied`] without doing anything.
    pub fn execute<T, F>(&self, operation: Option<F>) -> Execution<T, E>
    where
        F: FnMut() -> Result<T, E>,
    {
        self.drive(operation, None)
    }

    /// Run `operation`, giving up with [`Outcome::Interrupted`] as soon as
    /// `cancel` fires while waiting between attempts.
    pub fn run_cancellable<T, F>(&self, operation: F, cancel: &CancelToken) -> Execution<T, E>
    where
        F: FnMut() -> Result<T, E>,
    {
        self.drive(Some(operation), Some(cancel))
    }

    /// Optional-operation form of [`run_cancellable`](Self::run_cancellable).
    pub fn execute_cancellable<T, F>(
        &self,
        operation: Option<F>,
        cancel: &CancelToken,
    ) -> Execution<T, E>
    where
        F: FnMut() -> Result<T, E>,
    {
        self.drive(operation, Some(cancel))
    }

    #[instrument(
        skip_all,
        fields(operation = self.name(), max_attempts = self.options.attempts)
    )]
    fn drive<T, F>(&self, operation: Option<F>, cancel: Option<&CancelToken>) -> Execution<T, E>
    where
        F: FnMut() -> Result<T, E>,
    {
        let Some(mut operation) = operation else {
            tracing::debug!(operation = self.name(), "No operation supplied");
            return Execution::finish(Vec::new(), Vec::new(), Outcome::NoOperationSupplied);
        };

        let log = ExecutionLog::start(self.name(), self.options.attempts);
        let mut rng = self.seeds.rng();
        let mut failures = Vec::new();
        let mut delays = Vec::new();
        let mut slept = Duration::ZERO;

        for retry in 0..self.options.attempts {
            let attempt = failures.len() + 1;
            log.record_attempt(attempt);

            let error = match operation() {
                Ok(value) => {
                    log.record_success(attempt, slept);
                    return Execution::finish(failures, delays, Outcome::Success(value));
                }
                Err(error) => error,
            };

            log.record_failure(attempt, &error);
            let retryable = self.should_retry(&error);
            failures.push(error);

            if !retryable {
                log.record_cancelled(attempt);
                return Execution::finish(failures, delays, Outcome::Cancelled);
            }

            // The budget applies to the delay after the final attempt as well,
            // even though that delay is never slept.
            let delay = self.backoff.delay(retry, &mut rng);
            let total = slept.saturating_add(delay);
            if total >= self.options.max_wait {
                log.record_timeout(attempt, delay, self.options.max_wait);
                return Execution::finish(failures, delays, Outcome::TimedOut);
            }

            if retry + 1 == self.options.attempts {
                break;
            }

            log.record_delay(attempt, delay, total);
            match self.sleeper.sleep(delay, cancel) {
                Wake::Elapsed => {
                    slept = total;
                    delays.push(delay);
                }
                Wake::Cancelled => {
                    log.record_interrupted(attempt);
                    return Execution::finish(failures, delays, Outcome::Interrupted);
                }
            }
        }

        log.record_exhausted(slept);
        Execution::finish(failures, delays, Outcome::MaxAttemptsReached)
    }
}

impl<E, S: fmt::Debug> fmt::Debug for Retrier<E, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Retrier")
            .field("name", &self.name())
            .field("options", &self.options)
            .field("policy", &self.policy.as_ref().map(|_| "<function>"))
            .field("sleeper", &self.sleeper)
            .finish_non_exhaustive()
    }
}
