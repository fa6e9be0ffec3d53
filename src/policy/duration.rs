use super::{Failure, RetryExecution, RetryPolicy};
use crate::clock::{Clock, MonotonicClock};
use crate::error::{Error, Result};
use std::fmt;
use std::time::{Duration, Instant};

/// The default maximum retry duration: 3 seconds.
pub const DEFAULT_MAX_RETRY_DURATION: Duration = Duration::from_secs(3);

/// A [`RetryPolicy`] that keeps retrying as long as the total time elapsed since
/// the sequence started stays within a maximum duration.
///
/// The failure itself is never inspected; every failure is treated the same.
/// Combine with [`retry_if`](super::RetryPolicyExt::retry_if) to filter by
/// failure type.
#[derive(Clone, Debug)]
pub struct MaxRetryDurationPolicy<C = MonotonicClock> {
    max_retry_duration: Duration,
    clock: C,
}

impl MaxRetryDurationPolicy {
    /// Create a policy bounded by `max_retry_duration`, which must be non-zero.
    pub fn new(max_retry_duration: Duration) -> Result<Self> {
        Self::with_clock(max_retry_duration, MonotonicClock)
    }
}

impl Default for MaxRetryDurationPolicy {
    fn default() -> Self {
        Self {
            max_retry_duration: DEFAULT_MAX_RETRY_DURATION,
            clock: MonotonicClock,
        }
    }
}

impl<C: Clock> MaxRetryDurationPolicy<C> {
    /// Create a policy that reads time from `clock`.
    pub fn with_clock(max_retry_duration: Duration, clock: C) -> Result<Self> {
        validate(max_retry_duration)?;
        Ok(Self {
            max_retry_duration,
            clock,
        })
    }

    pub fn max_retry_duration(&self) -> Duration {
        self.max_retry_duration
    }

    /// Replace the maximum retry duration. On error the current value is kept.
    ///
    /// Executions already started keep the bound they were started with.
    pub fn set_max_retry_duration(&mut self, max_retry_duration: Duration) -> Result<()> {
        validate(max_retry_duration)?;
        self.max_retry_duration = max_retry_duration;
        Ok(())
    }
}

fn validate(max_retry_duration: Duration) -> Result<()> {
    if max_retry_duration == Duration::ZERO {
        return Err(Error::InvalidConfiguration(
            "Max retry duration must be positive".into(),
        ));
    }
    Ok(())
}

impl<C: Clock + Clone> RetryPolicy for MaxRetryDurationPolicy<C> {
    type Execution = MaxRetryDurationExecution<C>;

    fn start(&self) -> Self::Execution {
        let execution = MaxRetryDurationExecution {
            retry_start_time: self.clock.now(),
            max_retry_duration: self.max_retry_duration,
            clock: self.clock.clone(),
        };
        log::trace!("Starting {}", execution);
        execution
    }
}

impl<C> fmt::Display for MaxRetryDurationPolicy<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "MaxRetryDurationPolicy[max_retry_duration={}ms]",
            self.max_retry_duration.as_millis()
        )
    }
}

/// Tracks one attempt sequence started by [`MaxRetryDurationPolicy`].
#[derive(Clone, Debug)]
pub struct MaxRetryDurationExecution<C = MonotonicClock> {
    retry_start_time: Instant,
    max_retry_duration: Duration,
    clock: C,
}

impl<C: Clock> MaxRetryDurationExecution<C> {
    pub fn retry_start_time(&self) -> Instant {
        self.retry_start_time
    }

    /// Time elapsed since the sequence started.
    pub fn elapsed(&self) -> Duration {
        self.clock
            .now()
            .saturating_duration_since(self.retry_start_time)
    }

    /// `true` once the elapsed time has exceeded the bound.
    pub fn is_expired(&self) -> bool {
        self.elapsed() > self.max_retry_duration
    }
}

impl<C: Clock> RetryExecution for MaxRetryDurationExecution<C> {
    fn should_retry(&mut self, _failure: &Failure) -> bool {
        let elapsed = self.elapsed();
        let retry = elapsed <= self.max_retry_duration;
        log::debug!(
            "Retry sequence elapsed {}ms of {}ms, retry = {}",
            elapsed.as_millis(),
            self.max_retry_duration.as_millis(),
            retry
        );
        retry
    }
}

impl<C> fmt::Display for MaxRetryDurationExecution<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "MaxRetryDurationExecution[retry_start_time={:?}, max_retry_duration={}ms]",
            self.retry_start_time,
            self.max_retry_duration.as_millis()
        )
    }
}
