use super::{Failure, RetryExecution, RetryPolicy};
use crate::error::{Error, Result};
use std::fmt;

/// The default maximum number of retries: 3.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// A [`RetryPolicy`] that allows a fixed number of retries.
///
/// The initial attempt is not counted, so a policy with `max_attempts = 3`
/// lets an operation run at most four times.
#[derive(Clone, Copy, Debug)]
pub struct MaxAttemptsPolicy {
    max_attempts: u32,
}

impl MaxAttemptsPolicy {
    pub fn new(max_attempts: u32) -> Result<Self> {
        if max_attempts == 0 {
            return Err(Error::InvalidConfiguration(
                "Max attempts must be greater than zero".into(),
            ));
        }
        Ok(Self { max_attempts })
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }
}

impl Default for MaxAttemptsPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

impl RetryPolicy for MaxAttemptsPolicy {
    type Execution = MaxAttemptsExecution;

    fn start(&self) -> Self::Execution {
        MaxAttemptsExecution {
            max_attempts: self.max_attempts,
            retries: 0,
        }
    }
}

impl fmt::Display for MaxAttemptsPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MaxAttemptsPolicy[max_attempts={}]", self.max_attempts)
    }
}

#[derive(Clone, Debug)]
pub struct MaxAttemptsExecution {
    max_attempts: u32,
    retries: u32,
}

impl MaxAttemptsExecution {
    /// Number of times [`should_retry`](RetryExecution::should_retry) has been consulted.
    pub fn retries(&self) -> u32 {
        self.retries
    }
}

impl RetryExecution for MaxAttemptsExecution {
    fn should_retry(&mut self, _failure: &Failure) -> bool {
        self.retries = self.retries.saturating_add(1);
        self.retries <= self.max_attempts
    }
}
