use std::fmt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Failed to parse retry configuration: {0}")]
    Parse(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Returned by [`RetryTemplate`](crate::RetryTemplate) once the policy refuses
/// another attempt.
///
/// `last` is the failure that ended the sequence; `suppressed` holds every
/// earlier failure in the order they occurred.
#[derive(Debug)]
pub struct RetryError<E> {
    pub attempts: u32,
    pub last: E,
    pub suppressed: Vec<E>,
}

impl<E> RetryError<E> {
    /// Discard the bookkeeping and return the final failure.
    pub fn into_inner(self) -> E {
        self.last
    }
}

impl<E: fmt::Display> fmt::Display for RetryError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Retry policy exhausted after {} attempt(s): {}",
            self.attempts, self.last
        )
    }
}

impl<E> std::error::Error for RetryError<E>
where
    E: std::error::Error + 'static,
{
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.last)
    }
}
