//! Serde-backed retry settings, for wiring a [`RetryTemplate`] from a config file.
//!
//! ```
//! let config = recur::RetryConfig::from_json(
//!     r#"{ "max_attempts": 5, "max_duration_ms": 2000, "backoff": { "kind": "fixed", "interval_ms": 50 } }"#,
//! )
//! .unwrap();
//! let template = config.build().unwrap();
//! assert_eq!(
//!     template.backoff(),
//!     recur::Backoff::fixed(std::time::Duration::from_millis(50))
//! );
//! ```
use crate::backoff::Backoff;
use crate::error::{Error, Result};
use crate::policy::{
    And, MaxAttemptsPolicy, MaxRetryDurationPolicy, RetryPolicyExt, DEFAULT_MAX_ATTEMPTS,
};
use crate::template::RetryTemplate;
use serde::{Deserialize, Serialize};
use std::convert::TryFrom;
use std::time::Duration;

/// The policy produced by [`RetryConfig::build`].
pub type ConfiguredPolicy = And<MaxAttemptsPolicy, Option<MaxRetryDurationPolicy>>;

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RetryConfig {
    /// Maximum number of retries after the initial attempt.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: i64,
    /// Upper bound on the whole retry sequence, in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_duration_ms: Option<i64>,
    #[serde(default)]
    pub backoff: BackoffConfig,
    /// Randomise each backoff delay.
    #[serde(default)]
    pub jitter: bool,
}

fn default_max_attempts() -> i64 {
    i64::from(DEFAULT_MAX_ATTEMPTS)
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            max_duration_ms: None,
            backoff: BackoffConfig::default(),
            jitter: false,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BackoffConfig {
    None,
    Fixed {
        interval_ms: u64,
    },
    Exponential {
        initial_ms: u64,
        multiplier: f64,
        max_ms: u64,
    },
}

impl Default for BackoffConfig {
    fn default() -> Self {
        BackoffConfig::None
    }
}

impl RetryConfig {
    pub fn from_json(s: &str) -> Result<Self> {
        serde_json::from_str(s).map_err(From::from)
    }

    /// Validate the settings and build a [`RetryTemplate`] from them.
    pub fn build(&self) -> Result<RetryTemplate<ConfiguredPolicy>> {
        let max_attempts = u32::try_from(self.max_attempts).map_err(|_| {
            Error::InvalidConfiguration(format!(
                "Max attempts must be between 1 and {}, got {}",
                u32::MAX,
                self.max_attempts
            ))
        })?;
        let attempts = MaxAttemptsPolicy::new(max_attempts)?;

        let duration = match self.max_duration_ms {
            None => None,
            Some(ms) => Some(MaxRetryDurationPolicy::new(positive_millis(ms)?)?),
        };

        let backoff = self.backoff.build()?;
        log::debug!(
            "Built retry template from config: attempts = {}, duration = {:?}, backoff = {:?}",
            max_attempts,
            self.max_duration_ms,
            backoff
        );
        Ok(RetryTemplate::new(attempts.and(duration))
            .with_backoff(backoff)
            .with_jitter(self.jitter))
    }
}

impl BackoffConfig {
    pub fn build(&self) -> Result<Backoff> {
        match *self {
            BackoffConfig::None => Ok(Backoff::None),
            BackoffConfig::Fixed { interval_ms } => {
                Ok(Backoff::fixed(Duration::from_millis(interval_ms)))
            }
            BackoffConfig::Exponential {
                initial_ms,
                multiplier,
                max_ms,
            } => Backoff::exponential(
                Duration::from_millis(initial_ms),
                multiplier,
                Duration::from_millis(max_ms),
            ),
        }
    }
}

fn positive_millis(ms: i64) -> Result<Duration> {
    match u64::try_from(ms) {
        Ok(ms) if ms > 0 => Ok(Duration::from_millis(ms)),
        _ => Err(Error::InvalidConfiguration(format!(
            "Max retry duration must be positive, got {}ms",
            ms
        ))),
    }
}
