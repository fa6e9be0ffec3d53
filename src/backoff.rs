use crate::error::{Error, Result};
use rand::Rng;
use std::time::Duration;

/// Range of the random factor applied by [`jitter`].
pub const JITTER_RANGE: std::ops::RangeInclusive<f64> = 0.8..=1.2;

/// How long to wait between attempts.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Backoff {
    /// Retry immediately.
    None,
    /// Wait the same interval before every retry.
    Fixed(Duration),
    /// Wait `initial * multiplier^(retry - 1)`, never more than `max`.
    Exponential {
        initial: Duration,
        multiplier: f64,
        max: Duration,
    },
}

impl Default for Backoff {
    fn default() -> Self {
        Backoff::None
    }
}

impl Backoff {
    pub fn fixed(interval: Duration) -> Self {
        Backoff::Fixed(interval)
    }

    pub fn exponential(initial: Duration, multiplier: f64, max: Duration) -> Result<Self> {
        if !multiplier.is_finite() || multiplier < 1.0 {
            return Err(Error::InvalidConfiguration(format!(
                "Backoff multiplier must be a finite value >= 1.0, got {}",
                multiplier
            )));
        }
        if initial == Duration::ZERO {
            return Err(Error::InvalidConfiguration(
                "Initial backoff must be positive".into(),
            ));
        }
        if initial > max {
            return Err(Error::InvalidConfiguration(format!(
                "Initial backoff {}ms exceeds maximum {}ms",
                initial.as_millis(),
                max.as_millis()
            )));
        }
        Ok(Backoff::Exponential {
            initial,
            multiplier,
            max,
        })
    }

    /// Delay before the given retry. `retry` is 1-based.
    pub fn delay(&self, retry: u32) -> Duration {
        match *self {
            Backoff::None => Duration::ZERO,
            Backoff::Fixed(interval) => interval,
            Backoff::Exponential {
                initial,
                multiplier,
                max,
            } => {
                if initial == Duration::ZERO {
                    return Duration::ZERO;
                }
                let exponent = retry.saturating_sub(1).min(i32::MAX as u32) as i32;
                let secs = initial.as_secs_f64() * multiplier.powi(exponent);
                if !secs.is_finite() || secs >= max.as_secs_f64() {
                    max
                } else {
                    Duration::from_secs_f64(secs)
                }
            }
        }
    }
}

/// Scale `delay` by a random factor in [`JITTER_RANGE`].
pub fn jitter(delay: Duration) -> Duration {
    let factor = rand::thread_rng().gen_range(JITTER_RANGE);
    let secs = delay.as_secs_f64() * factor;
    if secs.is_finite() && secs < u64::MAX as f64 {
        Duration::from_secs_f64(secs)
    } else {
        delay
    }
}
