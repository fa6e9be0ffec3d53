//! recur is a library of strongly typed retry policies, with built-in support
//! for duration and attempt bounds, failure filtering, backoff and async retry loops.
//!
//! A [`RetryPolicy`] is configured once and then starts one independent
//! [`RetryExecution`] per attempt sequence. A [`RetryTemplate`] drives the loop.
//!
//! ```
//! use recur::{MaxRetryDurationPolicy, RetryTemplate};
//! use std::time::Duration;
//!
//! let policy = MaxRetryDurationPolicy::new(Duration::from_millis(500)).unwrap();
//! let mut calls = 0;
//! let result = RetryTemplate::new(policy).execute(|| {
//!     calls += 1;
//!     if calls < 3 {
//!         Err(std::io::Error::new(std::io::ErrorKind::Other, "flaky"))
//!     } else {
//!         Ok(calls)
//!     }
//! });
//! assert_eq!(result.unwrap(), 3);
//! ```
pub mod backoff;
pub mod clock;
mod config;
mod error;
#[cfg(feature = "http")]
pub mod http;
pub mod policy;
mod template;

pub use backoff::Backoff;
pub use config::{BackoffConfig, ConfiguredPolicy, RetryConfig};
pub use error::{Error, Result, RetryError};
pub use policy::{
    MaxAttemptsPolicy, MaxRetryDurationPolicy, RetryExecution, RetryPolicy, RetryPolicyExt,
};
pub use template::{RetryListener, RetryTemplate};
