use crate::backoff::{self, Backoff};
use crate::error::RetryError;
use crate::policy::{Failure, RetryExecution, RetryPolicy};
use futures::prelude::*;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Callbacks invoked by [`RetryTemplate`] as an attempt sequence progresses.
///
/// All methods default to doing nothing.
pub trait RetryListener: Send + Sync {
    /// Called after attempt number `attempt` failed and before the next one runs.
    fn before_retry(&self, _attempt: u32, _failure: &Failure) {}

    /// Called once the operation succeeded after `attempts` attempts.
    fn on_success(&self, _attempts: u32) {}

    /// Called when the policy refused another attempt.
    fn on_exhausted(&self, _attempts: u32, _failure: &Failure) {}
}

/// Runs an operation until it succeeds or the [`RetryPolicy`] says to stop.
///
/// The template itself is immutable once built, so it can be shared freely;
/// each call to [`execute`](RetryTemplate::execute) starts an independent
/// [`RetryExecution`].
#[derive(Clone)]
pub struct RetryTemplate<P> {
    policy: P,
    backoff: Backoff,
    jitter: bool,
    listeners: Vec<Arc<dyn RetryListener>>,
}

impl<P: RetryPolicy> RetryTemplate<P> {
    /// Create a new `RetryTemplate` that retries immediately.
    pub fn new(policy: P) -> Self {
        Self {
            policy,
            backoff: Backoff::None,
            jitter: false,
            listeners: Vec::new(),
        }
    }

    /// Wait according to `backoff` between attempts
    pub fn with_backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }

    /// Randomise each backoff delay by a factor in [`JITTER_RANGE`](crate::backoff::JITTER_RANGE)
    pub fn with_jitter(mut self, jitter: bool) -> Self {
        self.jitter = jitter;
        self
    }

    /// Register a listener
    pub fn with_listener<L: RetryListener + 'static>(mut self, listener: L) -> Self {
        self.listeners.push(Arc::new(listener));
        self
    }

    pub fn policy(&self) -> &P {
        &self.policy
    }

    pub fn backoff(&self) -> Backoff {
        self.backoff
    }

    pub fn jitter(&self) -> bool {
        self.jitter
    }

    fn delay(&self, retry: u32) -> Duration {
        let delay = self.backoff.delay(retry);
        if self.jitter {
            backoff::jitter(delay)
        } else {
            delay
        }
    }

    /// Run `operation`, blocking the current thread between attempts.
    pub fn execute<T, E, F>(&self, mut operation: F) -> Result<T, RetryError<E>>
    where
        F: FnMut() -> Result<T, E>,
        E: std::error::Error + 'static,
    {
        let mut sequence = Sequence::new(self);
        loop {
            match operation() {
                Ok(value) => {
                    sequence.succeeded();
                    return Ok(value);
                }
                Err(e) => match sequence.failed(e) {
                    Ok(delay) => {
                        if delay > Duration::ZERO {
                            std::thread::sleep(delay);
                        }
                    }
                    Err(exhausted) => return Err(exhausted),
                },
            }
        }
    }

    /// Run the future returned by `operation`, sleeping on the tokio timer
    /// between attempts.
    pub async fn execute_async<T, E, F, Fut>(&self, mut operation: F) -> Result<T, RetryError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: std::error::Error + 'static,
    {
        let mut sequence = Sequence::new(self);
        loop {
            match operation().await {
                Ok(value) => {
                    sequence.succeeded();
                    return Ok(value);
                }
                Err(e) => match sequence.failed(e) {
                    Ok(delay) => {
                        if delay > Duration::ZERO {
                            tokio::time::sleep(delay).await;
                        }
                    }
                    Err(exhausted) => return Err(exhausted),
                },
            }
        }
    }
}

impl<P: fmt::Debug> fmt::Debug for RetryTemplate<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryTemplate")
            .field("policy", &self.policy)
            .field("backoff", &self.backoff)
            .field("jitter", &self.jitter)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

// Bookkeeping shared by the sync and async loops.
struct Sequence<'a, P: RetryPolicy, E> {
    template: &'a RetryTemplate<P>,
    execution: P::Execution,
    attempts: u32,
    failures: Vec<E>,
}

impl<'a, P, E> Sequence<'a, P, E>
where
    P: RetryPolicy,
    E: std::error::Error + 'static,
{
    fn new(template: &'a RetryTemplate<P>) -> Self {
        Self {
            template,
            execution: template.policy.start(),
            attempts: 1,
            failures: Vec::new(),
        }
    }

    fn succeeded(&self) {
        if self.attempts > 1 {
            log::debug!("Operation succeeded after {} attempts", self.attempts);
        }
        for listener in &self.template.listeners {
            listener.on_success(self.attempts);
        }
    }

    /// Returns the delay before the next attempt, or the final error.
    fn failed(&mut self, failure: E) -> Result<Duration, RetryError<E>> {
        if !self.execution.should_retry(&failure) {
            log::warn!(
                "Giving up after {} attempt(s), last failure: {}",
                self.attempts,
                failure
            );
            for listener in &self.template.listeners {
                listener.on_exhausted(self.attempts, &failure);
            }
            return Err(RetryError {
                attempts: self.attempts,
                last: failure,
                suppressed: std::mem::take(&mut self.failures),
            });
        }

        let delay = self.template.delay(self.attempts);
        log::debug!(
            "Attempt {} failed: {}. Retrying in {}ms",
            self.attempts,
            failure,
            delay.as_millis()
        );
        for listener in &self.template.listeners {
            listener.before_retry(self.attempts, &failure);
        }
        self.failures.push(failure);
        self.attempts += 1;
        Ok(delay)
    }
}
