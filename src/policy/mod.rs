//! Retry policies decide, after each failed attempt, whether another attempt
//! should be made.
//!
//! A [`RetryPolicy`] is a reusable, configured rule. Every time a retryable
//! operation begins, the policy manufactures a fresh [`RetryExecution`] that
//! tracks the state of that one attempt sequence (start time, attempt count,
//! ...). Policies compose through [`RetryPolicyExt`].
use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;

mod attempts;
mod duration;

pub use attempts::{MaxAttemptsExecution, MaxAttemptsPolicy, DEFAULT_MAX_ATTEMPTS};
pub use duration::{
    MaxRetryDurationExecution, MaxRetryDurationPolicy, DEFAULT_MAX_RETRY_DURATION,
};

/// The failure handed to [`RetryExecution::should_retry`].
pub type Failure = dyn StdError + 'static;

/// A configured retry rule that creates one [`RetryExecution`] per attempt sequence.
pub trait RetryPolicy {
    /// The per-sequence state produced by [`start`](RetryPolicy::start).
    type Execution: RetryExecution;

    /// Begin a new attempt sequence. Each call yields an independent execution.
    fn start(&self) -> Self::Execution;
}

/// The state of a single attempt sequence.
pub trait RetryExecution {
    /// Called after an attempt failed with `failure`. Returns `true` if
    /// another attempt may be made.
    ///
    /// Once this returns `false` callers are expected to stop and propagate
    /// the failure; executions do not enforce that themselves.
    fn should_retry(&mut self, failure: &Failure) -> bool;
}

/// Combinators available on every [`RetryPolicy`].
pub trait RetryPolicyExt: RetryPolicy + Sized {
    /// Retry only while both `self` and `other` allow it.
    fn and<Q: RetryPolicy>(self, other: Q) -> And<Self, Q> {
        And {
            first: self,
            second: other,
        }
    }

    /// Never retry failures for which `predicate` returns `false`; defer to
    /// `self` for the rest.
    fn retry_if<F>(self, predicate: F) -> RetryIf<Self, F>
    where
        F: Fn(&Failure) -> bool,
    {
        RetryIf {
            inner: self,
            predicate: Arc::new(predicate),
        }
    }
}

impl<P: RetryPolicy> RetryPolicyExt for P {}

/// Policy created by [`RetryPolicyExt::and`].
#[derive(Clone, Debug)]
pub struct And<A, B> {
    first: A,
    second: B,
}

impl<A: RetryPolicy, B: RetryPolicy> RetryPolicy for And<A, B> {
    type Execution = And<A::Execution, B::Execution>;

    fn start(&self) -> Self::Execution {
        And {
            first: self.first.start(),
            second: self.second.start(),
        }
    }
}

impl<A: RetryExecution, B: RetryExecution> RetryExecution for And<A, B> {
    fn should_retry(&mut self, failure: &Failure) -> bool {
        // Both sides see every failure so counters stay in step.
        let first = self.first.should_retry(failure);
        let second = self.second.should_retry(failure);
        first && second
    }
}

impl<A: fmt::Display, B: fmt::Display> fmt::Display for And<A, B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} && {}", self.first, self.second)
    }
}

/// Policy created by [`RetryPolicyExt::retry_if`].
pub struct RetryIf<P, F> {
    inner: P,
    predicate: Arc<F>,
}

impl<P: Clone, F> Clone for RetryIf<P, F> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            predicate: Arc::clone(&self.predicate),
        }
    }
}

impl<P: fmt::Debug, F> fmt::Debug for RetryIf<P, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryIf").field("inner", &self.inner).finish()
    }
}

impl<P, F> RetryPolicy for RetryIf<P, F>
where
    P: RetryPolicy,
    F: Fn(&Failure) -> bool,
{
    type Execution = RetryIf<P::Execution, F>;

    fn start(&self) -> Self::Execution {
        RetryIf {
            inner: self.inner.start(),
            predicate: Arc::clone(&self.predicate),
        }
    }
}

impl<E, F> RetryExecution for RetryIf<E, F>
where
    E: RetryExecution,
    F: Fn(&Failure) -> bool,
{
    fn should_retry(&mut self, failure: &Failure) -> bool {
        if !(self.predicate)(failure) {
            log::debug!("Failure rejected by retry predicate: {}", failure);
            return false;
        }
        self.inner.should_retry(failure)
    }
}

/// An absent policy imposes no constraint.
impl<P: RetryPolicy> RetryPolicy for Option<P> {
    type Execution = Option<P::Execution>;

    fn start(&self) -> Self::Execution {
        self.as_ref().map(|policy| policy.start())
    }
}

impl<E: RetryExecution> RetryExecution for Option<E> {
    fn should_retry(&mut self, failure: &Failure) -> bool {
        match self {
            Some(execution) => execution.should_retry(failure),
            None => true,
        }
    }
}
