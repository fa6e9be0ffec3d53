//! Classification of [`reqwest`] failures, for use with
//! [`retry_if`](crate::RetryPolicyExt::retry_if).
use crate::policy::Failure;
use reqwest::StatusCode;

/// Which kinds of HTTP failure are worth another attempt.
#[derive(Clone, Copy, Debug)]
pub struct HttpRetryOptions {
    pub retry_on_client_error: bool,
    pub retry_on_server_error: bool,
    pub retry_on_timeout: bool,
    pub retry_on_connect: bool,
}

impl Default for HttpRetryOptions {
    fn default() -> Self {
        Self {
            retry_on_client_error: false,
            retry_on_server_error: true,
            retry_on_timeout: true,
            retry_on_connect: true,
        }
    }
}

impl HttpRetryOptions {
    /// Whether `err` is a transient failure under these options.
    ///
    /// `429 Too Many Requests` is always considered transient.
    pub fn is_transient(&self, err: &reqwest::Error) -> bool {
        if err.is_timeout() {
            return self.retry_on_timeout;
        }
        if err.is_connect() {
            return self.retry_on_connect;
        }
        match err.status() {
            Some(StatusCode::TOO_MANY_REQUESTS) => true,
            Some(status) if status.is_client_error() => self.retry_on_client_error,
            Some(status) if status.is_server_error() => self.retry_on_server_error,
            _ => false,
        }
    }

    /// Look for a [`reqwest::Error`] in `failure`'s source chain and classify
    /// it. Failures that did not come from reqwest are not retried.
    pub fn classify(&self, failure: &Failure) -> bool {
        let mut current = Some(failure);
        while let Some(err) = current {
            if let Some(err) = err.downcast_ref::<reqwest::Error>() {
                return self.is_transient(err);
            }
            current = err.source();
        }
        false
    }

    /// A predicate suitable for [`retry_if`](crate::RetryPolicyExt::retry_if).
    pub fn predicate(self) -> impl Fn(&Failure) -> bool + Send + Sync + 'static {
        move |failure: &Failure| self.classify(failure)
    }
}
