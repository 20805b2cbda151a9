//! Retry policy for the HTTP transport.
//!
//! Retries use exponential backoff (`backoff_factor * 2^attempt`, capped) and
//! only apply to idempotent methods.

use std::time::Duration;

use super::{HttpMethod, TransportError};

/// Configuration for retry behavior.
///
/// ```
/// use caplena::http::RetryPolicy;
/// use std::time::Duration;
///
/// let policy = RetryPolicy::default()
///     .with_max_retries(3)
///     .with_backoff_factor(Duration::from_millis(500));
/// assert_eq!(policy.backoff(2), Duration::from_secs(2));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub backoff_factor: Duration,
    /// Caps exponential growth.
    pub max_backoff: Duration,
    pub retry_on_status: Vec<u16>,
    pub retry_on_methods: Vec<HttpMethod>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 5,
            backoff_factor: Duration::from_secs(2),
            max_backoff: Duration::from_secs(120),
            retry_on_status: vec![408, 409, 413, 429, 500, 502, 503, 504],
            retry_on_methods: vec![HttpMethod::Get, HttpMethod::Put, HttpMethod::Head],
        }
    }
}

impl RetryPolicy {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A policy that never retries.
    #[must_use]
    pub fn no_retry() -> Self {
        Self {
            max_retries: 0,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_max_retries(mut self, max: u32) -> Self {
        self.max_retries = max;
        self
    }

    #[must_use]
    pub fn with_backoff_factor(mut self, factor: Duration) -> Self {
        self.backoff_factor = factor;
        self
    }

    #[must_use]
    pub fn with_max_backoff(mut self, duration: Duration) -> Self {
        self.max_backoff = duration;
        self
    }

    #[must_use]
    pub fn with_retry_on_status(mut self, status: u16) -> Self {
        if !self.retry_on_status.contains(&status) {
            self.retry_on_status.push(status);
        }
        self
    }

    #[must_use]
    pub fn with_retry_on_method(mut self, method: HttpMethod) -> Self {
        if !self.retry_on_methods.contains(&method) {
            self.retry_on_methods.push(method);
        }
        self
    }

    /// Wait before retry number `attempt` (zero-based).
    pub fn backoff(&self, attempt: u32) -> Duration {
        let multiplier = 2u32.saturating_pow(attempt);
        self.backoff_factor
            .saturating_mul(multiplier)
            .min(self.max_backoff)
    }

    pub fn retries_method(&self, method: HttpMethod) -> bool {
        self.retry_on_methods.contains(&method)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RetryDecision {
    Retry(Duration),
    DontRetry,
}

/// Retry bookkeeping for a single logical request.
#[derive(Debug, Clone)]
pub struct RetryState<'a> {
    pub attempts: u32,
    method: HttpMethod,
    policy: &'a RetryPolicy,
}

impl<'a> RetryState<'a> {
    pub fn new(policy: &'a RetryPolicy, method: HttpMethod) -> Self {
        Self {
            attempts: 0,
            method,
            policy,
        }
    }

    pub fn should_retry_status(&mut self, status: u16) -> RetryDecision {
        if !self.policy.retry_on_status.contains(&status) {
            return RetryDecision::DontRetry;
        }
        self.decide()
    }

    pub fn should_retry_error(&mut self, error: &TransportError) -> RetryDecision {
        if !error.is_transient() {
            return RetryDecision::DontRetry;
        }
        self.decide()
    }

    fn decide(&mut self) -> RetryDecision {
        if !self.policy.retries_method(self.method) || self.attempts >= self.policy.max_retries {
            return RetryDecision::DontRetry;
        }
        let wait = self.policy.backoff(self.attempts);
        self.attempts += 1;
        RetryDecision::Retry(wait)
    }
}
