//! Blocking `reqwest` transport.

use std::thread;

use reqwest::blocking::Client as HttpClient;
use tracing::{debug, warn};

use super::{HttpMethod, HttpRequest, HttpResponse, HttpTransport, TransportError};
use super::retry::{RetryDecision, RetryPolicy, RetryState};

impl From<HttpMethod> for reqwest::Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Patch => reqwest::Method::PATCH,
            HttpMethod::Delete => reqwest::Method::DELETE,
            HttpMethod::Head => reqwest::Method::HEAD,
        }
    }
}

/// Sends requests with `reqwest`'s blocking client and retries transient
/// failures according to a [`RetryPolicy`].
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: HttpClient,
    policy: RetryPolicy,
}

impl ReqwestTransport {
    pub fn new(policy: RetryPolicy) -> Result<Self, TransportError> {
        let client = HttpClient::builder()
            .build()
            .map_err(|e| TransportError::Setup(e.to_string()))?;
        Ok(Self { client, policy })
    }

    /// Wraps an existing client, e.g. one configured with a proxy.
    pub fn with_client(client: HttpClient, policy: RetryPolicy) -> Self {
        Self { client, policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    fn send_once(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        let mut builder = self
            .client
            .request(request.method.into(), &request.uri)
            .timeout(request.timeout);
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().map_err(|e| {
            if e.is_timeout() {
                TransportError::Timeout(request.timeout)
            } else {
                TransportError::Connection(e.to_string())
            }
        })?;

        let status = response.status().as_u16();
        let text = response
            .text()
            .map_err(|e| TransportError::Body(e.to_string()))?;
        Ok(HttpResponse::new(status, text))
    }
}

impl HttpTransport for ReqwestTransport {
    fn identifier(&self) -> String {
        "reqwest".to_string()
    }

    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        let mut state = RetryState::new(&self.policy, request.method);
        loop {
            let decision = match self.send_once(request) {
                Ok(response) => match state.should_retry_status(response.status) {
                    RetryDecision::DontRetry => return Ok(response),
                    retry => {
                        debug!(status = response.status, "Retryable status received");
                        retry
                    }
                },
                Err(error) => match state.should_retry_error(&error) {
                    RetryDecision::DontRetry => return Err(error),
                    retry => {
                        debug!(error = %error, "Retryable transport error");
                        retry
                    }
                },
            };

            if let RetryDecision::Retry(wait) = decision {
                warn!(
                    method = %request.method,
                    uri = %request.uri,
                    attempt = state.attempts,
                    wait_ms = wait.as_millis() as u64,
                    "Retrying request"
                );
                thread::sleep(wait);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifier() {
        let transport = ReqwestTransport::new(RetryPolicy::no_retry()).unwrap();
        assert_eq!(transport.identifier(), "reqwest");
        assert_eq!(transport.policy().max_retries, 0);
    }

    #[test]
    fn test_method_conversion() {
        assert_eq!(reqwest::Method::from(HttpMethod::Patch), reqwest::Method::PATCH);
        assert_eq!(reqwest::Method::from(HttpMethod::Head), reqwest::Method::HEAD);
    }
}
