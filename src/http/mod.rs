//! HTTP transport seam.
//!
//! Everything above this module talks to the network through the
//! [`HttpTransport`] trait. The crate ships a blocking `reqwest` transport
//! with retry support and an expectation-driven [`mock::MockTransport`] for
//! tests.

use std::fmt;
use std::time::Duration;

use serde_json::Value as JsonValue;
use thiserror::Error;

pub mod blocking;
pub mod mock;
pub mod retry;

pub use blocking::ReqwestTransport;
pub use retry::{RetryDecision, RetryPolicy, RetryState};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Head => "HEAD",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fully assembled request, ready to be put on the wire.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub uri: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<JsonValue>,
    pub timeout: Duration,
}

impl HttpRequest {
    /// Looks up a header value, ignoring the case of its name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub text: String,
    /// The body parsed as JSON, if it was valid JSON.
    pub body: Option<JsonValue>,
}

impl HttpResponse {
    pub fn new(status: u16, text: impl Into<String>) -> Self {
        let text = text.into();
        let body = serde_json::from_str(&text).ok();
        Self { status, text, body }
    }

    pub fn json(status: u16, body: JsonValue) -> Self {
        Self {
            status,
            text: body.to_string(),
            body: Some(body),
        }
    }

    pub fn empty(status: u16) -> Self {
        Self {
            status,
            text: String::new(),
            body: None,
        }
    }
}

/// Failures below the HTTP status level.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Failed to read response body: {0}")]
    Body(String),

    #[error("Failed to set up HTTP client: {0}")]
    Setup(String),
}

impl TransportError {
    /// Connection failures and timeouts may succeed on a later attempt.
    pub fn is_transient(&self) -> bool {
        matches!(self, TransportError::Connection(_) | TransportError::Timeout(_))
    }
}

/// Sends requests to the remote service.
pub trait HttpTransport: Send + Sync {
    /// Short name of the underlying HTTP stack, used in the `User-Agent`.
    fn identifier(&self) -> String;

    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_response_parses_json_text() {
        let response = HttpResponse::new(200, r#"{"id": "abc"}"#);
        assert_eq!(response.body, Some(json!({"id": "abc"})));

        let response = HttpResponse::new(502, "<html>Bad Gateway</html>");
        assert_eq!(response.body, None);
        assert_eq!(response.text, "<html>Bad Gateway</html>");
    }

    #[test]
    fn test_request_header_lookup_is_case_insensitive() {
        let request = HttpRequest {
            method: HttpMethod::Get,
            uri: "https://api.caplena.com/v2/projects".into(),
            headers: vec![("Caplena-API-Key".into(), "secret".into())],
            body: None,
            timeout: Duration::from_secs(1),
        };
        assert_eq!(request.header("caplena-api-key"), Some("secret"));
        assert_eq!(request.header("Accept"), None);
    }

    #[test]
    fn test_transient_errors() {
        assert!(TransportError::Connection("refused".into()).is_transient());
        assert!(TransportError::Timeout(Duration::from_secs(3)).is_transient());
        assert!(!TransportError::Body("truncated".into()).is_transient());
    }
}
