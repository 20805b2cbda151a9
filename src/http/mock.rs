//! # Mock Transport
//!
//! Utilities for testing controllers and resources without a network.
//!
//! Queue the exchanges a test expects, in order, then hand the transport to
//! a [`Client`](crate::Client). Every request pops the next expectation; a
//! request that does not match it panics.
//!
//! ```
//! use caplena::http::mock::MockTransport;
//! use serde_json::json;
//!
//! let mock = MockTransport::new();
//! mock.expect_get("/projects/abc").return_json(200, json!({"id": "abc"}));
//! // ... exercise the code under test ...
//! # use caplena::http::{HttpMethod, HttpRequest, HttpTransport};
//! # let request = HttpRequest {
//! #     method: HttpMethod::Get,
//! #     uri: "https://api.caplena.com/v2/projects/abc".into(),
//! #     headers: vec![],
//! #     body: None,
//! #     timeout: std::time::Duration::from_secs(1),
//! # };
//! # mock.send(&request).unwrap();
//! mock.verify(); // all expectations were consumed
//! ```

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use serde_json::Value as JsonValue;

use super::{HttpMethod, HttpRequest, HttpResponse, HttpTransport, TransportError};

// =============================================================================
// EXPECTATION BUILDER API
// =============================================================================

struct Expectation {
    method: HttpMethod,
    uri: String,
    response: Result<HttpResponse, TransportError>,
}

impl Expectation {
    /// An expected URI without a query matches the request path suffix;
    /// one with a query must match the end of the full request URI.
    fn matches(&self, request: &HttpRequest) -> bool {
        if self.method != request.method {
            return false;
        }
        if self.uri.contains('?') {
            request.uri.ends_with(&self.uri)
        } else {
            let path = request.uri.split('?').next().unwrap_or_default();
            path.ends_with(&self.uri)
        }
    }
}

/// An HTTP transport with expectation tracking for fluent testing.
#[derive(Clone, Default)]
pub struct MockTransport {
    expectations: Arc<Mutex<VecDeque<Expectation>>>,
    requests: Arc<Mutex<Vec<HttpRequest>>>,
}

impl MockTransport {
    /// Creates a new mock transport with no expectations.
    pub fn new() -> Self {
        Self::default()
    }

    /// Expects a request with the given method whose URI ends with `uri`.
    pub fn expect(&self, method: HttpMethod, uri: impl Into<String>) -> ExpectationBuilder {
        ExpectationBuilder {
            method,
            uri: uri.into(),
            expectations: self.expectations.clone(),
        }
    }

    pub fn expect_get(&self, uri: impl Into<String>) -> ExpectationBuilder {
        self.expect(HttpMethod::Get, uri)
    }

    pub fn expect_post(&self, uri: impl Into<String>) -> ExpectationBuilder {
        self.expect(HttpMethod::Post, uri)
    }

    pub fn expect_patch(&self, uri: impl Into<String>) -> ExpectationBuilder {
        self.expect(HttpMethod::Patch, uri)
    }

    pub fn expect_delete(&self, uri: impl Into<String>) -> ExpectationBuilder {
        self.expect(HttpMethod::Delete, uri)
    }

    /// Every request received so far, in order.
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// The most recent request, if any.
    pub fn last_request(&self) -> Option<HttpRequest> {
        self.requests.lock().unwrap().last().cloned()
    }

    /// Verifies that all expectations were met.
    pub fn verify(&self) {
        let exps = self.expectations.lock().unwrap();
        if !exps.is_empty() {
            panic!("Not all expectations were met. {} remaining", exps.len());
        }
    }
}

impl HttpTransport for MockTransport {
    fn identifier(&self) -> String {
        "mock".to_string()
    }

    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        self.requests.lock().unwrap().push(request.clone());

        let expectation = self.expectations.lock().unwrap().pop_front();
        match expectation {
            Some(expectation) if expectation.matches(request) => expectation.response,
            Some(expectation) => panic!(
                "Unexpected request or expectation mismatch: got {} {}, expected {} {}",
                request.method, request.uri, expectation.method, expectation.uri
            ),
            None => panic!(
                "Unexpected request or expectation mismatch: got {} {}, no expectations left",
                request.method, request.uri
            ),
        }
    }
}

/// Builder for a single expected exchange.
pub struct ExpectationBuilder {
    method: HttpMethod,
    uri: String,
    expectations: Arc<Mutex<VecDeque<Expectation>>>,
}

impl ExpectationBuilder {
    /// Responds with a JSON body.
    pub fn return_json(self, status: u16, body: JsonValue) {
        self.push(Ok(HttpResponse::json(status, body)));
    }

    /// Responds without a body.
    pub fn return_empty(self, status: u16) {
        self.push(Ok(HttpResponse::empty(status)));
    }

    /// Responds with a raw text body.
    pub fn return_text(self, status: u16, text: &str) {
        self.push(Ok(HttpResponse::new(status, text)));
    }

    /// Fails the exchange at the transport level.
    pub fn return_err(self, error: TransportError) {
        self.push(Err(error));
    }

    fn push(self, response: Result<HttpResponse, TransportError>) {
        let mut exps = self.expectations.lock().unwrap();
        exps.push_back(Expectation {
            method: self.method,
            uri: self.uri,
            response,
        });
    }
}
