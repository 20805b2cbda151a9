use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::Value as JsonValue;
use tracing::{debug, info, instrument};

use super::{ApiError, ApiVersion, Filter, Ordering};
use crate::config::Configuration;
use crate::error::Result;
use crate::helpers::{build_qualified_uri, user_agent};
use crate::http::{HttpMethod, HttpRequest, HttpResponse, HttpTransport};

/// Turns API calls into HTTP requests and checks the responses.
pub struct ApiRequestor {
    config: Configuration,
    transport: Arc<dyn HttpTransport>,
}

impl ApiRequestor {
    pub fn new(config: Configuration, transport: Arc<dyn HttpTransport>) -> Self {
        Self { config, transport }
    }

    pub fn config(&self) -> &Configuration {
        &self.config
    }

    pub fn call(&self, method: HttpMethod, path: impl Into<String>) -> ApiCall<'_> {
        ApiCall {
            requestor: self,
            method,
            path: path.into(),
            path_params: Vec::new(),
            filter_params: BTreeMap::new(),
            order_params: BTreeMap::new(),
            query_params: Vec::new(),
            headers: Vec::new(),
            body: None,
            allowed: None,
        }
    }

    pub fn get(&self, path: impl Into<String>) -> ApiCall<'_> {
        self.call(HttpMethod::Get, path)
    }

    pub fn post(&self, path: impl Into<String>) -> ApiCall<'_> {
        self.call(HttpMethod::Post, path)
    }

    pub fn put(&self, path: impl Into<String>) -> ApiCall<'_> {
        self.call(HttpMethod::Put, path)
    }

    pub fn patch(&self, path: impl Into<String>) -> ApiCall<'_> {
        self.call(HttpMethod::Patch, path)
    }

    pub fn delete(&self, path: impl Into<String>) -> ApiCall<'_> {
        self.call(HttpMethod::Delete, path)
    }

    /// Adds the headers every request carries.
    ///
    /// `Accept` is only set if the caller did not provide one; the agent, key
    /// and version headers always overwrite caller values.
    pub fn build_request_headers(
        &self,
        mut headers: Vec<(String, String)>,
        has_body: bool,
    ) -> Result<Vec<(String, String)>> {
        fn upsert(headers: &mut Vec<(String, String)>, name: &str, value: String) {
            headers.retain(|(key, _)| !key.eq_ignore_ascii_case(name));
            headers.push((name.to_string(), value));
        }

        if !headers.iter().any(|(key, _)| key.eq_ignore_ascii_case("Accept")) {
            headers.push(("Accept".to_string(), "application/json".to_string()));
        }
        upsert(&mut headers, "User-Agent", user_agent(&self.transport.identifier()));
        upsert(&mut headers, "Caplena-API-Key", self.config.api_key.clone());
        if self.config.api_version != ApiVersion::Default {
            upsert(
                &mut headers,
                "Caplena-API-Version",
                self.config.api_version.version()?.to_string(),
            );
        }
        if has_body {
            upsert(&mut headers, "Content-Type", "application/json".to_string());
        }
        Ok(headers)
    }

    /// Builds the error for a rejected response.
    pub fn build_exc(&self, response: &HttpResponse) -> ApiError {
        let error = ApiError::from_body(response.body.as_ref());
        info!(kind = %error.kind, code = %error.code, "Received error from server");
        error
    }
}

/// Merges query parameters in precedence order: filter, ordering, explicit.
///
/// A later source overwrites the value of an earlier key in place.
pub fn build_query_params(
    filter: &BTreeMap<String, String>,
    ordering: &BTreeMap<String, String>,
    explicit: &[(String, String)],
) -> Vec<(String, String)> {
    let mut merged: Vec<(String, String)> = Vec::new();
    let sources = filter.iter().chain(ordering.iter()).chain(explicit.iter().map(|(k, v)| (k, v)));
    for (key, value) in sources {
        match merged.iter_mut().find(|(existing, _)| existing == key) {
            Some((_, slot)) => *slot = value.clone(),
            None => merged.push((key.clone(), value.clone())),
        }
    }
    merged
}

/// A single request under construction.
///
/// ```no_run
/// # use std::sync::Arc;
/// # use caplena::api::ApiRequestor;
/// # use caplena::config::Configuration;
/// # use caplena::http::ReqwestTransport;
/// # fn main() -> caplena::Result<()> {
/// let config = Configuration::new("my-api-key");
/// let transport = Arc::new(ReqwestTransport::new(config.retry.clone())?);
/// let requestor = ApiRequestor::new(config, transport);
///
/// let project = requestor
///     .get("/projects/{id}")
///     .path_param("id", "my-project")
///     .send_json()?;
/// println!("{}", project["name"]);
/// # Ok(())
/// # }
/// ```
pub struct ApiCall<'a> {
    requestor: &'a ApiRequestor,
    method: HttpMethod,
    path: String,
    path_params: Vec<(String, String)>,
    filter_params: BTreeMap<String, String>,
    order_params: BTreeMap<String, String>,
    query_params: Vec<(String, String)>,
    headers: Vec<(String, String)>,
    body: Option<JsonValue>,
    allowed: Option<Vec<u16>>,
}

impl ApiCall<'_> {
    #[must_use]
    pub fn path_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.path_params.push((name.into(), value.into()));
        self
    }

    #[must_use]
    pub fn query(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.query_params.push((name.into(), value.to_string()));
        self
    }

    #[must_use]
    pub fn filter<S>(mut self, filter: Option<&Filter<S>>) -> Self {
        if let Some(filter) = filter {
            self.filter_params = filter.to_query_params();
        }
        self
    }

    #[must_use]
    pub fn order_by(mut self, ordering: Option<&Ordering>) -> Self {
        if let Some(ordering) = ordering {
            self.order_params = ordering.to_query_params();
        }
        self
    }

    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    #[must_use]
    pub fn json(mut self, body: JsonValue) -> Self {
        self.body = Some(body);
        self
    }

    /// Overrides the accepted status codes.
    #[must_use]
    pub fn allow(mut self, codes: &[u16]) -> Self {
        self.allowed = Some(codes.to_vec());
        self
    }

    fn allowed_codes(&self) -> Vec<u16> {
        self.allowed.clone().unwrap_or_else(|| match self.method {
            HttpMethod::Post => vec![201],
            HttpMethod::Delete => vec![204],
            _ => vec![200],
        })
    }

    /// Assembles the request without sending it.
    pub fn build(&self) -> Result<HttpRequest> {
        let config = self.requestor.config();
        let path_params: Vec<(&str, &str)> = self
            .path_params
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        let query = build_query_params(&self.filter_params, &self.order_params, &self.query_params);
        let uri = build_qualified_uri(
            config.api_base_uri.url(),
            &self.path,
            &path_params,
            &query,
        )?;
        let headers = self
            .requestor
            .build_request_headers(self.headers.clone(), self.body.is_some())?;

        Ok(HttpRequest {
            method: self.method,
            uri,
            headers,
            body: self.body.clone(),
            timeout: config.timeout,
        })
    }

    /// Sends the request; statuses outside the allowed set become [`ApiError`]s.
    #[instrument(skip(self), fields(method = %self.method, path = %self.path))]
    pub fn send(self) -> Result<HttpResponse> {
        let request = self.build()?;
        info!(method = %request.method, uri = %request.uri, "Sending request to Caplena API");
        if let Some(body) = &request.body {
            debug!(payload = %body, "Request payload");
        }

        let response = self.requestor.transport.send(&request)?;
        debug!(status = response.status, "Received response");

        if !self.allowed_codes().contains(&response.status) {
            return Err(self.requestor.build_exc(&response).into());
        }
        Ok(response)
    }

    /// Sends the request and returns its JSON body, which must be present.
    pub fn send_json(self) -> Result<JsonValue> {
        let requestor = self.requestor;
        let response = self.send()?;
        match response.body {
            Some(body) => Ok(body),
            None => Err(requestor.build_exc(&response).into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ApiBaseUri;
    use crate::http::mock::MockTransport;
    use crate::Error;
    use serde_json::json;

    fn requestor(mock: &MockTransport) -> ApiRequestor {
        let config = Configuration::new("secret").with_api_base_uri(ApiBaseUri::Local);
        ApiRequestor::new(config, Arc::new(mock.clone()))
    }

    fn pairs(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_query_params_later_sources_win() {
        let merged = build_query_params(
            &pairs(&[("tags", "a"), ("name", "x")]),
            &pairs(&[("order_by", "desc:name")]),
            &[
                ("page".to_string(), "1".to_string()),
                ("tags".to_string(), "override".to_string()),
            ],
        );
        assert_eq!(
            merged,
            vec![
                ("name".to_string(), "x".to_string()),
                ("tags".to_string(), "override".to_string()),
                ("order_by".to_string(), "desc:name".to_string()),
                ("page".to_string(), "1".to_string()),
            ]
        );
    }

    #[test]
    fn test_headers_are_attached() {
        let mock = MockTransport::new();
        let requestor = requestor(&mock);
        let request = requestor
            .post("/projects")
            .header("accept", "text/plain")
            .header("Caplena-API-Key", "spoofed")
            .json(json!({"name": "x"}))
            .build()
            .unwrap();

        assert_eq!(request.uri, "http://localhost:8000/v2/projects");
        assert_eq!(request.header("Accept"), Some("text/plain"));
        assert_eq!(request.header("Caplena-API-Key"), Some("secret"));
        assert_eq!(request.header("Caplena-API-Version"), Some("2022-11-22"));
        assert_eq!(request.header("Content-Type"), Some("application/json"));
        assert!(request.header("User-Agent").unwrap().starts_with("mock/"));
    }

    #[test]
    fn test_default_version_sends_no_header() {
        let mock = MockTransport::new();
        let config = Configuration::new("secret").with_api_version(ApiVersion::Default);
        let requestor = ApiRequestor::new(config, Arc::new(mock));
        let request = requestor.get("/projects").build().unwrap();
        assert_eq!(request.header("Caplena-API-Version"), None);
        assert_eq!(request.header("Content-Type"), None);
    }

    #[test]
    fn test_missing_path_param_fails_before_sending() {
        let mock = MockTransport::new();
        let err = requestor(&mock).get("/projects/{id}").send().unwrap_err();
        assert!(matches!(err, Error::Uri(_)));
        assert!(mock.requests().is_empty());
    }

    #[test]
    fn test_unexpected_status_becomes_api_error() {
        let mock = MockTransport::new();
        mock.expect_get("/projects/abc").return_json(
            404,
            json!({
                "type": "invalid_request",
                "code": "not_found",
                "message": "Project not found.",
            }),
        );

        let err = requestor(&mock)
            .get("/projects/{id}")
            .path_param("id", "abc")
            .send()
            .unwrap_err();
        let api = err.as_api_error().unwrap();
        assert_eq!(api.code, "not_found");
        assert_eq!(api.message, "Project not found.");
        mock.verify();
    }

    #[test]
    fn test_allowed_codes_follow_method() {
        let mock = MockTransport::new();
        mock.expect_delete("/projects/abc").return_empty(204);
        mock.expect_post("/projects/abc/rows/bulk").return_json(202, json!({}));
        mock.expect_post("/projects").return_json(200, json!({}));

        let requestor = requestor(&mock);
        requestor.delete("/projects/abc").send().unwrap();
        requestor
            .post("/projects/abc/rows/bulk")
            .allow(&[202])
            .send()
            .unwrap();
        let err = requestor.post("/projects").send().unwrap_err();
        assert!(err.as_api_error().is_some());
        mock.verify();
    }

    #[test]
    fn test_send_json_requires_a_body() {
        let mock = MockTransport::new();
        mock.expect_get("/projects").return_text(200, "not json");

        let err = requestor(&mock).get("/projects").send_json().unwrap_err();
        assert_eq!(err.as_api_error().unwrap(), &ApiError::invalid_format());
    }
}
