//! The error envelope returned by the Caplena API.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// A structured error reported by the remote service.
///
/// `code` is stable and meant for programmatic handling; `message`,
/// `details` and `help` are human-readable and may change over time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiError {
    #[serde(rename = "type")]
    pub kind: String,
    pub code: String,
    #[serde(default = "default_message")]
    pub message: String,
    #[serde(default)]
    pub details: Option<String>,
    #[serde(default)]
    pub help: Option<String>,
    #[serde(default)]
    pub context: Option<JsonValue>,
}

pub const DEFAULT_MESSAGE: &str =
    "An unknown error occurred. Please reach out to us at support@caplena.com.";

fn default_message() -> String {
    DEFAULT_MESSAGE.to_string()
}

impl ApiError {
    pub fn new(kind: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            code: code.into(),
            message: default_message(),
            details: None,
            help: None,
            context: None,
        }
    }

    /// The error used when a response body is not a valid error envelope.
    pub fn invalid_format() -> Self {
        Self::new("internal_error", "body.invalid_format")
    }

    /// Interprets an error response body.
    pub fn from_body(body: Option<&JsonValue>) -> Self {
        body.and_then(|body| serde_json::from_value::<ApiError>(body.clone()).ok())
            .unwrap_or_else(Self::invalid_format)
    }

    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    #[must_use]
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    #[must_use]
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    #[must_use]
    pub fn with_context(mut self, context: JsonValue) -> Self {
        self.context = Some(context);
        self
    }
}

fn is_blank(value: &JsonValue) -> bool {
    match value {
        JsonValue::Null => true,
        JsonValue::Bool(b) => !b,
        JsonValue::String(s) => s.is_empty(),
        JsonValue::Array(a) => a.is_empty(),
        JsonValue::Object(o) => o.is_empty(),
        JsonValue::Number(_) => false,
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]: {}", self.kind, self.code, self.message)?;
        if let Some(details) = self.details.as_deref().filter(|d| !d.is_empty()) {
            write!(f, " {details}")?;
        }
        if let Some(help) = self.help.as_deref().filter(|h| !h.is_empty()) {
            write!(f, " For more information, please visit {help}.")?;
        }
        if let Some(context) = self.context.as_ref().filter(|c| !is_blank(c)) {
            write!(f, " (context={context})")?;
        }
        Ok(())
    }
}

impl std::error::Error for ApiError {}
