//! Client configuration (explicit builder or environment variables).

use std::env;
use std::time::Duration;

use thiserror::Error;

use crate::api::{ApiBaseUri, ApiVersion};
use crate::http::RetryPolicy;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Environment variable `{0}` must be set")]
    MissingVar(&'static str),

    #[error("Environment variable `{var}` has an invalid value `{value}`")]
    InvalidVar { var: &'static str, value: String },

    #[error("Invalid API base URI `{0}`. Expected `local`, `production` or an http(s) URL.")]
    InvalidBaseUri(String),

    #[error("Unknown API version `{0}`")]
    InvalidVersion(String),

    #[error("Cannot convert `DEFAULT` to a valid version string.")]
    DefaultVersion,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Configuration {
    pub api_key: String,
    pub api_base_uri: ApiBaseUri,
    pub api_version: ApiVersion,
    pub timeout: Duration,
    pub retry: RetryPolicy,
}

impl Configuration {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_base_uri: ApiBaseUri::default(),
            api_version: ApiVersion::default(),
            timeout: Self::DEFAULT_TIMEOUT,
            retry: RetryPolicy::default(),
        }
    }

    /// Reads `CAPLENA_API_KEY` (required) and the optional
    /// `CAPLENA_API_BASE_URI`, `CAPLENA_API_VERSION`, `CAPLENA_TIMEOUT_SECS`,
    /// `CAPLENA_MAX_RETRIES` and `CAPLENA_BACKOFF_FACTOR`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| env::var(var).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let api_key = lookup("CAPLENA_API_KEY")
            .filter(|key| !key.is_empty())
            .ok_or(ConfigError::MissingVar("CAPLENA_API_KEY"))?;
        let mut config = Self::new(api_key);

        if let Some(uri) = lookup("CAPLENA_API_BASE_URI") {
            config.api_base_uri = uri.parse()?;
        }
        if let Some(version) = lookup("CAPLENA_API_VERSION") {
            config.api_version = version.parse()?;
        }
        if let Some(value) = lookup("CAPLENA_TIMEOUT_SECS") {
            let secs = value.trim().parse::<u64>().map_err(|_| ConfigError::InvalidVar {
                var: "CAPLENA_TIMEOUT_SECS",
                value: value.clone(),
            })?;
            config.timeout = Duration::from_secs(secs);
        }
        if let Some(value) = lookup("CAPLENA_MAX_RETRIES") {
            let retries = value.trim().parse::<u32>().map_err(|_| ConfigError::InvalidVar {
                var: "CAPLENA_MAX_RETRIES",
                value: value.clone(),
            })?;
            config.retry = config.retry.with_max_retries(retries);
        }
        if let Some(value) = lookup("CAPLENA_BACKOFF_FACTOR") {
            let factor = value
                .trim()
                .parse::<f64>()
                .ok()
                .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
                .ok_or_else(|| ConfigError::InvalidVar {
                    var: "CAPLENA_BACKOFF_FACTOR",
                    value: value.clone(),
                })?;
            config.retry = config.retry.with_backoff_factor(factor);
        }
        Ok(config)
    }

    #[must_use]
    pub fn with_api_base_uri(mut self, uri: ApiBaseUri) -> Self {
        self.api_base_uri = uri;
        self
    }

    #[must_use]
    pub fn with_api_version(mut self, version: ApiVersion) -> Self {
        self.api_version = version;
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}
