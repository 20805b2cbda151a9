use thiserror::Error;

use crate::api::{ApiError, FilterError};
use crate::config::ConfigError;
use crate::helpers::UriError;
use crate::http::TransportError;
use crate::object::ObjectError;
use crate::time::TimestampError;

/// Everything that can go wrong while talking to the API.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Object(#[from] ObjectError),

    #[error(transparent)]
    Filter(#[from] FilterError),

    #[error(transparent)]
    Uri(#[from] UriError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Timestamp(#[from] TimestampError),

    #[error("{0}")]
    InvalidArgument(String),

    #[error("Failed to (de)serialize JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// The remote error envelope, if this is an API error.
    pub fn as_api_error(&self) -> Option<&ApiError> {
        match self {
            Error::Api(err) => Some(err),
            _ => None,
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
