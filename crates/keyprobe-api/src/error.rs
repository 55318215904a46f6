// ABOUTME: Error types for directory service calls
// ABOUTME: Separates transport, status, and decoding failures

use crate::model::KeyId;
use thiserror::Error;

/// Errors returned by a [`crate::KeyDirectory`].
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid API URL {url}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("ssh key {0} not found")]
    NotFound(KeyId),

    #[error("request rejected: {0}")]
    Unprocessable(String),

    #[error("API returned {status} ({id}): {message}")]
    Status {
        status: u16,
        id: String,
        message: String,
    },

    #[error("failed to decode API response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ApiError {
    /// True when the directory reported that the key does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::NotFound(_))
            || matches!(self, ApiError::Status { status: 404, .. })
    }
}

pub type Result<T> = std::result::Result<T, ApiError>;
