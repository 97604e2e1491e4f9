//! Error types for the Lettermint SDK.

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

/// Errors that can occur while sending email or verifying webhooks.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The API token was empty.
    #[error("lettermint: invalid or missing API token")]
    InvalidApiToken,

    /// The email failed local validation; no request was made.
    #[error("lettermint: invalid request: {0}")]
    InvalidRequest(String),

    /// The API answered with a 4xx or 5xx status.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// The HTTP request timed out.
    #[error("lettermint: request timeout: {0}")]
    Timeout(#[source] reqwest::Error),

    /// Transport-level failure (connection, TLS, proxy, client construction).
    #[error("lettermint: request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// A successful response body could not be decoded.
    #[error("lettermint: failed to parse response: {0}")]
    ResponseParse(#[source] serde_json::Error),

    /// The email payload could not be encoded.
    #[error("lettermint: failed to serialize email payload: {0}")]
    Serialize(#[source] serde_json::Error),

    /// Webhook signature missing, malformed, mismatched, or not matching its delivery timestamp.
    #[error("lettermint: invalid webhook signature: {0}")]
    InvalidSignature(String),

    /// Webhook timestamp lies outside the tolerance window, in either direction.
    #[error(
        "lettermint: webhook timestamp outside tolerance window: timestamp {timestamp} is {age} seconds off (tolerance: {tolerance:?})"
    )]
    TimestampExpired {
        /// Timestamp carried by the signature token.
        timestamp: i64,
        /// Absolute difference to the verification time, in seconds.
        age: u64,
        /// Tolerance the check was made against.
        tolerance: Duration,
    },

    /// The webhook was authentic but its body is not a valid event.
    #[error("lettermint: failed to parse webhook payload: {0}")]
    PayloadParse(#[source] serde_json::Error),

    /// Reading a webhook request body failed.
    #[error("lettermint: failed to read request body: {0}")]
    Io(#[from] std::io::Error),

    /// A required environment variable was not set.
    #[error("lettermint: environment variable {0} is not set")]
    MissingEnv(&'static str),
}

/// Coarse classification of an [`Error`], for matching without destructuring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidApiToken,
    InvalidRequest,
    Unauthorized,
    Validation,
    RateLimited,
    Server,
    Api,
    Timeout,
    Transport,
    ResponseParse,
    InvalidSignature,
    TimestampExpired,
    PayloadParse,
    Configuration,
}

impl Error {
    /// Classify this error.
    ///
    /// API errors are classified by status code, so a 400 from the server and
    /// a local validation failure both report [`ErrorKind::InvalidRequest`].
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidApiToken => ErrorKind::InvalidApiToken,
            Error::InvalidRequest(_) => ErrorKind::InvalidRequest,
            Error::Api(api) => api.kind(),
            Error::Timeout(_) => ErrorKind::Timeout,
            Error::Request(_) | Error::Io(_) => ErrorKind::Transport,
            Error::ResponseParse(_) | Error::Serialize(_) => ErrorKind::ResponseParse,
            Error::InvalidSignature(_) => ErrorKind::InvalidSignature,
            Error::TimestampExpired { .. } => ErrorKind::TimestampExpired,
            Error::PayloadParse(_) => ErrorKind::PayloadParse,
            Error::MissingEnv(_) => ErrorKind::Configuration,
        }
    }

    /// HTTP status code, for errors returned by the API.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Error::Api(api) => Some(api.status_code),
            _ => None,
        }
    }

    /// Field-level validation messages, for errors returned by the API.
    pub fn field_errors(&self) -> Option<&HashMap<String, Vec<String>>> {
        match self {
            Error::Api(api) if !api.errors.is_empty() => Some(&api.errors),
            _ => None,
        }
    }
}

/// Error response returned by the Lettermint API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    /// HTTP status code.
    pub status_code: u16,
    /// Human-readable message from the API.
    pub message: String,
    /// Specific error type, e.g. `validation_error`.
    pub error_type: Option<String>,
    /// Validation messages keyed by field.
    pub errors: HashMap<String, Vec<String>>,
    /// Raw response body, for debugging.
    pub response_body: String,
}

impl ApiError {
    pub fn kind(&self) -> ErrorKind {
        match self.status_code {
            400 => ErrorKind::InvalidRequest,
            401 => ErrorKind::Unauthorized,
            422 => ErrorKind::Validation,
            429 => ErrorKind::RateLimited,
            code if code >= 500 => ErrorKind::Server,
            _ => ErrorKind::Api,
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.error_type {
            Some(error_type) => write!(
                f,
                "lettermint: API error ({}): {} [{}]",
                self.status_code, self.message, error_type
            ),
            None => write!(
                f,
                "lettermint: API error ({}): {}",
                self.status_code, self.message
            ),
        }
    }
}

impl std::error::Error for ApiError {}
