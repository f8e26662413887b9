//! Error types for Nimbus operations.
//!
//! Every failure surfaced by the SDK is a single [`Error`] value. Failures
//! produced by the HTTP execution core are carried as an [`ApiError`], the
//! normalized representation that records the HTTP status, the API-specific
//! error code, and a free-form metadata map whose `category` entry tells
//! network, timeout and cancellation failures apart.

use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Metadata key holding the [`ErrorCategory`] discriminator.
pub const CATEGORY_KEY: &str = "category";

/// Metadata key holding the raw response body of an unstructured HTTP error.
pub const BODY_KEY: &str = "body";

/// Main error type for Nimbus operations.
#[derive(Error, Debug, Clone)]
pub enum Error {
    /// Structured error produced by the HTTP execution core
    #[error(transparent)]
    Api(#[from] ApiError),

    /// Request failed local validation before dispatch
    #[error("Validation error: {0}")]
    Validation(String),

    /// Response body could not be decoded into the requested type
    #[error("Failed to decode response: {0}")]
    Decode(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid endpoint
    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),

    /// A resource identifier could not be parsed
    #[error("Invalid ID: {0}")]
    InvalidId(String),

    /// The waiter's own deadline elapsed before the condition was met
    #[error("Timed out after {waited:?} waiting for condition")]
    WaitTimeout {
        /// Time spent waiting
        waited: Duration,
    },

    /// A resource reached a terminal state other than the one awaited
    #[error("{resource} reached state {state} while waiting for {target}")]
    UnexpectedState {
        /// Resource description
        resource: String,
        /// State the resource reported
        state: String,
        /// State that was awaited
        target: String,
    },
}

/// Specialized result type for Nimbus operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Returns the error code for this error type.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Api(api) => match api.category() {
                Some(ErrorCategory::Network) => "NETWORK",
                Some(ErrorCategory::Timeout) => "TIMEOUT",
                Some(ErrorCategory::Canceled) => "CANCELED",
                None if api.status_code == 0 => "LOCAL",
                None => "HTTP_ERROR",
            },
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Decode(_) => "DECODE_ERROR",
            Self::Config(_) => "CONFIG_ERROR",
            Self::InvalidEndpoint(_) => "INVALID_ENDPOINT",
            Self::InvalidId(_) => "INVALID_ID",
            Self::WaitTimeout { .. } => "WAIT_TIMEOUT",
            Self::UnexpectedState { .. } => "UNEXPECTED_STATE",
        }
    }

    /// Returns the structured API error, if this is one.
    #[must_use]
    pub const fn api(&self) -> Option<&ApiError> {
        match self {
            Self::Api(api) => Some(api),
            _ => None,
        }
    }

    /// Returns the category of a structured API error.
    #[must_use]
    pub fn category(&self) -> Option<ErrorCategory> {
        self.api().and_then(ApiError::category)
    }

    /// Returns the HTTP status of a structured API error, or 0.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        self.api().map_or(0, |api| api.status_code)
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Self::InvalidEndpoint(err.to_string())
    }
}

impl From<validator::ValidationErrors> for Error {
    fn from(err: validator::ValidationErrors) -> Self {
        Self::Validation(err.to_string())
    }
}

/// Discriminator for client-side failures that carry no HTTP status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Transport failure not attributable to a deadline or cancellation
    Network,
    /// The call's deadline was exceeded
    Timeout,
    /// The call was explicitly canceled
    Canceled,
}

impl ErrorCategory {
    /// Returns the metadata value for this category.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Network => "network",
            Self::Timeout => "timeout",
            Self::Canceled => "canceled",
        }
    }

    fn parse(value: &str) -> Option<Self> {
        match value {
            "network" => Some(Self::Network),
            "timeout" => Some(Self::Timeout),
            "canceled" => Some(Self::Canceled),
            _ => None,
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

type Cause = Arc<dyn std::error::Error + Send + Sync + 'static>;

/// Normalized error produced by the HTTP execution core.
///
/// `status_code` is 0 for failures that happened on this side of the wire;
/// `error_code` is 0 when the API did not supply one. Two errors are the same
/// kind when [`ApiError::same_kind`] holds, regardless of message or cause.
#[derive(Debug, Clone, Error)]
pub struct ApiError {
    /// HTTP status code, 0 for local failures
    pub status_code: u16,
    /// API-specific error code, 0 if absent
    pub error_code: i64,
    /// Human-readable message
    pub message: String,
    /// Free-form metadata
    pub meta: BTreeMap<String, Value>,
    #[source]
    source: Option<Cause>,
}

/// Wire shape of an API error body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ErrorBody {
    #[serde(default)]
    error_code: Option<i64>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    meta: Option<BTreeMap<String, Value>>,
}

impl ApiError {
    /// Create a bare structured error.
    #[must_use]
    pub fn new(status_code: u16, error_code: i64, message: impl Into<String>) -> Self {
        Self {
            status_code,
            error_code,
            message: message.into(),
            meta: BTreeMap::new(),
            source: None,
        }
    }

    /// A failure before any bytes were sent (serialization, request construction).
    #[must_use]
    pub fn local(message: impl Into<String>) -> Self {
        Self::new(0, 0, message)
    }

    /// A transport failure not caused by a deadline or cancellation.
    #[must_use]
    pub fn network(message: impl Into<String>) -> Self {
        Self::new(0, 0, message).with_category(ErrorCategory::Network)
    }

    /// The call's deadline was exceeded.
    #[must_use]
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(0, 0, message).with_category(ErrorCategory::Timeout)
    }

    /// The call was canceled by the caller.
    #[must_use]
    pub fn canceled(message: impl Into<String>) -> Self {
        Self::new(0, 0, message).with_category(ErrorCategory::Canceled)
    }

    /// Build an error from a non-success HTTP response.
    ///
    /// Bodies shaped like `{"errorCode": .., "message": .., "meta": {..}}`
    /// become structured errors, with a missing `errorCode` read as 0. An
    /// object carrying neither `errorCode` nor `message`, or anything that is
    /// not such an object, is kept verbatim under the `body` metadata key.
    #[must_use]
    pub fn from_response(status_code: u16, body: &[u8]) -> Self {
        if let Ok(parsed) = serde_json::from_slice::<ErrorBody>(body) {
            if parsed.error_code.is_some() || parsed.message.is_some() {
                let mut error = Self::new(
                    status_code,
                    parsed.error_code.unwrap_or_default(),
                    parsed.message.unwrap_or_default(),
                );
                error.meta = parsed.meta.unwrap_or_default();
                return error;
            }
        }

        let text = String::from_utf8_lossy(body).into_owned();
        let message = reqwest::StatusCode::from_u16(status_code)
            .ok()
            .and_then(|status| status.canonical_reason())
            .map_or_else(|| format!("HTTP {status_code}"), str::to_string);

        Self::new(status_code, 0, message).with_meta(BODY_KEY, Value::String(text))
    }

    /// Attach a metadata entry.
    #[must_use]
    pub fn with_meta(mut self, key: impl Into<String>, value: Value) -> Self {
        self.meta.insert(key.into(), value);
        self
    }

    /// Attach the underlying cause.
    #[must_use]
    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        self.source = Some(Arc::new(source));
        self
    }

    fn with_category(self, category: ErrorCategory) -> Self {
        self.with_meta(CATEGORY_KEY, Value::String(category.as_str().to_string()))
    }

    /// Returns the category recorded in the metadata, if any.
    #[must_use]
    pub fn category(&self) -> Option<ErrorCategory> {
        self.meta
            .get(CATEGORY_KEY)
            .and_then(Value::as_str)
            .and_then(ErrorCategory::parse)
    }

    /// Returns the raw body of an unstructured HTTP error.
    #[must_use]
    pub fn raw_body(&self) -> Option<&str> {
        self.meta.get(BODY_KEY).and_then(Value::as_str)
    }

    /// True for 429, 502, 503 and 504.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        crate::backoff::is_retryable_status(self.status_code)
    }

    /// True when both errors carry the same status and error code.
    #[must_use]
    pub const fn same_kind(&self, other: &Self) -> bool {
        self.status_code == other.status_code && self.error_code == other.error_code
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.status_code, self.category()) {
            (0, Some(category)) => write!(f, "{category} error: {}", self.message),
            (0, None) => write!(f, "request error: {}", self.message),
            (status, _) if self.error_code != 0 => {
                write!(f, "API error {status} (code {}): {}", self.error_code, self.message)
            }
            (status, _) => write!(f, "HTTP error {status}: {}", self.message),
        }
    }
}
