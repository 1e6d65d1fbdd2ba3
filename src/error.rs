//! Sprout error types

use std::time::Duration;

/// Sprout error types
#[derive(Debug, thiserror::Error)]
pub enum SproutError {
    // Provider/network errors
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("rate limited, retry after {retry_after:?}")]
    RateLimited { retry_after: Option<Duration> },

    #[error("authentication failed")]
    AuthenticationFailed,

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    // Data errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A remote payload could not be normalised into a domain value.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("empty response from model")]
    EmptyResponse,

    /// Every tier failed. Carries the last tier's message.
    #[error("no recipe could be generated: {0}")]
    GenerationFailed(String),

    // Storage errors
    #[error("storage error: {0}")]
    Storage(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Configuration errors
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("no provider configured")]
    NoProvider,

    #[error("provider does not support this operation")]
    Unsupported,
}

impl SproutError {
    /// Whether the error is a caller mistake rather than a remote failure.
    ///
    /// Validation errors are surfaced immediately and never trigger the
    /// fallback tier.
    pub fn is_validation(&self) -> bool {
        matches!(self, SproutError::InvalidInput(_))
    }

    /// Retry-after hint from a `RateLimited` error, if any.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            SproutError::RateLimited { retry_after } => *retry_after,
            _ => None,
        }
    }
}

impl From<reqwest::Error> for SproutError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            SproutError::InvalidResponse(err.to_string())
        } else {
            SproutError::Http(err.to_string())
        }
    }
}

/// Result type alias for Sprout operations
pub type Result<T> = std::result::Result<T, SproutError>;
