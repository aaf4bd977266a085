//! Error types for Bria API calls.

use std::time::Duration;

/// Errors returned before or instead of a normalized remote outcome.
///
/// Remote rejections that arrive with an HTTP response (460, 422, other
/// 4xx/5xx, unparseable bodies) are not errors at this level; they are
/// reported as [`crate::OperationResult::Failed`].
#[derive(Debug, thiserror::Error)]
pub enum BriaError {
    /// API key missing.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// Request rejected locally before any network call.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Transport failure (connection refused, DNS, timeout before response).
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Non-success status while downloading a result or enhancing a prompt.
    #[error("API error: {status} - {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Response body or description.
        message: String,
    },

    /// Result URL expired before download.
    #[error("result URL expired")]
    UrlExpired,

    /// Response was well-formed but lacked the expected content.
    #[error("failed to decode: {0}")]
    Decode(String),

    /// I/O error (e.g., saving a result).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Response body was not valid JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl BriaError {
    /// Returns true if a caller retrying at a higher level might succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network(e) => e.is_timeout() || e.is_connect(),
            Self::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Returns the suggested retry delay, if available.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::Network(_) => Some(Duration::from_secs(2)),
            Self::Api { status, .. } if *status >= 500 => Some(Duration::from_secs(1)),
            _ => None,
        }
    }
}

/// Result type alias for Bria API operations.
pub type Result<T> = std::result::Result<T, BriaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_retryable() {
        let server_error = BriaError::Api {
            status: 503,
            message: "unavailable".into(),
        };
        assert!(server_error.is_retryable());

        assert!(!BriaError::Auth("missing key".into()).is_retryable());
        assert!(!BriaError::InvalidRequest("no image".into()).is_retryable());
        assert!(!BriaError::UrlExpired.is_retryable());
        assert!(!BriaError::Decode("bad base64".into()).is_retryable());
        assert!(!BriaError::Api {
            status: 404,
            message: "gone".into()
        }
        .is_retryable());
    }

    #[test]
    fn test_retry_after() {
        let server_error = BriaError::Api {
            status: 500,
            message: "boom".into(),
        };
        assert_eq!(server_error.retry_after(), Some(Duration::from_secs(1)));

        let client_error = BriaError::Api {
            status: 400,
            message: "bad".into(),
        };
        assert_eq!(client_error.retry_after(), None);
        assert_eq!(BriaError::UrlExpired.retry_after(), None);
    }

    #[test]
    fn test_error_display() {
        let err = BriaError::Api {
            status: 404,
            message: "Not found".into(),
        };
        assert_eq!(err.to_string(), "API error: 404 - Not found");

        let err = BriaError::InvalidRequest("either image bytes or image URL is required".into());
        assert_eq!(
            err.to_string(),
            "invalid request: either image bytes or image URL is required"
        );
    }
}
