use thiserror::Error;

/// Errors from the admin REST backend.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Request timed out after {0}s")]
    Timeout(u64),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("HTTP error: status {0}")]
    HttpStatus(u16),

    /// The backend answered with an error envelope (or a non-2xx status
    /// that still carried a message).
    #[error("{message}")]
    Server { status: u16, message: String },

    #[error("Invalid response body: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Response contained no data")]
    MissingData,

    #[error("Response too large (exceeds {0} bytes)")]
    ResponseTooLarge(usize),

    #[error("Invalid endpoint URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Form rejected before anything was sent.
    #[error("{0}")]
    Validation(String),
}

impl ApiError {
    /// Returns true if this error is transient and an idempotent request may be retried.
    pub fn is_retryable(&self) -> bool {
        match self {
            ApiError::Timeout(_) | ApiError::Network(_) => true,
            ApiError::HttpStatus(status) | ApiError::Server { status, .. } => *status >= 500,
            ApiError::Decode(_)
            | ApiError::MissingData
            | ApiError::ResponseTooLarge(_)
            | ApiError::InvalidUrl(_)
            | ApiError::Validation(_) => false,
        }
    }

    /// The backend's own message, when it sent one.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            ApiError::Server { message, .. } => Some(message),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(ApiError::Timeout(30).is_retryable());
        assert!(ApiError::HttpStatus(502).is_retryable());
        assert!(!ApiError::HttpStatus(404).is_retryable());
        assert!(!ApiError::Server {
            status: 400,
            message: "code exists".into()
        }
        .is_retryable());
        assert!(!ApiError::Validation("name required".into()).is_retryable());
    }

    #[test]
    fn test_server_message_display() {
        let err = ApiError::Server {
            status: 400,
            message: "Category code already exists".into(),
        };
        assert_eq!(err.to_string(), "Category code already exists");
        assert_eq!(err.server_message(), Some("Category code already exists"));
        assert_eq!(ApiError::HttpStatus(500).server_message(), None);
    }
}
