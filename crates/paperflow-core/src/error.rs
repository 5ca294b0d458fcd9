//! Error types for paperflow.

use thiserror::Error;

/// Result type alias using paperflow's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for paperflow operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation failed (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Declared media type could not be parsed or decoded.
    ///
    /// This is the only fatal condition for text extraction: it aborts an
    /// ingestion run before any store write.
    #[error("Unsupported media type: {0}")]
    UnsupportedMediaType(String),

    /// A category token outside the closed enumeration, or a field query
    /// against a category with no schema.
    #[error("Unknown category: {0}")]
    UnknownCategory(String),

    /// Inference/generation failed
    #[error("Inference error: {0}")]
    Inference(String),

    /// Embedding generation failed
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// HTTP/network request failed
    #[error("Request error: {0}")]
    Request(String),

    /// An in-flight ingestion run observed its cancellation signal.
    #[error("Operation cancelled")]
    Cancelled,

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// File I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Request(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_unsupported_media_type() {
        let err = Error::UnsupportedMediaType("application/x-msdownload".to_string());
        assert_eq!(
            err.to_string(),
            "Unsupported media type: application/x-msdownload"
        );
    }

    #[test]
    fn test_error_display_unknown_category() {
        let err = Error::UnknownCategory("receipt".to_string());
        assert_eq!(err.to_string(), "Unknown category: receipt");
    }

    #[test]
    fn test_error_display_inference() {
        let err = Error::Inference("model timeout".to_string());
        assert_eq!(err.to_string(), "Inference error: model timeout");
    }

    #[test]
    fn test_error_display_embedding() {
        let err = Error::Embedding("failed to generate".to_string());
        assert_eq!(err.to_string(), "Embedding error: failed to generate");
    }

    #[test]
    fn test_error_display_cancelled() {
        assert_eq!(Error::Cancelled.to_string(), "Operation cancelled");
    }

    #[test]
    fn test_error_from_serde_json() {
        let json_err = serde_json::from_str::<serde_json::Value>("not json").unwrap_err();
        let err: Error = json_err.into();
        assert!(matches!(err, Error::Serialization(_)));
    }
}
