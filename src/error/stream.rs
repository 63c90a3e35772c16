//! Streaming-related error types.
//!
//! Errors observed while consuming an NDJSON response body. Malformed lines
//! are not represented here: the decoder drops and counts them instead.

use std::fmt;

/// Stream-specific error variants.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamError {
    /// A decoded event carried an `error` field.
    Backend { message: String },
}

impl StreamError {
    /// Get a user-friendly error message.
    pub fn user_message(&self) -> String {
        match self {
            StreamError::Backend { message } => format!("Generation failed: {}", message),
        }
    }

    /// Get a short error code for logging.
    pub fn error_code(&self) -> &'static str {
        match self {
            StreamError::Backend { .. } => "E_STREAM_BACKEND",
        }
    }

    /// The message reported by the backend.
    pub fn message(&self) -> &str {
        match self {
            StreamError::Backend { message } => message,
        }
    }
}

impl fmt::Display for StreamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamError::Backend { message } => write!(f, "Backend error: {}", message),
        }
    }
}

impl std::error::Error for StreamError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_error() {
        let err = StreamError::Backend {
            message: "CUDA out of memory".to_string(),
        };
        assert_eq!(err.error_code(), "E_STREAM_BACKEND");
        assert_eq!(err.message(), "CUDA out of memory");
        assert!(err.user_message().contains("CUDA out of memory"));
        assert_eq!(err.to_string(), "Backend error: CUDA out of memory");
    }
}
