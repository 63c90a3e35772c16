//! Unified error type for client operations.
//!
//! `ClientError` consolidates transport, HTTP status, stream and input
//! failures so orchestrators can classify them and surface a readable
//! message in place of the answer.

use std::path::PathBuf;

use thiserror::Error;

use super::category::ErrorCategory;
use super::stream::StreamError;
use crate::config::ConfigError;
use crate::traits::HttpError;

/// Unified error type for the client.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The request failed before a response arrived, or the body read failed.
    #[error("{0}")]
    Transport(#[from] HttpError),

    /// The backend answered with a non-2xx status.
    #[error("{action} failed: {status} {body}")]
    Status {
        action: String,
        status: u16,
        body: String,
    },

    /// A stream event reported a failure.
    #[error(transparent)]
    Stream(#[from] StreamError),

    /// A buffered JSON body could not be decoded.
    #[error("Invalid JSON response: {0}")]
    Json(#[from] serde_json::Error),

    /// An image file could not be read.
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The user has to do something before the action can run.
    #[error("{0}")]
    Input(String),

    /// Invalid configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl ClientError {
    /// Build a status error for the named action.
    pub fn status(action: impl Into<String>, status: u16, body: impl Into<String>) -> Self {
        ClientError::Status {
            action: action.into(),
            status,
            body: body.into(),
        }
    }

    /// Build a stream error from an `error` event.
    pub fn backend(message: impl Into<String>) -> Self {
        ClientError::Stream(StreamError::Backend {
            message: message.into(),
        })
    }

    /// Get the category of this error.
    pub fn category(&self) -> ErrorCategory {
        match self {
            ClientError::Transport(HttpError::ServerError { .. }) => ErrorCategory::Http,
            ClientError::Transport(_) => ErrorCategory::Transport,
            ClientError::Status { .. } => ErrorCategory::Http,
            ClientError::Stream(_) => ErrorCategory::Stream,
            ClientError::Json(_) => ErrorCategory::Parse,
            ClientError::Io { .. } | ClientError::Input(_) => ErrorCategory::Input,
            ClientError::Config(_) => ErrorCategory::Configuration,
        }
    }

    /// HTTP status carried by this error, if any.
    pub fn http_status(&self) -> Option<u16> {
        match self {
            ClientError::Status { status, .. } => Some(*status),
            ClientError::Transport(HttpError::ServerError { status, .. }) => Some(*status),
            _ => None,
        }
    }

    /// Get a user-friendly error message, shown in place of the answer.
    pub fn user_message(&self) -> String {
        match self {
            ClientError::Stream(err) => err.user_message(),
            other => other.to_string(),
        }
    }

    /// Get a short error code for logging.
    pub fn error_code(&self) -> &'static str {
        match self {
            ClientError::Transport(_) => "E_TRANSPORT",
            ClientError::Status { .. } => "E_HTTP_STATUS",
            ClientError::Stream(err) => err.error_code(),
            ClientError::Json(_) => "E_JSON",
            ClientError::Io { .. } => "E_IO",
            ClientError::Input(_) => "E_INPUT",
            ClientError::Config(_) => "E_CONFIG",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_error_message() {
        let err = ClientError::status("Image describe", 404, "Not Found");
        assert_eq!(err.to_string(), "Image describe failed: 404 Not Found");
        assert_eq!(err.category(), ErrorCategory::Http);
        assert_eq!(err.http_status(), Some(404));
        assert_eq!(err.error_code(), "E_HTTP_STATUS");
    }

    #[test]
    fn test_backend_error_category() {
        let err = ClientError::backend("model crashed");
        assert_eq!(err.category(), ErrorCategory::Stream);
        assert!(err.user_message().contains("model crashed"));
        assert_eq!(err.http_status(), None);
    }

    #[test]
    fn test_transport_error_category() {
        let err: ClientError = HttpError::ConnectionFailed("refused".to_string()).into();
        assert_eq!(err.category(), ErrorCategory::Transport);
        assert_eq!(err.to_string(), "Connection failed: refused");
    }

    #[test]
    fn test_server_error_from_stream_open_is_http() {
        let err: ClientError = HttpError::ServerError {
            status: 503,
            message: "busy".to_string(),
            headers: Default::default(),
        }
        .into();
        assert_eq!(err.category(), ErrorCategory::Http);
        assert_eq!(err.http_status(), Some(503));
    }

    #[test]
    fn test_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("nope").unwrap_err();
        let err: ClientError = json_err.into();
        assert_eq!(err.category(), ErrorCategory::Parse);
        assert!(err.to_string().starts_with("Invalid JSON response"));
    }

    #[test]
    fn test_io_error_mentions_path() {
        let err = ClientError::Io {
            path: PathBuf::from("/tmp/missing.png"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
        };
        assert_eq!(err.category(), ErrorCategory::Input);
        assert!(err.to_string().contains("/tmp/missing.png"));
    }
}
