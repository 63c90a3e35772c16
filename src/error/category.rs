//! Error category classification.
//!
//! Every failure the client can observe falls into one of these buckets.
//! The category labels failures in logs; whether a failure aborts an action
//! is decided by the action itself.

use std::fmt;

/// High-level categorization of client errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// The request never produced a response (connect, DNS, timeout, body read).
    Transport,

    /// The backend answered with a non-2xx status.
    Http,

    /// A decoded stream event carried an `error` field.
    Stream,

    /// A response body could not be interpreted (malformed buffered JSON).
    Parse,

    /// The user must do something first (pick an image, fix a path).
    Input,

    /// Invalid configuration values.
    Configuration,
}

impl ErrorCategory {
    /// Returns a short label for the category suitable for logging.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::Transport => "transport",
            ErrorCategory::Http => "http",
            ErrorCategory::Stream => "stream",
            ErrorCategory::Parse => "parse",
            ErrorCategory::Input => "input",
            ErrorCategory::Configuration => "configuration",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
