//! Concrete implementations of trait abstractions.
//!
//! # Adapters
//!
//! - [`ReqwestHttpClient`] - HTTP client using reqwest
//! - [`TerminalControls`] - status line and alerts on stderr
//! - [`LoggingPreviewHost`] - preview handles that are only logged
//!
//! # Mock Implementations
//!
//! The [`mock`] submodule provides test doubles:
//! - [`mock::MockHttpClient`] - Configurable HTTP responses
//! - [`mock::RecordingControls`] - Recorded control calls
//! - [`mock::RecordingPreviewHost`] - Tracked preview handles

pub mod mock;
pub mod reqwest_http;
pub mod terminal;

pub use mock::MockHttpClient;
pub use reqwest_http::ReqwestHttpClient;
pub use terminal::{LoggingPreviewHost, TerminalControls};
