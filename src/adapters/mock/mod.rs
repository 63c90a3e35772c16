//! Mock implementations for testing.
//!
//! This module provides mock implementations of the boundary traits,
//! enabling orchestration tests without network access or a real UI.
//!
//! # Available Mocks
//!
//! - [`MockHttpClient`] - HTTP client with configurable responses
//! - [`RecordingControls`] - controls that log every call
//! - [`RecordingPreviewHost`] - preview host that tracks live handles

pub mod http;
pub mod ui;

pub use http::{MockHttpClient, MockResponse, RecordedRequest};
pub use ui::{ControlEvent, RecordingControls, RecordingPreviewHost};
