//! Trait abstractions for dependency injection and testability.
//!
//! # Traits
//!
//! - [`HttpClient`] - HTTP client operations (GET, POST, streaming POST)
//! - [`Controls`] - input enablement, spinner, status line and alerts
//! - [`Surface`] - the answer area that receives rendered HTML
//! - [`PreviewHost`] - creation and release of image preview handles

pub mod http;
pub mod ui;

pub use http::{
    header_value, ByteStream, FormPart, Headers, HttpClient, HttpError, MultipartForm,
    RequestBody, Response, StreamingResponse,
};
pub use ui::{Controls, PreviewHandle, PreviewHost, Surface};
