//! Captioneer - a streaming client for a text and image generation backend
//!
//! The library exposes the building blocks of the client so they can be
//! driven by the command line, by tests, or by another front end:
//!
//! - [`ndjson`] decodes newline-delimited JSON response bodies
//! - [`render`] turns accumulated Markdown into throttled HTML paints
//! - [`session`] owns the busy state, spinner, status ticker and inputs
//! - [`orchestrator`] implements the user actions against the backend

pub mod adapters;
pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod health;
pub mod logging;
pub mod ndjson;
pub mod orchestrator;
pub mod render;
pub mod session;
pub mod traits;
