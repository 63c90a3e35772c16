//! Common test utilities for integration tests.
//!
//! This module provides a harness that wires an [`Orchestrator`] to the
//! mock HTTP client, recording controls and an in-memory surface.
//!
//! # Example
//!
//! ```ignore
//! let harness = Harness::new();
//! harness.client.push_response(&url("/predict"), stream_of(&[json!({"response": "hi"})]));
//! harness.orchestrator.run().await?;
//! ```

pub mod mocks;

#[allow(unused_imports)]
pub use mocks::*;

use std::sync::Arc;
use std::time::Duration;

use captioneer::adapters::mock::{MockHttpClient, RecordingControls, RecordingPreviewHost};
use captioneer::api::ImageFile;
use captioneer::config::{BatchStrategy, ClientConfig, DEFAULT_BASE_URL};
use captioneer::orchestrator::Orchestrator;
use captioneer::render::MemorySurface;
use captioneer::session::Session;

/// Full URL of a backend path on the default base URL.
pub fn url(path: &str) -> String {
    format!("{}{}", DEFAULT_BASE_URL, path)
}

/// A small in-memory image.
pub fn png(name: &str) -> ImageFile {
    ImageFile::new(name, vec![0x89, b'P', b'N', b'G'])
}

/// Config with short timers so tests run quickly on real time.
pub fn test_config() -> ClientConfig {
    ClientConfig::default()
        .with_render_interval(Duration::from_millis(5))
        .with_spinner_min_visible(Duration::ZERO)
        .with_ticker_interval(Duration::from_millis(50))
}

/// Orchestrator plus every test double it talks to.
pub struct Harness {
    pub client: Arc<MockHttpClient>,
    pub controls: Arc<RecordingControls>,
    pub previews: Arc<RecordingPreviewHost>,
    pub surface: Arc<MemorySurface>,
    pub orchestrator: Orchestrator<MockHttpClient>,
}

#[allow(dead_code)]
impl Harness {
    pub fn new() -> Self {
        Self::with_config(test_config())
    }

    pub fn with_strategy(strategy: BatchStrategy) -> Self {
        Self::with_config(test_config().with_batch_strategy(strategy))
    }

    pub fn with_config(config: ClientConfig) -> Self {
        let client = Arc::new(MockHttpClient::new());
        let controls = Arc::new(RecordingControls::new());
        let previews = Arc::new(RecordingPreviewHost::new());
        let surface = Arc::new(MemorySurface::new());
        let session = Session::new(controls.clone(), previews.clone(), &config);
        let orchestrator = Orchestrator::new(client.clone(), config, session, surface.clone());
        Self {
            client,
            controls,
            previews,
            surface,
            orchestrator,
        }
    }

    pub fn session(&self) -> &Session {
        self.orchestrator.session()
    }

    /// Set the prompt and file selection.
    pub fn inputs(&self, prompt: &str, files: &[&str]) {
        self.session().set_prompt(prompt);
        self.session()
            .select_files(files.iter().map(|name| png(name)).collect());
    }

    /// Latest painted HTML, or an empty string.
    pub fn html(&self) -> String {
        self.surface.latest().unwrap_or_default()
    }
}
