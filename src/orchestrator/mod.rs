//! Top-level user actions.
//!
//! An [`Orchestrator`] ties the HTTP client, the [`Session`] and the
//! throttled renderer together. Each public action:
//!
//! 1. returns [`Outcome::Skipped`] when another action is running
//! 2. enters the busy phase with a mode label
//! 3. issues its request(s) and streams text into a [`RenderDocument`]
//! 4. on failure, paints `**Error:** <message>` and returns the error
//! 5. clears the inputs only on success
//!
//! The busy guard is dropped on every path, so the UI always returns to idle.
//!
//! # Module structure
//! - `single` - `run`, `runstream`, `describe_image`, `describe_images_batch`
//! - `batch` - sequential per-image streaming and server-driven batch streaming
//! - `scale` - concurrent load test with latency and instance report

mod batch;
mod scale;
mod single;

pub use scale::{
    percentile, percentiles, AdmissionGate, GatePass, LatencyPercentiles, ScaleTestConfig,
    ScaleTestReport, ScaleTestResult, MAX_CONCURRENCY, MAX_REQUESTS,
};

pub use crate::api::NO_IMAGE_MESSAGE;

use std::sync::Arc;

use crate::api::Endpoint;
use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::render::{error_markdown, RenderDocument, ThrottledRenderer};
use crate::session::Session;
use crate::traits::{HttpClient, HttpError, Surface};

/// Result of a top-level action that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The action ran to completion
    Completed,
    /// Nothing was done: another action was running or input was missing
    Skipped,
}

/// Drives user actions against the backend.
pub struct Orchestrator<C: HttpClient> {
    client: Arc<C>,
    config: ClientConfig,
    session: Session,
    renderer: ThrottledRenderer,
}

impl<C: HttpClient> Orchestrator<C> {
    pub fn new(
        client: Arc<C>,
        config: ClientConfig,
        session: Session,
        surface: Arc<dyn Surface>,
    ) -> Self {
        let renderer = ThrottledRenderer::new(surface).with_interval(config.render_interval);
        Self {
            client,
            config,
            session,
            renderer,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn renderer(&self) -> &ThrottledRenderer {
        &self.renderer
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    fn url(&self, endpoint: Endpoint) -> String {
        endpoint.url(&self.config.base_url)
    }

    /// Paint the error in place of the answer and hand it back.
    fn fail(&self, err: ClientError) -> ClientError {
        tracing::warn!("[{}] {}", err.error_code(), err);
        self.renderer.flush(&error_markdown(&err.user_message()));
        err
    }

    /// Status label while slot `index` of `total` is processed.
    fn progress_label(index: usize, total: usize, doc: &RenderDocument) -> String {
        format!(
            "Describing image {}/{}: {}",
            index + 1,
            total,
            doc.name(index).unwrap_or_default()
        )
    }
}

/// Human name of the action behind an endpoint, used in status errors.
pub fn action_name(endpoint: Endpoint) -> &'static str {
    match endpoint {
        Endpoint::Predict | Endpoint::PredictStream => "Generation",
        Endpoint::DescribeImage | Endpoint::DescribeImageStream => "Image describe",
        Endpoint::DescribeImageBatch | Endpoint::DescribeImageBatchStream => "Batch describe",
        Endpoint::Health => "Health check",
        Endpoint::BuildInfo => "Build info",
    }
}

/// Map a transport-level error, turning a rejected stream open into a
/// status error for `action`.
fn request_error(action: &str, err: HttpError) -> ClientError {
    match err {
        HttpError::ServerError {
            status, message, ..
        } => ClientError::status(action, status, message),
        other => ClientError::Transport(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_names() {
        assert_eq!(action_name(Endpoint::DescribeImage), "Image describe");
        assert_eq!(action_name(Endpoint::PredictStream), "Generation");
        assert_eq!(action_name(Endpoint::DescribeImageBatchStream), "Batch describe");
    }

    #[test]
    fn test_request_error_mapping() {
        let err = request_error(
            "Image describe",
            HttpError::ServerError {
                status: 404,
                message: "Not Found".to_string(),
                headers: Default::default(),
            },
        );
        assert_eq!(err.to_string(), "Image describe failed: 404 Not Found");

        let err = request_error("Generation", HttpError::Timeout("300s".to_string()));
        assert!(matches!(err, ClientError::Transport(HttpError::Timeout(_))));
    }
}
