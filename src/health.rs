//! Backend health check.
//!
//! Queries `/health` and `/buildinfo` and summarises the answers. A failing
//! `/buildinfo` does not make the backend unhealthy; it only leaves the
//! build fields empty.

use std::time::Instant;

use crate::api::{BuildInfo, Endpoint, HealthResponse, INSTANCE_HEADER};
use crate::traits::{Headers, HttpClient};

/// Result of a health check.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HealthReport {
    /// `/health` answered with 2xx
    pub reachable: bool,
    /// `status` field reported by the backend
    pub status: Option<String>,
    pub model_loaded: Option<bool>,
    pub response_time_ms: Option<u64>,
    /// Replica that answered `/health`
    pub instance: Option<String>,
    pub build: Option<BuildInfo>,
    /// Why the backend is considered unhealthy
    pub error: Option<String>,
}

impl HealthReport {
    /// Reachable, reporting `healthy`/`ok`, and not reporting an unloaded model.
    pub fn is_healthy(&self) -> bool {
        let status_ok = matches!(self.status.as_deref(), Some("healthy") | Some("ok"));
        self.reachable && status_ok && self.model_loaded != Some(false)
    }

    pub fn to_markdown(&self) -> String {
        let mut md = String::from("## Backend health\n\n");
        if self.is_healthy() {
            match self.response_time_ms {
                Some(ms) => md.push_str(&format!("- ✓ Backend responding ({}ms)\n", ms)),
                None => md.push_str("- ✓ Backend healthy\n"),
            }
        } else {
            md.push_str(&format!(
                "- ✗ Backend not healthy: {}\n",
                self.error.as_deref().unwrap_or("unexpected status")
            ));
        }

        if let Some(loaded) = self.model_loaded {
            md.push_str(&format!(
                "- **Model loaded:** {}\n",
                if loaded { "yes" } else { "no" }
            ));
        }
        if let Some(instance) = &self.instance {
            md.push_str(&format!("- **Instance:** {}\n", instance));
        }
        if let Some(build) = &self.build {
            if let Some(model) = &build.model {
                md.push_str(&format!("- **Model:** {}\n", model));
            }
            if let Some(framework) = &build.framework {
                md.push_str(&format!("- **Framework:** {}\n", framework));
            }
            if let Some(time) = &build.build_time {
                md.push_str(&format!("- **Built:** {}\n", time));
            }
        }
        md.trim_end().to_string()
    }
}

/// Run the health check against `base_url`.
pub async fn check_backend<C: HttpClient + ?Sized>(client: &C, base_url: &str) -> HealthReport {
    let mut report = HealthReport::default();

    let start = Instant::now();
    match client.get(&Endpoint::Health.url(base_url), &Headers::new()).await {
        Ok(response) if response.is_success() => {
            report.reachable = true;
            report.response_time_ms = Some(start.elapsed().as_millis() as u64);
            report.instance = response.header(INSTANCE_HEADER).map(str::to_string);
            match response.json::<HealthResponse>() {
                Ok(health) => {
                    report.status = Some(health.status);
                    report.model_loaded = health.model_loaded;
                }
                Err(e) => report.error = Some(format!("Invalid health response: {}", e)),
            }
        }
        Ok(response) => {
            report.error = Some(format!("Health check failed: {} {}", response.status, response.text()));
            return report;
        }
        Err(e) => {
            report.error = Some(e.to_string());
            return report;
        }
    }

    if report.model_loaded == Some(false) && report.error.is_none() {
        report.error = Some("model not loaded".to_string());
    }

    match client.get(&Endpoint::BuildInfo.url(base_url), &Headers::new()).await {
        Ok(response) if response.is_success() => match response.json::<BuildInfo>() {
            Ok(build) => report.build = Some(build),
            Err(e) => tracing::debug!("Ignoring invalid build info: {}", e),
        },
        Ok(response) => tracing::debug!("Build info unavailable: {}", response.status),
        Err(e) => tracing::debug!("Build info unavailable: {}", e),
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::mock::{MockHttpClient, MockResponse};
    use crate::traits::HttpError;
    use serde_json::json;

    const BASE: &str = "http://backend:5000";

    #[tokio::test]
    async fn test_healthy_backend_with_build_info() {
        let client = MockHttpClient::new();
        client.set_response(
            "http://backend:5000/health",
            MockResponse::json(200, json!({"status": "healthy", "model_loaded": true})),
        );
        client.set_response(
            "http://backend:5000/buildinfo",
            MockResponse::json(
                200,
                json!({"build_time": "2026-01-02", "model": "gemma", "framework": "vLLM"}),
            ),
        );

        let report = check_backend(&client, BASE).await;

        assert!(report.is_healthy());
        assert!(report.response_time_ms.is_some());
        assert_eq!(report.build.as_ref().unwrap().framework.as_deref(), Some("vLLM"));
        let md = report.to_markdown();
        assert!(md.contains("✓ Backend responding"));
        assert!(md.contains("- **Model:** gemma"));
    }

    #[tokio::test]
    async fn test_missing_build_info_is_not_fatal() {
        let client = MockHttpClient::new();
        client.set_response(
            "http://backend:5000/health",
            MockResponse::json(200, json!({"status": "healthy"})),
        );
        client.set_response("http://backend:5000/buildinfo", MockResponse::text(404, "nope"));

        let report = check_backend(&client, BASE).await;
        assert!(report.is_healthy());
        assert!(report.build.is_none());
    }

    #[tokio::test]
    async fn test_model_not_loaded() {
        let client = MockHttpClient::new();
        client.set_default_response(MockResponse::json(
            200,
            json!({"status": "healthy", "model_loaded": false}),
        ));

        let report = check_backend(&client, BASE).await;
        assert!(!report.is_healthy());
        assert_eq!(report.error.as_deref(), Some("model not loaded"));
    }

    #[tokio::test]
    async fn test_unreachable_backend() {
        let client = MockHttpClient::new();
        client.set_default_response(MockResponse::Error(HttpError::ConnectionFailed(
            "refused".to_string(),
        )));

        let report = check_backend(&client, BASE).await;
        assert!(!report.reachable);
        assert!(report.to_markdown().contains("✗ Backend not healthy: Connection failed: refused"));
        assert_eq!(client.get_requests().len(), 1);
    }

    #[tokio::test]
    async fn test_error_status() {
        let client = MockHttpClient::new();
        client.set_default_response(MockResponse::text(503, "loading"));

        let report = check_backend(&client, BASE).await;
        assert!(!report.is_healthy());
        assert_eq!(report.error.as_deref(), Some("Health check failed: 503 loading"));
    }
}
