//! Concurrent load test.
//!
//! `N` requests are launched together against one endpoint and admitted
//! through a FIFO gate of `C` slots. Each settles into a
//! [`ScaleTestResult`] at its launch index; failures never abort the run.
//! The report is rendered once, after every request has settled.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::{DateTime, Local};
use tokio::sync::{AcquireError, Semaphore, SemaphorePermit};
use tokio::time::Instant;

use super::{Orchestrator, NO_IMAGE_MESSAGE};
use crate::api::{request_body, Endpoint, FileMode, INSTANCE_HEADER, UNKNOWN_INSTANCE};
use crate::error::ClientResult;
use crate::ndjson;
use crate::traits::{Headers, HttpClient, HttpError, RequestBody};

/// Upper bound on requests per run.
pub const MAX_REQUESTS: usize = 500;

/// Upper bound on concurrently admitted requests.
pub const MAX_CONCURRENCY: usize = 100;

/// Failure texts in the report are cut to this many characters.
const MAX_ERROR_CHARS: usize = 200;

/// Parameters of one run. Counts are clamped on construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScaleTestConfig {
    pub endpoint: Endpoint,
    pub requests: usize,
    pub concurrency: usize,
}

impl ScaleTestConfig {
    pub fn new(endpoint: Endpoint, requests: usize, concurrency: usize) -> Self {
        Self {
            endpoint,
            requests: requests.clamp(1, MAX_REQUESTS),
            concurrency: concurrency.clamp(1, MAX_CONCURRENCY),
        }
    }
}

/// Counting gate with FIFO admission.
///
/// Waiters are admitted strictly in arrival order as slots free up. The gate
/// also tracks how many holders are inside and the highest such count.
#[derive(Debug)]
pub struct AdmissionGate {
    semaphore: Semaphore,
    capacity: usize,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

impl AdmissionGate {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            semaphore: Semaphore::new(capacity),
            capacity,
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        }
    }

    /// Wait for a free slot. The slot is returned when the pass is dropped.
    pub async fn admit(&self) -> Result<GatePass<'_>, AcquireError> {
        let permit = self.semaphore.acquire().await?;
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        Ok(GatePass {
            gate: self,
            _permit: permit,
        })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Highest number of passes held at once.
    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

/// A held slot of an [`AdmissionGate`].
#[derive(Debug)]
pub struct GatePass<'a> {
    gate: &'a AdmissionGate,
    _permit: SemaphorePermit<'a>,
}

impl Drop for GatePass<'_> {
    fn drop(&mut self) {
        self.gate.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Outcome of one request.
#[derive(Debug, Clone, PartialEq)]
pub struct ScaleTestResult {
    pub ok: bool,
    pub elapsed_ms: f64,
    /// HTTP status, when a response arrived
    pub status: Option<u16>,
    /// Serving instance from `x-instance-id`, or `unknown`
    pub instance: String,
    pub error: Option<String>,
}

/// Nearest-rank latency summary.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatencyPercentiles {
    pub min: f64,
    pub p50: f64,
    pub p90: f64,
    pub p99: f64,
    pub max: f64,
}

/// Value at fraction `p` of an ascending slice, using index
/// `round((n - 1) * p)`.
pub fn percentile(sorted: &[f64], p: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let p = p.clamp(0.0, 1.0);
    let index = ((sorted.len() - 1) as f64 * p).round() as usize;
    sorted.get(index.min(sorted.len() - 1)).copied()
}

/// Summarise samples, ignoring non-positive and non-finite values.
pub fn percentiles(samples: &[f64]) -> Option<LatencyPercentiles> {
    let mut sorted: Vec<f64> = samples
        .iter()
        .copied()
        .filter(|v| v.is_finite() && *v > 0.0)
        .collect();
    if sorted.is_empty() {
        return None;
    }
    sorted.sort_by(|a, b| a.total_cmp(b));

    Some(LatencyPercentiles {
        min: sorted[0],
        p50: percentile(&sorted, 0.50)?,
        p90: percentile(&sorted, 0.90)?,
        p99: percentile(&sorted, 0.99)?,
        max: sorted[sorted.len() - 1],
    })
}

/// Everything known after a run.
#[derive(Debug, Clone)]
pub struct ScaleTestReport {
    pub config: ScaleTestConfig,
    /// One entry per request, by launch index
    pub results: Vec<ScaleTestResult>,
    pub started_at: DateTime<Local>,
    pub total_ms: f64,
    pub peak_concurrency: usize,
}

impl ScaleTestReport {
    pub fn successes(&self) -> usize {
        self.results.iter().filter(|r| r.ok).count()
    }

    pub fn failures(&self) -> Vec<(usize, &ScaleTestResult)> {
        self.results
            .iter()
            .enumerate()
            .filter(|(_, r)| !r.ok)
            .collect()
    }

    /// Latency over successful requests.
    pub fn latency(&self) -> Option<LatencyPercentiles> {
        let samples: Vec<f64> = self
            .results
            .iter()
            .filter(|r| r.ok)
            .map(|r| r.elapsed_ms)
            .collect();
        percentiles(&samples)
    }

    /// Successful requests per instance, most first, ties by name.
    pub fn by_instance(&self) -> Vec<(String, usize)> {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for result in self.results.iter().filter(|r| r.ok) {
            *counts.entry(result.instance.as_str()).or_default() += 1;
        }
        let mut counts: Vec<(String, usize)> = counts
            .into_iter()
            .map(|(name, count)| (name.to_string(), count))
            .collect();
        counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        counts
    }

    pub fn to_markdown(&self) -> String {
        let mut md = String::new();
        md.push_str(&format!("## Scale test: {}\n\n", self.config.endpoint));
        md.push_str(&format!(
            "- **Started:** {}\n",
            self.started_at.format("%Y-%m-%d %H:%M:%S")
        ));
        md.push_str(&format!(
            "- **Requests:** {} (concurrency {}, peak {})\n",
            self.config.requests, self.config.concurrency, self.peak_concurrency
        ));
        md.push_str(&format!("- **Succeeded:** {}\n", self.successes()));
        md.push_str(&format!("- **Failed:** {}\n", self.results.len() - self.successes()));
        md.push_str(&format!("- **Total time:** {:.0} ms\n\n", self.total_ms));

        md.push_str("### Latency (ms)\n\n");
        match self.latency() {
            Some(l) => {
                md.push_str("| min | p50 | p90 | p99 | max |\n|---|---|---|---|---|\n");
                md.push_str(&format!(
                    "| {:.1} | {:.1} | {:.1} | {:.1} | {:.1} |\n\n",
                    l.min, l.p50, l.p90, l.p99, l.max
                ));
            }
            None => md.push_str("_No successful requests._\n\n"),
        }

        let instances = self.by_instance();
        if !instances.is_empty() {
            md.push_str("### Instances\n\n| instance | successes |\n|---|---|\n");
            for (name, count) in &instances {
                md.push_str(&format!("| {} | {} |\n", name, count));
            }
            md.push('\n');
        }

        let failures = self.failures();
        if !failures.is_empty() {
            md.push_str("### Failures\n\n");
            for (index, result) in failures {
                let status = result
                    .status
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "-".to_string());
                md.push_str(&format!(
                    "- #{} (status {}): {}\n",
                    index + 1,
                    status,
                    truncate(result.error.as_deref().unwrap_or("unknown error"))
                ));
            }
        }

        md.trim_end().to_string()
    }
}

fn truncate(text: &str) -> String {
    if text.chars().count() <= MAX_ERROR_CHARS {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(MAX_ERROR_CHARS).collect();
    cut.push('…');
    cut
}

fn instance_of(headers: &Headers) -> String {
    crate::traits::header_value(headers, INSTANCE_HEADER)
        .filter(|v| !v.is_empty())
        .unwrap_or(UNKNOWN_INSTANCE)
        .to_string()
}

impl<C: HttpClient> Orchestrator<C> {
    /// Run a load test with the current prompt and files.
    ///
    /// Returns `None` when skipped (busy, or an image endpoint without a
    /// selected image).
    pub async fn run_scale_test(
        &self,
        config: ScaleTestConfig,
    ) -> ClientResult<Option<ScaleTestReport>> {
        if self.session.is_busy() {
            return Ok(None);
        }
        let files = self.session.selected_files();
        if config.endpoint.file_mode() != FileMode::None && files.is_empty() {
            self.session.alert(NO_IMAGE_MESSAGE);
            return Ok(None);
        }

        let total = config.requests;
        let Some(_guard) = self
            .session
            .try_begin(&format!("Scale test: 0/{} done", total))
        else {
            return Ok(None);
        };

        let prompt = self.session.prompt();
        let body = match request_body(config.endpoint, &prompt, &files, self.config.max_new_tokens)
        {
            Ok(body) => body,
            Err(err) => return Err(self.fail(err)),
        };

        tracing::info!(
            "Scale test: {} requests to {} at concurrency {}",
            total,
            config.endpoint,
            config.concurrency
        );

        let gate = AdmissionGate::new(config.concurrency);
        let done = AtomicUsize::new(0);
        let url = self.url(config.endpoint);
        let started_at = Local::now();
        let started = Instant::now();

        let attempts = (0..total).map(|_| {
            self.attempt(&gate, config.endpoint, &url, body.clone(), &done, total)
        });
        let results = futures::future::join_all(attempts).await;

        let report = ScaleTestReport {
            config,
            results,
            started_at,
            total_ms: started.elapsed().as_secs_f64() * 1000.0,
            peak_concurrency: gate.peak(),
        };
        tracing::info!(
            "Scale test finished: {}/{} ok, peak concurrency {}",
            report.successes(),
            total,
            report.peak_concurrency
        );

        self.renderer.flush(&report.to_markdown());
        Ok(Some(report))
    }

    async fn attempt(
        &self,
        gate: &AdmissionGate,
        endpoint: Endpoint,
        url: &str,
        body: RequestBody,
        done: &AtomicUsize,
        total: usize,
    ) -> ScaleTestResult {
        let result = match gate.admit().await {
            Ok(_pass) => self.timed_request(endpoint, url, body).await,
            Err(e) => ScaleTestResult {
                ok: false,
                elapsed_ms: 0.0,
                status: None,
                instance: UNKNOWN_INSTANCE.to_string(),
                error: Some(e.to_string()),
            },
        };

        let finished = done.fetch_add(1, Ordering::SeqCst) + 1;
        self.session
            .set_status_base(&format!("Scale test: {}/{} done", finished, total));
        result
    }

    async fn timed_request(&self, endpoint: Endpoint, url: &str, body: RequestBody) -> ScaleTestResult {
        let start = Instant::now();
        let outcome = if endpoint.is_streaming() {
            self.streamed_request(url, body).await
        } else {
            self.buffered_request(url, body).await
        };
        let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;

        match outcome {
            Ok((status, instance)) => ScaleTestResult {
                ok: true,
                elapsed_ms,
                status: Some(status),
                instance,
                error: None,
            },
            Err((status, instance, error)) => {
                tracing::debug!("Scale test request failed: {}", error);
                ScaleTestResult {
                    ok: false,
                    elapsed_ms,
                    status,
                    instance,
                    error: Some(error),
                }
            }
        }
    }

    /// Open a stream and drain it through the decoder.
    async fn streamed_request(
        &self,
        url: &str,
        body: RequestBody,
    ) -> Result<(u16, String), (Option<u16>, String, String)> {
        match self.client.post_stream(url, body, &Headers::new()).await {
            Ok(response) => {
                let instance = instance_of(&response.headers);
                match ndjson::drain(response.body).await {
                    Ok(_) => Ok((response.status, instance)),
                    Err(err) => Err((Some(response.status), instance, err.to_string())),
                }
            }
            Err(HttpError::ServerError {
                status,
                message,
                headers,
            }) => Err((
                Some(status),
                instance_of(&headers),
                format!("{} {}", status, message),
            )),
            Err(err) => Err((None, UNKNOWN_INSTANCE.to_string(), err.to_string())),
        }
    }

    /// Send a request and read the whole body.
    async fn buffered_request(
        &self,
        url: &str,
        body: RequestBody,
    ) -> Result<(u16, String), (Option<u16>, String, String)> {
        match self.client.post(url, body, &Headers::new()).await {
            Ok(response) => {
                let instance = instance_of(&response.headers);
                if response.is_success() {
                    Ok((response.status, instance))
                } else {
                    Err((
                        Some(response.status),
                        instance,
                        format!("{} {}", response.status, response.text()),
                    ))
                }
            }
            Err(err) => Err((None, UNKNOWN_INSTANCE.to_string(), err.to_string())),
        }
    }
}
