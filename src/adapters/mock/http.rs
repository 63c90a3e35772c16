//! Mock HTTP client for testing.
//!
//! Provides a configurable mock HTTP client that can return predefined
//! responses or errors for testing purposes.

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::traits::{
    ByteStream, Headers, HttpClient, HttpError, RequestBody, Response, StreamingResponse,
};

/// A recorded HTTP request for verification in tests.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    /// HTTP method (GET or POST)
    pub method: String,
    /// Request URL
    pub url: String,
    /// Request headers
    pub headers: Headers,
    /// Request body (for POST requests)
    pub body: Option<RequestBody>,
}

/// Configuration for a mock response.
#[derive(Debug, Clone)]
pub enum MockResponse {
    /// Return a buffered response with any status
    Success(Response),
    /// Fail before any response arrives
    Error(HttpError),
    /// Return a 200 streamed body made of these chunks
    Stream(Vec<Bytes>),
    /// Return a 200 streamed body with response headers
    StreamWithHeaders { headers: Headers, chunks: Vec<Bytes> },
    /// Return some chunks, then fail mid-body
    BrokenStream { chunks: Vec<Bytes>, error: HttpError },
}

impl MockResponse {
    /// Buffered response with a JSON body.
    pub fn json(status: u16, value: serde_json::Value) -> Self {
        MockResponse::Success(Response::new(status, Bytes::from(value.to_string())))
    }

    /// Buffered response with a text body.
    pub fn text(status: u16, body: impl Into<String>) -> Self {
        MockResponse::Success(Response::new(status, Bytes::from(body.into())))
    }

    /// Streamed body, one chunk per string.
    pub fn ndjson<I, S>(chunks: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        MockResponse::Stream(chunks.into_iter().map(|c| Bytes::from(c.into())).collect())
    }
}

/// Mock HTTP client for testing.
///
/// Responses are looked up per URL: queued one-shot responses first, then
/// the sticky response for the exact URL, then the longest configured
/// prefix, then the default.
///
/// # Example
///
/// ```ignore
/// use captioneer::adapters::mock::{MockHttpClient, MockResponse};
///
/// let client = MockHttpClient::new();
/// client.push_response(
///     "http://localhost:5000/describeimagestream",
///     MockResponse::ndjson(["{\"response\":\"A cat\"}\n"]),
/// );
/// client.push_response(
///     "http://localhost:5000/describeimagestream",
///     MockResponse::text(404, "Not Found"),
/// );
/// ```
#[derive(Debug, Clone)]
pub struct MockHttpClient {
    /// Sticky responses by URL or URL prefix
    responses: Arc<Mutex<HashMap<String, MockResponse>>>,
    /// One-shot responses by exact URL, consumed in order
    queued: Arc<Mutex<HashMap<String, VecDeque<MockResponse>>>>,
    /// Default response when no specific match
    default_response: Arc<Mutex<Option<MockResponse>>>,
    /// Recorded requests for verification
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    /// Artificial latency before each response
    delay: Arc<Mutex<Option<Duration>>>,
    in_flight: Arc<AtomicUsize>,
    peak_in_flight: Arc<AtomicUsize>,
}

impl MockHttpClient {
    /// Create a new mock HTTP client.
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(HashMap::new())),
            queued: Arc::new(Mutex::new(HashMap::new())),
            default_response: Arc::new(Mutex::new(None)),
            requests: Arc::new(Mutex::new(Vec::new())),
            delay: Arc::new(Mutex::new(None)),
            in_flight: Arc::new(AtomicUsize::new(0)),
            peak_in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Set a response for a URL or URL prefix.
    pub fn set_response(&self, url: &str, response: MockResponse) {
        let mut responses = self.responses.lock().unwrap();
        responses.insert(url.to_string(), response);
    }

    /// Queue a one-shot response for an exact URL.
    pub fn push_response(&self, url: &str, response: MockResponse) {
        let mut queued = self.queued.lock().unwrap();
        queued.entry(url.to_string()).or_default().push_back(response);
    }

    /// Set a default response for URLs without specific matches.
    pub fn set_default_response(&self, response: MockResponse) {
        let mut default = self.default_response.lock().unwrap();
        *default = Some(response);
    }

    /// Delay every response by `delay`.
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = Some(delay);
    }

    /// Get all recorded requests.
    pub fn get_requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Recorded requests whose URL ends with `path`.
    pub fn requests_to(&self, path: &str) -> Vec<RecordedRequest> {
        self.get_requests()
            .into_iter()
            .filter(|r| r.url.ends_with(path))
            .collect()
    }

    /// Highest number of requests that were in flight at once.
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    /// Record a request.
    fn record_request(&self, method: &str, url: &str, headers: &Headers, body: Option<RequestBody>) {
        let mut requests = self.requests.lock().unwrap();
        requests.push(RecordedRequest {
            method: method.to_string(),
            url: url.to_string(),
            headers: headers.clone(),
            body,
        });
    }

    /// Get the response for a URL.
    fn get_response(&self, url: &str) -> Option<MockResponse> {
        if let Some(queue) = self.queued.lock().unwrap().get_mut(url) {
            if let Some(response) = queue.pop_front() {
                return Some(response);
            }
        }

        let responses = self.responses.lock().unwrap();

        // First try exact match
        if let Some(response) = responses.get(url) {
            return Some(response.clone());
        }

        // Then the longest matching prefix
        let prefixed = responses
            .iter()
            .filter(|(pattern, _)| url.starts_with(pattern.as_str()))
            .max_by_key(|(pattern, _)| pattern.len())
            .map(|(_, response)| response.clone());
        if prefixed.is_some() {
            return prefixed;
        }

        // Finally use default
        let default = self.default_response.lock().unwrap();
        default.clone()
    }

    /// Resolve a response, applying the configured delay and in-flight tracking.
    async fn respond(&self, url: &str) -> Option<MockResponse> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);

        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let response = self.get_response(url);
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        response
    }

    fn buffered(response: Option<MockResponse>, url: &str) -> Result<Response, HttpError> {
        match response {
            Some(MockResponse::Success(response)) => Ok(response),
            Some(MockResponse::Error(err)) => Err(err),
            Some(MockResponse::Stream(chunks)) => Ok(Response::new(200, concat(chunks))),
            Some(MockResponse::StreamWithHeaders { headers, chunks }) => {
                Ok(Response::with_headers(200, headers, concat(chunks)))
            }
            Some(MockResponse::BrokenStream { error, .. }) => Err(error),
            None => Err(HttpError::Other(format!("No mock response for URL: {}", url))),
        }
    }
}

fn concat(chunks: Vec<Bytes>) -> Bytes {
    let mut body = BytesMut::new();
    for chunk in chunks {
        body.extend_from_slice(&chunk);
    }
    body.freeze()
}

fn chunk_stream(chunks: Vec<Bytes>, error: Option<HttpError>) -> ByteStream {
    let items = chunks
        .into_iter()
        .map(Ok)
        .chain(error.into_iter().map(Err))
        .collect::<Vec<_>>();
    Box::pin(futures::stream::iter(items))
}

impl Default for MockHttpClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HttpClient for MockHttpClient {
    async fn get(&self, url: &str, headers: &Headers) -> Result<Response, HttpError> {
        self.record_request("GET", url, headers, None);
        let response = self.respond(url).await;
        Self::buffered(response, url)
    }

    async fn post(
        &self,
        url: &str,
        body: RequestBody,
        headers: &Headers,
    ) -> Result<Response, HttpError> {
        self.record_request("POST", url, headers, Some(body));
        let response = self.respond(url).await;
        Self::buffered(response, url)
    }

    async fn post_stream(
        &self,
        url: &str,
        body: RequestBody,
        headers: &Headers,
    ) -> Result<StreamingResponse, HttpError> {
        self.record_request("POST", url, headers, Some(body));

        match self.respond(url).await {
            Some(MockResponse::Stream(chunks)) => Ok(StreamingResponse {
                status: 200,
                headers: Headers::new(),
                body: chunk_stream(chunks, None),
            }),
            Some(MockResponse::StreamWithHeaders { headers, chunks }) => Ok(StreamingResponse {
                status: 200,
                headers,
                body: chunk_stream(chunks, None),
            }),
            Some(MockResponse::BrokenStream { chunks, error }) => Ok(StreamingResponse {
                status: 200,
                headers: Headers::new(),
                body: chunk_stream(chunks, Some(error)),
            }),
            Some(MockResponse::Success(response)) if response.is_success() => {
                Ok(StreamingResponse {
                    status: response.status,
                    headers: response.headers,
                    body: chunk_stream(vec![response.body], None),
                })
            }
            Some(MockResponse::Success(response)) => Err(HttpError::ServerError {
                status: response.status,
                message: response.text(),
                headers: response.headers,
            }),
            Some(MockResponse::Error(err)) => Err(err),
            None => Err(HttpError::Other(format!("No mock response for URL: {}", url))),
        }
    }
}
