//! Canned backend responses.

pub use captioneer::adapters::mock::{MockHttpClient, MockResponse};
pub use captioneer::traits::{Headers, HttpError, Response};

use bytes::Bytes;
use serde_json::Value;

/// One NDJSON line per value, each sent as its own chunk.
pub fn stream_of(values: &[Value]) -> MockResponse {
    MockResponse::ndjson(values.iter().map(|v| format!("{}\n", v)))
}

/// The whole NDJSON body split into fixed-size byte chunks.
#[allow(dead_code)]
pub fn stream_in_chunks(values: &[Value], chunk_size: usize) -> MockResponse {
    let body: String = values.iter().map(|v| format!("{}\n", v)).collect();
    let chunks = body
        .as_bytes()
        .chunks(chunk_size.max(1))
        .map(Bytes::copy_from_slice)
        .collect();
    MockResponse::Stream(chunks)
}

/// Streamed body tagged with the answering replica.
#[allow(dead_code)]
pub fn stream_from_instance(instance: &str, values: &[Value]) -> MockResponse {
    let mut headers = Headers::new();
    headers.insert("x-instance-id".to_string(), instance.to_string());
    MockResponse::StreamWithHeaders {
        headers,
        chunks: values.iter().map(|v| Bytes::from(format!("{}\n", v))).collect(),
    }
}

/// Buffered JSON response tagged with the answering replica.
#[allow(dead_code)]
pub fn json_from_instance(instance: &str, status: u16, value: Value) -> MockResponse {
    let mut headers = Headers::new();
    headers.insert("x-instance-id".to_string(), instance.to_string());
    MockResponse::Success(Response::with_headers(
        status,
        headers,
        Bytes::from(value.to_string()),
    ))
}
