//! Decoding a response body.

use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;

use futures::stream::{self, Stream, StreamExt};
use serde_json::Value;

use super::decoder::NdjsonDecoder;
use crate::error::{ClientError, ClientResult};
use crate::traits::ByteStream;

/// Lazy stream of decoded values.
pub type ValueStream = Pin<Box<dyn Stream<Item = ClientResult<Value>> + Send>>;

/// Counters collected while decoding one body.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecodeSummary {
    pub values: u64,
    pub dropped_lines: u64,
    pub discarded_bytes: usize,
    pub bytes: usize,
}

/// Decode a body, awaiting `consumer` for each value before the next line
/// is processed.
///
/// A consumer error stops decoding and is returned as-is. A body read error
/// ends decoding with [`ClientError::Transport`].
pub async fn decode_stream<F, Fut>(mut body: ByteStream, mut consumer: F) -> ClientResult<DecodeSummary>
where
    F: FnMut(Value) -> Fut,
    Fut: Future<Output = ClientResult<()>>,
{
    let mut decoder = NdjsonDecoder::new();
    let mut summary = DecodeSummary::default();

    while let Some(chunk) = body.next().await {
        let chunk = chunk?;
        summary.bytes += chunk.len();
        for value in decoder.push(&chunk) {
            consumer(value).await?;
        }
    }

    summary.discarded_bytes = decoder.finish();
    summary.values = decoder.decoded_values();
    summary.dropped_lines = decoder.dropped_lines();
    Ok(summary)
}

/// Read a body to the end through the decoder, discarding values.
pub async fn drain(body: ByteStream) -> ClientResult<DecodeSummary> {
    decode_stream(body, |_| async { Ok(()) }).await
}

struct UnfoldState {
    body: ByteStream,
    decoder: NdjsonDecoder,
    ready: VecDeque<Value>,
    finished: bool,
}

/// Expose a body as a lazy stream of decoded values.
///
/// Chunks are only pulled from the body when every value decoded so far has
/// been taken. The stream ends after the first body read error.
pub fn event_stream(body: ByteStream) -> ValueStream {
    let state = UnfoldState {
        body,
        decoder: NdjsonDecoder::new(),
        ready: VecDeque::new(),
        finished: false,
    };

    Box::pin(stream::unfold(state, |mut state| async move {
        loop {
            if let Some(value) = state.ready.pop_front() {
                return Some((Ok(value), state));
            }
            if state.finished {
                return None;
            }

            match state.body.next().await {
                Some(Ok(chunk)) => {
                    let values = state.decoder.push(&chunk);
                    state.ready.extend(values);
                }
                Some(Err(e)) => {
                    tracing::debug!("Stream body read failed: {}", e);
                    state.finished = true;
                    return Some((Err(ClientError::Transport(e)), state));
                }
                None => {
                    state.decoder.finish();
                    if state.decoder.dropped_lines() > 0 {
                        tracing::debug!(
                            "Stream ended with {} dropped lines",
                            state.decoder.dropped_lines()
                        );
                    }
                    state.finished = true;
                }
            }
        }
    }))
}
