//! NDJSON stream decoding.
//!
//! Streaming endpoints answer with newline-delimited JSON. Lines may carry an
//! SSE-style `data:` prefix, which is stripped. Decoding is best-effort:
//!
//! - chunk boundaries are arbitrary; bytes are buffered until a `\n` arrives
//! - blank lines are skipped
//! - lines that are not valid JSON are logged, counted and dropped
//! - an unterminated trailing line at end of stream is discarded, not parsed
//!
//! # Module structure
//! - `decoder` - line splitting and per-line parsing (`NdjsonDecoder`, `parse_line`)
//! - `events` - lenient typed view over decoded values (`StreamEvent`)
//! - `stream` - decoding a response body (`decode_stream`, `event_stream`, `drain`)

mod decoder;
mod events;
mod stream;

pub use decoder::{parse_line, LineOutcome, NdjsonDecoder};
pub use events::{EventKind, StreamEvent};
pub use stream::{decode_stream, drain, event_stream, DecodeSummary, ValueStream};
