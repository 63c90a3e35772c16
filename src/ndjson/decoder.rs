//! Line splitting and per-line parsing.

use serde_json::Value;

/// Result of parsing one complete line.
#[derive(Debug, Clone, PartialEq)]
pub enum LineOutcome {
    /// Nothing but whitespace (or a bare `data:` prefix)
    Blank,
    /// A well-formed JSON value
    Value(Value),
    /// Not valid JSON; dropped by the decoder
    Malformed { line: String, error: String },
}

/// Parse a single line: trim, strip an optional `data:` prefix, parse JSON.
pub fn parse_line(raw: &str) -> LineOutcome {
    let line = raw.trim();
    if line.is_empty() {
        return LineOutcome::Blank;
    }

    let line = match line.strip_prefix("data:") {
        Some(rest) => rest.trim(),
        None => line,
    };
    if line.is_empty() {
        return LineOutcome::Blank;
    }

    match serde_json::from_str(line) {
        Ok(value) => LineOutcome::Value(value),
        Err(e) => LineOutcome::Malformed {
            line: line.to_string(),
            error: e.to_string(),
        },
    }
}

/// Stateful NDJSON decoder.
///
/// Keeps a single byte buffer so that multi-byte UTF-8 sequences split
/// across chunks decode correctly. Output is identical however the input is
/// chunked.
#[derive(Debug, Default)]
pub struct NdjsonDecoder {
    /// Bytes after the last newline seen so far
    buffer: Vec<u8>,
    /// Values emitted so far
    decoded: u64,
    /// Complete lines dropped as malformed
    dropped: u64,
}

impl NdjsonDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk and return the values of every line it completes.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<Value> {
        self.buffer.extend_from_slice(chunk);

        let Some(last_newline) = self.buffer.iter().rposition(|&b| b == b'\n') else {
            return Vec::new();
        };

        let rest = self.buffer.split_off(last_newline + 1);
        let complete = std::mem::replace(&mut self.buffer, rest);

        let mut values = Vec::new();
        for raw in complete.split(|&b| b == b'\n') {
            if raw.is_empty() {
                continue;
            }
            match parse_line(&String::from_utf8_lossy(raw)) {
                LineOutcome::Blank => {}
                LineOutcome::Value(value) => {
                    self.decoded += 1;
                    values.push(value);
                }
                LineOutcome::Malformed { line, error } => {
                    self.dropped += 1;
                    tracing::warn!("Failed to parse JSON line: {} ({})", line, error);
                }
            }
        }
        values
    }

    /// Signal end of stream.
    ///
    /// Leftover bytes without a terminating newline are discarded, not
    /// parsed. Returns the number of discarded bytes. A well-behaved backend
    /// always terminates its final line.
    pub fn finish(&mut self) -> usize {
        let leftover = self.buffer.len();
        if leftover > 0 {
            let trimmed = String::from_utf8_lossy(&self.buffer).trim().len();
            if trimmed > 0 {
                tracing::warn!(
                    "Discarding {} bytes of unterminated trailing line at end of stream",
                    leftover
                );
            }
            self.buffer.clear();
        }
        leftover
    }

    /// Number of complete lines dropped because they were not valid JSON.
    pub fn dropped_lines(&self) -> u64 {
        self.dropped
    }

    /// Number of values emitted so far.
    pub fn decoded_values(&self) -> u64 {
        self.decoded
    }

    /// Bytes waiting for a newline.
    pub fn pending_bytes(&self) -> usize {
        self.buffer.len()
    }
}
