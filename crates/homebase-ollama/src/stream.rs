//! Incremental decoding of the newline-delimited JSON response stream.

use serde::Deserialize;
use tracing::{debug, warn};

use crate::filter::filter_thinking;

/// One decoded line of the generate stream.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GenerationChunk {
    /// Text fragment produced since the previous chunk.
    #[serde(default)]
    pub response: String,
    /// Set on the final chunk.
    #[serde(default)]
    pub done: bool,
    /// Error reported by the server in place of a fragment.
    #[serde(default)]
    pub error: Option<String>,
}

impl GenerationChunk {
    pub fn parse(line: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(line)
    }
}

/// Splits arbitrary byte chunks into complete lines.
///
/// Lines come out as raw bytes; text decoding is left to
/// [`ResponseAssembler::feed_bytes`] so a multi-byte character split across
/// transport chunks is only decoded once whole.
#[derive(Debug, Default)]
pub struct LineDecoder {
    pending: Vec<u8>,
}

impl LineDecoder {
    /// Feed bytes and return every line they complete.
    pub fn push(&mut self, bytes: &[u8]) -> Vec<Vec<u8>> {
        let mut lines = Vec::new();
        for &byte in bytes {
            if byte == b'\n' {
                lines.push(self.take_line());
            } else {
                self.pending.push(byte);
            }
        }
        lines
    }

    /// Return the unterminated tail, if any, once the transport closes.
    pub fn finish(&mut self) -> Option<Vec<u8>> {
        if self.pending.is_empty() {
            None
        } else {
            Some(self.take_line())
        }
    }

    fn take_line(&mut self) -> Vec<u8> {
        let mut line = std::mem::take(&mut self.pending);
        if line.last() == Some(&b'\r') {
            line.pop();
        }
        line
    }
}

/// What the stream should do after a line has been fed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineOutcome {
    Continue,
    Done,
    /// The server reported an error mid-stream.
    Failed(String),
}

/// Accumulates fragments and drives progress notifications.
#[derive(Debug, Default)]
pub struct ResponseAssembler {
    buffer: String,
    skipped_lines: usize,
}

impl ResponseAssembler {
    /// Decode one raw line as UTF-8 and feed it.
    ///
    /// Invalid UTF-8 is handled like undecodable JSON: logged, counted and
    /// skipped.
    pub fn feed_bytes(&mut self, line: &[u8], on_progress: &mut impl FnMut(&str)) -> LineOutcome {
        match std::str::from_utf8(line) {
            Ok(line) => self.feed_line(line, on_progress),
            Err(e) => {
                self.skipped_lines += 1;
                warn!(
                    "Skipping stream line with invalid UTF-8 ({}): {:?}",
                    e,
                    String::from_utf8_lossy(line)
                );
                LineOutcome::Continue
            }
        }
    }

    /// Decode one line and fold its fragment into the buffer.
    ///
    /// Blank lines are ignored. Lines that are not valid JSON are logged and
    /// skipped. The progress callback receives the filtered buffer whenever
    /// the fragment has visible content.
    pub fn feed_line(&mut self, line: &str, on_progress: &mut impl FnMut(&str)) -> LineOutcome {
        if line.trim().is_empty() {
            return LineOutcome::Continue;
        }

        let chunk = match GenerationChunk::parse(line) {
            Ok(chunk) => chunk,
            Err(e) => {
                self.skipped_lines += 1;
                warn!("Skipping undecodable stream line ({}): {:?}", e, line);
                return LineOutcome::Continue;
            }
        };

        if let Some(error) = chunk.error {
            return LineOutcome::Failed(error);
        }

        self.buffer.push_str(&chunk.response);
        if !chunk.response.trim().is_empty() {
            on_progress(&self.partial());
        }

        if chunk.done {
            debug!("Stream signalled completion");
            LineOutcome::Done
        } else {
            LineOutcome::Continue
        }
    }

    /// Current filtered view of everything received so far.
    pub fn partial(&self) -> String {
        filter_thinking(&self.buffer)
    }

    /// Number of lines dropped because they failed to decode.
    pub fn skipped_lines(&self) -> usize {
        self.skipped_lines
    }

    /// Final filtered response.
    pub fn finish(self) -> String {
        filter_thinking(&self.buffer)
    }
}
