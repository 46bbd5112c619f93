//! Incremental decoder for `text/event-stream` chat-completion bodies.
//!
//! Bytes are pushed in whatever chunks the transport delivers. Multi-byte
//! UTF-8 sequences and lines may both straddle chunk boundaries; the decoder
//! carries the unfinished tail until the rest arrives.

use super::types::ChatCompletionChunk;

const DATA_PREFIX: &str = "data: ";
const DONE_SENTINEL: &str = "[DONE]";

/// What one decoded line amounts to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SseEvent {
    Fragment(String),
    Done,
}

#[derive(Debug, Default)]
pub struct SseDecoder {
    /// Trailing bytes of an incomplete UTF-8 sequence.
    pending_bytes: Vec<u8>,
    /// Text after the last newline seen so far.
    pending_line: String,
    finished: bool,
}

impl SseDecoder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// True once the sentinel has been seen; further input is ignored.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn push(&mut self, chunk: &[u8]) -> Vec<SseEvent> {
        if self.finished {
            return Vec::new();
        }
        let text = self.decode_utf8(chunk);
        self.pending_line.push_str(&text);

        let mut events = Vec::new();
        while let Some(newline) = self.pending_line.find('\n') {
            let rest = self.pending_line.split_off(newline + 1);
            let line = std::mem::replace(&mut self.pending_line, rest);
            if self.handle_line(&line, &mut events) {
                self.pending_line.clear();
                break;
            }
        }
        events
    }

    /// Flush whatever is left once the byte stream has ended.
    pub fn finish(&mut self) -> Vec<SseEvent> {
        if self.finished {
            return Vec::new();
        }
        let mut tail = std::mem::take(&mut self.pending_line);
        if !self.pending_bytes.is_empty() {
            tail.push_str(&String::from_utf8_lossy(&self.pending_bytes));
            self.pending_bytes.clear();
        }

        let mut events = Vec::new();
        self.handle_line(&tail, &mut events);
        self.finished = true;
        events
    }

    fn decode_utf8(&mut self, chunk: &[u8]) -> String {
        let mut bytes = std::mem::take(&mut self.pending_bytes);
        bytes.extend_from_slice(chunk);

        let mut decoded = String::with_capacity(bytes.len());
        let mut rest = bytes.as_slice();
        loop {
            match std::str::from_utf8(rest) {
                Ok(valid) => {
                    decoded.push_str(valid);
                    break;
                }
                Err(error) => {
                    let (valid, after) = rest.split_at(error.valid_up_to());
                    decoded.push_str(&String::from_utf8_lossy(valid));
                    match error.error_len() {
                        Some(bad) => {
                            decoded.push(char::REPLACEMENT_CHARACTER);
                            rest = &after[bad..];
                        }
                        None => {
                            // Incomplete sequence at the end of the chunk.
                            self.pending_bytes = after.to_vec();
                            break;
                        }
                    }
                }
            }
        }
        decoded
    }

    /// Returns true when the line was the completion sentinel.
    fn handle_line(&mut self, raw: &str, events: &mut Vec<SseEvent>) -> bool {
        let line = raw.trim_end_matches(['\n', '\r']);
        if line.trim().is_empty() {
            return false;
        }
        let Some(payload) = line.strip_prefix(DATA_PREFIX) else {
            return false;
        };
        let payload = payload.trim();
        if payload == DONE_SENTINEL {
            self.finished = true;
            events.push(SseEvent::Done);
            return true;
        }

        match serde_json::from_str::<ChatCompletionChunk>(payload) {
            Ok(chunk) => {
                if let Some(text) = chunk.delta_text() {
                    events.push(SseEvent::Fragment(text.to_string()));
                }
            }
            Err(error) => {
                tracing::warn!(payload, "Skipping malformed stream data line: {error}");
            }
        }
        false
    }
}
