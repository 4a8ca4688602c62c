//! Stream frame decoding for the completion endpoint
//!
//! Streaming responses arrive as newline-separated frames. Each frame is
//! either blank, the `data: [DONE]` terminator, or `data: ` followed by a
//! JSON chunk carrying `choices[0].delta.content`. Decoding is a typed
//! decision per frame so the caller can log and count what it skips instead
//! of suppressing every failure alike.

use serde::Deserialize;

/// Frame prefix preceding each JSON chunk
pub const DATA_PREFIX: &str = "data: ";

/// Terminator payload ending a stream
pub const DONE_SENTINEL: &str = "[DONE]";

/// Outcome of decoding a single stream frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameOutcome {
    /// Frame carried an incremental content fragment
    Fragment(String),
    /// Frame was the stream terminator
    Done,
    /// Frame carried nothing usable and is skipped
    Skip(SkipReason),
}

/// Why a frame was skipped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Blank keep-alive or separator line
    Empty,
    /// Payload failed to parse as JSON
    Malformed,
    /// Chunk parsed but carried no delta content
    NoContent,
}

impl SkipReason {
    /// Returns the string representation
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Empty => "empty",
            Self::Malformed => "malformed",
            Self::NoContent => "no_content",
        }
    }
}

#[derive(Deserialize)]
struct StreamChunk {
    choices: Vec<StreamChoice>,
}

#[derive(Deserialize)]
struct StreamChoice {
    delta: StreamDelta,
}

#[derive(Deserialize)]
struct StreamDelta {
    content: Option<String>,
}

/// Decode one stream frame into a typed outcome.
///
/// Blank frames are skipped, the terminator ends the stream, and the
/// `data: ` prefix is stripped before the JSON payload is parsed. A frame
/// that fails to parse, or parses without delta content (role announcements,
/// finish chunks), is skipped without ending the stream.
#[must_use]
pub fn decode_frame(frame: &str) -> FrameOutcome {
    if frame.is_empty() {
        return FrameOutcome::Skip(SkipReason::Empty);
    }

    let payload = frame.strip_prefix(DATA_PREFIX).unwrap_or(frame);

    if payload.trim() == DONE_SENTINEL {
        return FrameOutcome::Done;
    }

    let chunk: StreamChunk = match serde_json::from_str(payload) {
        Ok(chunk) => chunk,
        Err(_) => return FrameOutcome::Skip(SkipReason::Malformed),
    };

    match chunk.choices.into_iter().next().and_then(|c| c.delta.content) {
        Some(content) => FrameOutcome::Fragment(content),
        None => FrameOutcome::Skip(SkipReason::NoContent),
    }
}

/// Splits an incoming byte stream into complete frames.
///
/// Transport chunks do not align with frame boundaries; bytes are buffered
/// until a newline completes a frame. Carriage returns are stripped.
#[derive(Debug, Default)]
pub struct LineBuffer {
    buf: String,
}

impl LineBuffer {
    /// Create an empty buffer
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append raw bytes from the transport
    pub fn push(&mut self, bytes: &[u8]) {
        self.buf.push_str(&String::from_utf8_lossy(bytes));
    }

    /// Pop the next complete frame, if one is buffered
    pub fn next_line(&mut self) -> Option<String> {
        let pos = self.buf.find('\n')?;
        let line = self.buf[..pos].trim_end_matches('\r').to_string();
        self.buf.drain(..=pos);
        Some(line)
    }

    /// Drain whatever remains after the transport ends mid-frame
    pub fn take_remainder(&mut self) -> Option<String> {
        if self.buf.is_empty() {
            return None;
        }
        let line = self.buf.trim_end_matches('\r').to_string();
        self.buf.clear();
        Some(line)
    }
}
