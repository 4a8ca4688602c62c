//! Session records for conversation continuity
//!
//! A session record is everything remembered about one identifier: a
//! bounded window of recent turns plus a one-paragraph long-term summary
//! that survives the window. Records are plain data; the orchestrator
//! drives when turns are appended and when the window is trimmed.

use banter_llm::Message;
use serde::{Deserialize, Serialize};

/// Summary text a record starts with before any exchange has run
pub const INITIAL_SUMMARY: &str = "This is the first time I've ever talked to this user.";

const RECORD_TYPE: &str = "session";

fn default_record_type() -> String {
    RECORD_TYPE.to_string()
}

/// Persisted conversation state for one identifier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    /// Record type tag in the stored JSON document
    #[serde(rename = "_type", default = "default_record_type")]
    pub record_type: String,

    /// Identifier the record is keyed by
    pub name: String,

    /// Recent turns, oldest first
    pub messages: Vec<Message>,

    /// Long-term summary, rewritten after every exchange
    pub ltm: String,
}

impl SessionRecord {
    /// Create the record a first-contact identifier starts with
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            record_type: RECORD_TYPE.to_string(),
            name: name.into(),
            messages: Vec::new(),
            ltm: INITIAL_SUMMARY.to_string(),
        }
    }

    /// Append a user turn
    pub fn push_user(&mut self, content: impl Into<String>) {
        self.messages.push(Message::user(content));
    }

    /// Append an assistant turn
    pub fn push_assistant(&mut self, content: impl Into<String>) {
        self.messages.push(Message::assistant(content));
    }

    /// Drop the oldest turns until at most `limit` remain
    pub fn truncate_to(&mut self, limit: usize) {
        if self.messages.len() > limit {
            let excess = self.messages.len() - limit;
            self.messages.drain(0..excess);
        }
    }

    /// Number of retained turns
    #[must_use]
    pub fn turn_count(&self) -> usize {
        self.messages.len()
    }
}
