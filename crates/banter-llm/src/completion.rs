//! Request and response types for the completion endpoint
//!
//! This module defines the types for completion-endpoint requests and
//! responses. The request body on the wire is `{model, messages[, stream]}`;
//! the endpoint carries no tuning parameters beyond the model name.

use crate::message::Message;
use serde::{Deserialize, Serialize};

/// Request for one completion call
#[derive(Debug, Clone, Default)]
pub struct CompletionRequest {
    /// Model to use (endpoint-specific identifier)
    pub model: String,
    /// Messages in the conversation
    pub messages: Vec<Message>,
}

impl CompletionRequest {
    /// Start a request against `model`
    #[must_use]
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            ..Default::default()
        }
    }

    /// Append one message
    #[must_use]
    pub fn with_message(mut self, message: Message) -> Self {
        self.messages.push(message);
        self
    }

    /// Append a batch of messages
    #[must_use]
    pub fn with_messages(mut self, messages: Vec<Message>) -> Self {
        self.messages.extend(messages);
        self
    }
}

/// Completion response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionResponse {
    /// Generated content of the first choice
    pub content: String,
    /// Finish reason, when the endpoint reports one
    pub finish_reason: Option<String>,
    /// Model that produced the response, when reported
    pub model: Option<String>,
}
