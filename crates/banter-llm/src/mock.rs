//! Mock completion provider for testing
//!
//! Returns queued responses or default ones, and records every request it
//! receives so tests can assert on the prompts the orchestrator composes.

use crate::completion::{CompletionRequest, CompletionResponse};
use crate::error::{Error, Result};
use crate::provider::{CompletionProvider, FragmentStream};

use futures::StreamExt;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

struct ScriptedStream {
    fragments: Vec<String>,
    fault: Option<String>,
}

/// A mock completion provider with queued replies and scripted streams.
pub struct MockProvider {
    replies: Arc<Mutex<VecDeque<String>>>,
    streams: Arc<Mutex<VecDeque<ScriptedStream>>>,
    requests: Arc<Mutex<Vec<CompletionRequest>>>,
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MockProvider {
    /// Create a new mock provider.
    #[must_use]
    pub fn new() -> Self {
        Self {
            replies: Arc::new(Mutex::new(VecDeque::new())),
            streams: Arc::new(Mutex::new(VecDeque::new())),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Queue a blocking-mode reply.
    pub fn add_reply(&self, reply: impl Into<String>) {
        self.replies
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(reply.into());
    }

    /// Queue a streaming-mode fragment script.
    pub fn add_stream(&self, fragments: &[&str]) {
        self.streams
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(ScriptedStream {
                fragments: fragments.iter().map(|s| (*s).to_string()).collect(),
                fault: None,
            });
    }

    /// Queue a streaming-mode script that ends in a transport fault.
    pub fn add_stream_with_fault(&self, fragments: &[&str], fault: impl Into<String>) {
        self.streams
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(ScriptedStream {
                fragments: fragments.iter().map(|s| (*s).to_string()).collect(),
                fault: Some(fault.into()),
            });
    }

    /// Every request received so far, in order.
    #[must_use]
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    fn record(&self, request: &CompletionRequest) {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(request.clone());
    }
}

#[async_trait::async_trait]
impl CompletionProvider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        self.record(&request);

        let content = self
            .replies
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front()
            .unwrap_or_else(|| "mock response".to_string());

        Ok(CompletionResponse {
            content,
            finish_reason: Some("stop".to_string()),
            model: Some("mock-model".to_string()),
        })
    }

    fn complete_streaming(&self, request: CompletionRequest) -> FragmentStream {
        self.record(&request);

        let script = self
            .streams
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front()
            .unwrap_or_else(|| ScriptedStream {
                fragments: vec!["mock response".to_string()],
                fault: None,
            });

        let mut items: Vec<Result<String>> = script.fragments.into_iter().map(Ok).collect();
        if let Some(fault) = script.fault {
            items.push(Err(Error::Network(fault)));
        }

        futures::stream::iter(items).boxed()
    }
}
