//! Completion provider trait definition
//!
//! This module defines the seam between the orchestrator and whatever
//! produces completions: the HTTP client in deployment, a scripted mock in
//! tests.

use crate::completion::{CompletionRequest, CompletionResponse};
use crate::error::Result;
use futures::stream::Stream;
use std::pin::Pin;

/// Lazy, finite, non-restartable sequence of response fragments.
///
/// Each `Ok` item is one decoded content fragment. An `Err` item reports a
/// transport fault mid-stream; nothing follows it. Plain exhaustion without
/// an `Err` means the stream ended cleanly at the terminator, so consumers
/// can tell a truncated response from a complete one.
pub type FragmentStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

/// Trait for completion providers
#[async_trait::async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Get the provider name
    fn name(&self) -> &str;

    /// Complete a conversation, blocking until the full response arrives
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse>;

    /// Complete a conversation with incremental delivery.
    ///
    /// The request is not sent until the stream is first polled.
    fn complete_streaming(&self, request: CompletionRequest) -> FragmentStream;
}
