//! Banter LLM - Completion Endpoint Client
//!
//! This crate provides the completion side of the Banter assistant:
//! - Client: raw HTTP client for an OpenAI-compatible `/chat/completions`
//!   endpoint, blocking and streaming
//! - Sse: typed decoding of streamed response frames
//! - Provider: the trait seam between the orchestrator and a completion
//!   backend, plus a scripted mock for tests

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod client;
pub mod completion;
pub mod error;
pub mod message;
pub mod mock;
pub mod provider;
pub mod sse;

pub use client::{
    mask_api_key, ClientConfig, HttpCompletionClient, DEFAULT_API_KEY, DEFAULT_BASE_URL,
    DEFAULT_MODEL,
};
pub use completion::{CompletionRequest, CompletionResponse};
pub use error::{Error, Result};
pub use message::{Message, MessageRole};
pub use mock::MockProvider;
pub use provider::{CompletionProvider, FragmentStream};
pub use sse::{decode_frame, FrameOutcome, LineBuffer, SkipReason};
