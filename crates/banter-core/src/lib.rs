//! Banter Core - Conversation Orchestration
//!
//! This crate glues the completion provider, the knowledge retriever and
//! the session store into the exchange loop of the Banter assistant:
//! - Session: the per-identifier record (bounded history + long-term summary)
//! - Store: session persistence (SQLite or in-memory)
//! - Prompt: system-message composition and transcript flattening
//! - Orchestrator: the exchange pipeline, blocking and streaming
//! - Gate: the paywall deflection for metered callers

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod gate;
pub mod orchestrator;
pub mod prompt;
pub mod session;
pub mod store;

pub use config::{
    OrchestratorConfig, DEFAULT_CHAT_LIMIT, DEFAULT_KNOWLEDGE_RESULTS, DEFAULT_SUMMARY_INSTRUCTION,
    DEFAULT_SYSTEM_MESSAGE,
};
pub use error::{Error, Result};
pub use gate::{ExchangeGate, GateConfig, GateDecision, DEFAULT_GATE_PERSONA, DEFAULT_GATE_THRESHOLD};
pub use orchestrator::{ExchangeStream, Orchestrator};
pub use session::{SessionRecord, INITIAL_SUMMARY};
pub use store::{MemoryStore, SessionStore, SqliteStore, StoreBackend, StoreConfig};
