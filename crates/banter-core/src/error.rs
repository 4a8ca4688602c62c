//! Error types for banter-core

use thiserror::Error;

/// Core error type
#[derive(Debug, Error)]
pub enum Error {
    /// Completion endpoint error
    #[error("llm error: {0}")]
    Llm(#[from] banter_llm::Error),

    /// Knowledge retrieval error
    #[error("knowledge error: {0}")]
    Knowledge(#[from] banter_knowledge::Error),

    /// Session storage error
    #[error("storage error: {0}")]
    Storage(String),

    /// Invalid configuration
    #[error("invalid configuration: {field}")]
    InvalidConfig {
        /// Config field name
        field: String,
        /// Detailed message
        message: String,
    },

    /// Internal error (serialization, lock poisoning, etc.)
    #[error("internal error: {0}")]
    Internal(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
