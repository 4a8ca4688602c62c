//! Error types for banter-knowledge

use thiserror::Error;

/// Knowledge retrieval error type
#[derive(Debug, Error)]
pub enum Error {
    /// Index rejected the query or returned a failure status
    #[error("index query failed: {0}")]
    Query(String),

    /// Reply arrived but does not match the query contract
    #[error("invalid index response: {0}")]
    InvalidResponse(String),

    /// Network error
    #[error("network error: {0}")]
    Network(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
