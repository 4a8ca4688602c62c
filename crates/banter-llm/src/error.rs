//! Error types for banter-llm

use thiserror::Error;

/// Completion client error type
#[derive(Debug, Error)]
pub enum Error {
    /// Endpoint rejected the request or returned a failure status
    #[error("endpoint error: {0}")]
    Api(String),

    /// Response arrived but is missing expected fields
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// Network error
    #[error("network error: {0}")]
    Network(String),

    /// Timeout
    #[error("timeout after {0}ms")]
    Timeout(u64),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
