//! Banter Knowledge - Retrieval Index Client
//!
//! This crate provides the retrieval side of the Banter assistant:
//! - Index: HTTP client for the external vector index (`{query_texts,
//!   n_results}` in, `{documents, metadatas}` out)
//! - Block: formatting retrieved passages into the knowledge block injected
//!   into the system prompt
//! - Retriever: the query-then-format operation the orchestrator calls

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod block;
pub mod error;
pub mod index;
pub mod mock;
pub mod retriever;

pub use block::{format_knowledge_block, Passage, KNOWLEDGE_HEADER};
pub use error::{Error, Result};
pub use index::{HttpPassageIndex, IndexConfig, PassageIndex, DEFAULT_QUERY_URL};
pub use mock::StaticIndex;
pub use retriever::Retriever;
