//! Knowledge retriever
//!
//! `retrieve` is the one operation the orchestrator calls: query the index,
//! format the hits into a knowledge block.

use crate::block::format_knowledge_block;
use crate::error::Result;
use crate::index::PassageIndex;

use std::sync::Arc;
use tracing::debug;

/// Retrieves and formats knowledge for a user message
#[derive(Clone)]
pub struct Retriever {
    index: Arc<dyn PassageIndex>,
}

impl Retriever {
    /// Create a retriever over an index
    #[must_use]
    pub fn new(index: Arc<dyn PassageIndex>) -> Self {
        Self { index }
    }

    /// Build the knowledge block for `query` from the top `n_results` hits.
    ///
    /// An index miss degrades to a header-only block; only a failed query
    /// is an error.
    pub async fn retrieve(&self, query: &str, n_results: usize) -> Result<String> {
        let passages = self.index.query(query, n_results).await?;
        debug!(hits = passages.len(), "Retrieved passages");
        Ok(format_knowledge_block(&passages))
    }
}
