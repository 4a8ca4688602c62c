//! Static passage index for testing
//!
//! Serves a fixed passage list for every query and records the queries it
//! receives.

use crate::block::Passage;
use crate::error::Result;
use crate::index::PassageIndex;

use std::sync::{Arc, Mutex};

/// A passage index that always returns the same passages.
#[derive(Default)]
pub struct StaticIndex {
    passages: Vec<Passage>,
    queries: Arc<Mutex<Vec<(String, usize)>>>,
}

impl StaticIndex {
    /// Create an index with no passages (every query misses)
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Create an index serving the given passages
    #[must_use]
    pub fn with_passages(passages: Vec<Passage>) -> Self {
        Self {
            passages,
            queries: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Every `(text, n_results)` query received so far, in order.
    #[must_use]
    pub fn queries(&self) -> Vec<(String, usize)> {
        self.queries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

#[async_trait::async_trait]
impl PassageIndex for StaticIndex {
    async fn query(&self, text: &str, n_results: usize) -> Result<Vec<Passage>> {
        self.queries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push((text.to_string(), n_results));

        Ok(self.passages.iter().take(n_results).cloned().collect())
    }
}
