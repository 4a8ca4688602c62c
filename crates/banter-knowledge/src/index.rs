//! Passage index client
//!
//! The vector index is an external service reached over HTTP with a narrow
//! contract: POST `{query_texts, n_results}`, receive `{documents,
//! metadatas}` ranked by similarity. Only the first result list is used.

use crate::block::Passage;
use crate::error::{Error, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument};

/// Default index query URL
pub const DEFAULT_QUERY_URL: &str = "http://localhost:8000/query";

/// Passage index configuration
#[derive(Debug, Clone)]
pub struct IndexConfig {
    /// Full URL the query body is posted to
    pub query_url: String,
    /// Request timeout
    pub timeout: Duration,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            query_url: DEFAULT_QUERY_URL.to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

impl IndexConfig {
    /// Create configuration with the default query URL
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create configuration from `KNOWLEDGE_URL`
    #[must_use]
    pub fn from_env() -> Self {
        let query_url =
            std::env::var("KNOWLEDGE_URL").unwrap_or_else(|_| DEFAULT_QUERY_URL.to_string());

        Self {
            query_url,
            timeout: Duration::from_secs(30),
        }
    }

    /// Set the query URL
    #[must_use]
    pub fn with_query_url(mut self, query_url: impl Into<String>) -> Self {
        self.query_url = query_url.into();
        self
    }

    /// Set the timeout
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Trait for passage indexes
#[async_trait::async_trait]
pub trait PassageIndex: Send + Sync {
    /// Return the `n_results` passages nearest to `text`, best first.
    ///
    /// Zero matches is not an error; the result is then empty.
    async fn query(&self, text: &str, n_results: usize) -> Result<Vec<Passage>>;
}

/// Passage index reached over HTTP
pub struct HttpPassageIndex {
    client: Client,
    config: IndexConfig,
}

// Wire types for the index query contract
#[derive(Serialize)]
struct QueryRequest<'a> {
    query_texts: Vec<&'a str>,
    n_results: usize,
}

#[derive(Deserialize)]
struct QueryResponse {
    documents: Vec<Vec<String>>,
    metadatas: Vec<Vec<QueryMetadata>>,
}

#[derive(Deserialize)]
struct QueryMetadata {
    url: String,
    paragraph: u32,
}

impl HttpPassageIndex {
    /// Create a new index client
    #[must_use]
    pub fn new(config: IndexConfig) -> Self {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .expect("Failed to create HTTP client");

        Self { client, config }
    }

    /// Create from environment variables
    #[must_use]
    pub fn from_env() -> Self {
        Self::new(IndexConfig::from_env())
    }
}

#[async_trait::async_trait]
impl PassageIndex for HttpPassageIndex {
    #[instrument(skip(self, text))]
    async fn query(&self, text: &str, n_results: usize) -> Result<Vec<Passage>> {
        let body = QueryRequest {
            query_texts: vec![text],
            n_results,
        };

        debug!("Querying passage index");

        let response = self
            .client
            .post(&self.config.query_url)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(Error::Query(format!("index returned {status}")));
        }

        let reply: QueryResponse = response
            .json()
            .await
            .map_err(|e| Error::InvalidResponse(e.to_string()))?;

        let documents = reply.documents.into_iter().next().unwrap_or_default();
        let metadatas = reply.metadatas.into_iter().next().unwrap_or_default();

        if documents.len() != metadatas.len() {
            return Err(Error::InvalidResponse(format!(
                "{} documents with {} metadata entries",
                documents.len(),
                metadatas.len()
            )));
        }

        let passages = documents
            .into_iter()
            .zip(metadatas)
            .map(|(text, meta)| Passage::new(text, meta.url, meta.paragraph))
            .collect();

        Ok(passages)
    }
}
