//! Session storage backends
//!
//! A store maps identifiers to [`SessionRecord`]s. Lookups that miss
//! create the default record in place, so callers never see an absent
//! session. Saves replace the whole record (last writer wins) and
//! records are kept until an operator deletes them.

mod sqlite;

pub use sqlite::{SqliteStore, StoreBackend, StoreConfig};

use crate::error::Result;
use crate::session::SessionRecord;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// Backend-agnostic session persistence
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Look up a record without creating one
    async fn get(&self, name: &str) -> Result<Option<SessionRecord>>;

    /// Look up a record, inserting the default record on first contact
    async fn get_or_create(&self, name: &str) -> Result<SessionRecord>;

    /// Replace the record stored under its identifier
    async fn save(&self, record: &SessionRecord) -> Result<()>;

    /// Delete a record, returning whether one existed
    async fn delete(&self, name: &str) -> Result<bool>;

    /// List all stored identifiers
    async fn list(&self) -> Result<Vec<String>>;
}

/// In-memory session store
///
/// Used in tests and for ephemeral runs; contents vanish with the
/// process.
#[derive(Default)]
pub struct MemoryStore {
    records: Arc<RwLock<HashMap<String, SessionRecord>>>,
}

impl MemoryStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn get(&self, name: &str) -> Result<Option<SessionRecord>> {
        let records = self.records.read().await;
        Ok(records.get(name).cloned())
    }

    async fn get_or_create(&self, name: &str) -> Result<SessionRecord> {
        {
            let records = self.records.read().await;
            if let Some(record) = records.get(name) {
                return Ok(record.clone());
            }
        }

        let mut records = self.records.write().await;
        let record = records
            .entry(name.to_string())
            .or_insert_with(|| {
                debug!(identifier = %name, "Creating session record on first contact");
                SessionRecord::new(name)
            })
            .clone();
        Ok(record)
    }

    async fn save(&self, record: &SessionRecord) -> Result<()> {
        let mut records = self.records.write().await;
        records.insert(record.name.clone(), record.clone());
        Ok(())
    }

    async fn delete(&self, name: &str) -> Result<bool> {
        let mut records = self.records.write().await;
        Ok(records.remove(name).is_some())
    }

    async fn list(&self) -> Result<Vec<String>> {
        let records = self.records.read().await;
        Ok(records.keys().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::INITIAL_SUMMARY;

    #[tokio::test]
    async fn test_get_or_create_inserts_default() {
        let store = MemoryStore::new();
        let record = store.get_or_create("alice").await.unwrap();
        assert_eq!(record.name, "alice");
        assert!(record.messages.is_empty());
        assert_eq!(record.ltm, INITIAL_SUMMARY);

        // The created record is visible to plain lookups
        assert!(store.get("alice").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_get_or_create_is_idempotent() {
        let store = MemoryStore::new();
        let mut record = store.get_or_create("alice").await.unwrap();
        record.push_user("hi");
        record.ltm = "greeted me".to_string();
        store.save(&record).await.unwrap();

        let again = store.get_or_create("alice").await.unwrap();
        assert_eq!(again.turn_count(), 1);
        assert_eq!(again.ltm, "greeted me");
    }

    #[tokio::test]
    async fn test_save_then_get_round_trips() {
        let store = MemoryStore::new();
        let mut record = SessionRecord::new("bob");
        record.push_user("question");
        record.push_assistant("answer");
        record.ltm = "asked a question".to_string();
        store.save(&record).await.unwrap();

        let loaded = store.get_or_create("bob").await.unwrap();
        assert_eq!(loaded, record);
    }

    #[tokio::test]
    async fn test_get_missing_returns_none() {
        let store = MemoryStore::new();
        assert!(store.get("nobody").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_and_list() {
        let store = MemoryStore::new();
        store.get_or_create("alice").await.unwrap();
        store.get_or_create("bob").await.unwrap();

        let mut names = store.list().await.unwrap();
        names.sort();
        assert_eq!(names, vec!["alice", "bob"]);

        assert!(store.delete("alice").await.unwrap());
        assert!(!store.delete("alice").await.unwrap());
        assert_eq!(store.list().await.unwrap(), vec!["bob"]);
    }
}
