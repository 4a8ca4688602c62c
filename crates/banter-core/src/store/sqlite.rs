//! SQLite-backed session store
//!
//! Records are stored as JSON documents keyed by identifier, so the
//! schema never changes when the record shape grows a field. WAL mode
//! keeps concurrent readers cheap.

use super::{MemoryStore, SessionStore};
use crate::error::{Error, Result};
use crate::session::SessionRecord;
use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{Row, SqlitePool};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, info};

const DB_FILE_NAME: &str = "sessions.db";

fn default_backend() -> String {
    "sqlite".to_string()
}

fn default_data_dir() -> String {
    "_data".to_string()
}

/// Session store settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Backend name: "sqlite" or "memory"
    #[serde(default = "default_backend")]
    pub backend: String,

    /// Directory the database file lives in
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            data_dir: default_data_dir(),
        }
    }
}

impl StoreConfig {
    /// Path of the database file inside the data directory
    #[must_use]
    pub fn db_path(&self) -> PathBuf {
        Path::new(&self.data_dir).join(DB_FILE_NAME)
    }
}

/// Session store selected by configuration
pub enum StoreBackend {
    /// Durable SQLite store
    Sqlite(SqliteStore),
    /// Process-local store
    Memory(MemoryStore),
}

impl StoreBackend {
    /// Build the backend named in `config`
    pub async fn from_config(config: &StoreConfig) -> Result<Self> {
        match config.backend.as_str() {
            "sqlite" => Ok(Self::Sqlite(SqliteStore::new(config.db_path()).await?)),
            "memory" => Ok(Self::Memory(MemoryStore::new())),
            other => Err(Error::InvalidConfig {
                field: "store.backend".to_string(),
                message: format!("unknown backend '{other}', expected 'sqlite' or 'memory'"),
            }),
        }
    }
}

#[async_trait]
impl SessionStore for StoreBackend {
    async fn get(&self, name: &str) -> Result<Option<SessionRecord>> {
        match self {
            Self::Sqlite(store) => store.get(name).await,
            Self::Memory(store) => store.get(name).await,
        }
    }

    async fn get_or_create(&self, name: &str) -> Result<SessionRecord> {
        match self {
            Self::Sqlite(store) => store.get_or_create(name).await,
            Self::Memory(store) => store.get_or_create(name).await,
        }
    }

    async fn save(&self, record: &SessionRecord) -> Result<()> {
        match self {
            Self::Sqlite(store) => store.save(record).await,
            Self::Memory(store) => store.save(record).await,
        }
    }

    async fn delete(&self, name: &str) -> Result<bool> {
        match self {
            Self::Sqlite(store) => store.delete(name).await,
            Self::Memory(store) => store.delete(name).await,
        }
    }

    async fn list(&self) -> Result<Vec<String>> {
        match self {
            Self::Sqlite(store) => store.list().await,
            Self::Memory(store) => store.list().await,
        }
    }
}

/// SQLite session store
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (or create) the database at `db_path` and prepare the schema
    pub async fn new(db_path: impl AsRef<Path>) -> Result<Self> {
        let db_path = db_path.as_ref();

        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| Error::Storage(format!("Failed to create data directory: {e}")))?;
        }

        let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", db_path.display()))
            .map_err(|e| Error::Storage(format!("Invalid database path: {e}")))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .map_err(|e| Error::Storage(format!("Failed to open session database: {e}")))?;

        let store = Self { pool };
        store.init_schema().await?;

        info!(path = %db_path.display(), "SQLite session store initialized");
        Ok(store)
    }

    async fn init_schema(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS sessions (
                name TEXT PRIMARY KEY,
                record TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| Error::Storage(format!("Failed to create sessions table: {e}")))?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_sessions_updated ON sessions(updated_at)")
            .execute(&self.pool)
            .await
            .map_err(|e| Error::Storage(format!("Failed to create sessions index: {e}")))?;

        Ok(())
    }
}

#[async_trait]
impl SessionStore for SqliteStore {
    async fn get(&self, name: &str) -> Result<Option<SessionRecord>> {
        let row = sqlx::query("SELECT record FROM sessions WHERE name = ?")
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| Error::Storage(format!("Failed to query session: {e}")))?;

        match row {
            Some(row) => {
                let data: String = row.get("record");
                let record = serde_json::from_str(&data)
                    .map_err(|e| Error::Storage(format!("Failed to decode session record: {e}")))?;
                Ok(Some(record))
            }
            None => Ok(None),
        }
    }

    async fn get_or_create(&self, name: &str) -> Result<SessionRecord> {
        if let Some(record) = self.get(name).await? {
            return Ok(record);
        }

        let record = SessionRecord::new(name);
        self.save(&record).await?;
        debug!(identifier = %name, "Created session record on first contact");
        Ok(record)
    }

    async fn save(&self, record: &SessionRecord) -> Result<()> {
        let data = serde_json::to_string(record)
            .map_err(|e| Error::Storage(format!("Failed to encode session record: {e}")))?;
        let now = Utc::now().to_rfc3339();

        sqlx::query(
            r#"
            INSERT INTO sessions (name, record, created_at, updated_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(name) DO UPDATE SET
                record = excluded.record,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&record.name)
        .bind(&data)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await
        .map_err(|e| Error::Storage(format!("Failed to save session: {e}")))?;

        Ok(())
    }

    async fn delete(&self, name: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM sessions WHERE name = ?")
            .bind(name)
            .execute(&self.pool)
            .await
            .map_err(|e| Error::Storage(format!("Failed to delete session: {e}")))?;

        Ok(result.rows_affected() > 0)
    }

    async fn list(&self) -> Result<Vec<String>> {
        let rows = sqlx::query("SELECT name FROM sessions ORDER BY updated_at DESC")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| Error::Storage(format!("Failed to list sessions: {e}")))?;

        Ok(rows.iter().map(|row| row.get("name")).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::INITIAL_SUMMARY;
    use tempfile::TempDir;

    async fn create_test_store() -> (SqliteStore, TempDir) {
        let dir = TempDir::new().unwrap();
        let store = SqliteStore::new(dir.path().join("sessions.db"))
            .await
            .unwrap();
        (store, dir)
    }

    #[tokio::test]
    async fn test_get_or_create_inserts_default() {
        let (store, _dir) = create_test_store().await;

        let record = store.get_or_create("alice").await.unwrap();
        assert!(record.messages.is_empty());
        assert_eq!(record.ltm, INITIAL_SUMMARY);

        let again = store.get_or_create("alice").await.unwrap();
        assert_eq!(again, record);
    }

    #[tokio::test]
    async fn test_save_then_get_round_trips() {
        let (store, _dir) = create_test_store().await;

        let mut record = SessionRecord::new("bob");
        record.push_user("question");
        record.push_assistant("answer");
        record.ltm = "asked a question".to_string();
        store.save(&record).await.unwrap();

        let loaded = store.get_or_create("bob").await.unwrap();
        assert_eq!(loaded, record);
    }

    #[tokio::test]
    async fn test_save_overwrites_existing() {
        let (store, _dir) = create_test_store().await;

        let mut record = store.get_or_create("alice").await.unwrap();
        record.push_user("one");
        store.save(&record).await.unwrap();
        record.push_assistant("two");
        record.ltm = "counted".to_string();
        store.save(&record).await.unwrap();

        let loaded = store.get("alice").await.unwrap().unwrap();
        assert_eq!(loaded.turn_count(), 2);
        assert_eq!(loaded.ltm, "counted");
    }

    #[tokio::test]
    async fn test_records_survive_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("sessions.db");

        {
            let store = SqliteStore::new(&path).await.unwrap();
            let mut record = SessionRecord::new("alice");
            record.push_user("remember me");
            store.save(&record).await.unwrap();
        }

        let store = SqliteStore::new(&path).await.unwrap();
        let loaded = store.get("alice").await.unwrap().unwrap();
        assert_eq!(loaded.messages[0].content, "remember me");
    }

    #[tokio::test]
    async fn test_delete_and_list() {
        let (store, _dir) = create_test_store().await;

        store.get_or_create("alice").await.unwrap();
        store.get_or_create("bob").await.unwrap();

        let mut names = store.list().await.unwrap();
        names.sort();
        assert_eq!(names, vec!["alice", "bob"]);

        assert!(store.delete("alice").await.unwrap());
        assert!(!store.delete("alice").await.unwrap());
        assert_eq!(store.list().await.unwrap(), vec!["bob"]);
    }

    #[tokio::test]
    async fn test_backend_from_config_rejects_unknown() {
        let config = StoreConfig {
            backend: "postgres".to_string(),
            data_dir: "_data".to_string(),
        };
        let result = StoreBackend::from_config(&config).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_backend_from_config_memory() {
        let config = StoreConfig {
            backend: "memory".to_string(),
            data_dir: "_data".to_string(),
        };
        let backend = StoreBackend::from_config(&config).await.unwrap();
        let record = backend.get_or_create("alice").await.unwrap();
        assert_eq!(record.name, "alice");
    }
}
