//! Persistent key-value storage for the root state snapshot

use async_trait::async_trait;
use sqlx::sqlite::SqlitePool;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

use crate::error::{Result, StorageError};
use crate::state::AppState;

/// Key the serialized root state tree is stored under
pub const ROOT_STATE_KEY: &str = "root";

/// Plain (non-secret) string storage
#[async_trait]
pub trait StateStorage: Send + Sync {
    async fn load(&self, key: &str) -> Result<Option<String>>;

    async fn save(&self, key: &str, value: &str) -> Result<()>;

    async fn remove(&self, key: &str) -> Result<()>;
}

/// SQLite-backed storage, one row per key
#[derive(Clone)]
pub struct SqliteStateStorage {
    pool: SqlitePool,
}

impl SqliteStateStorage {
    /// Open (creating if needed) the database at `db_path` and run migrations
    pub async fn new(db_path: &str) -> Result<Self> {
        let expanded_path = shellexpand::tilde(db_path).to_string();
        let path = Path::new(&expanded_path);

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(StorageError::IoError)?;
        }

        // mode=rwc creates the file on first use
        let db_url = format!("sqlite://{}?mode=rwc", expanded_path.replace('\\', "/"));

        let pool = SqlitePool::connect(&db_url)
            .await
            .map_err(StorageError::SqlxError)?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(StorageError::MigrationError)?;

        tracing::debug!("Opened state database at {}", expanded_path);

        Ok(Self { pool })
    }
}

#[async_trait]
impl StateStorage for SqliteStateStorage {
    async fn load(&self, key: &str) -> Result<Option<String>> {
        let value: Option<String> = sqlx::query_scalar("SELECT value FROM kv_store WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::SqlxError)?;

        Ok(value)
    }

    async fn save(&self, key: &str, value: &str) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO kv_store (key, value, updated_at)
            VALUES (?, ?, ?)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(chrono::Utc::now().timestamp())
        .execute(&self.pool)
        .await
        .map_err(StorageError::SqlxError)?;

        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        sqlx::query("DELETE FROM kv_store WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await
            .map_err(StorageError::SqlxError)?;

        Ok(())
    }
}

/// Process-local storage for tests and ephemeral sessions
#[derive(Default)]
pub struct MemoryStateStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStateStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl StateStorage for MemoryStateStorage {
    async fn load(&self, key: &str) -> Result<Option<String>> {
        let value = self.entries().get(key).cloned();
        Ok(value)
    }

    async fn save(&self, key: &str, value: &str) -> Result<()> {
        self.entries().insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.entries().remove(key);
        Ok(())
    }
}

/// Serialize `state` under [`ROOT_STATE_KEY`]
pub async fn save_snapshot(storage: &dyn StateStorage, state: &AppState) -> Result<()> {
    let json = serde_json::to_string(state).map_err(StorageError::Serialization)?;
    storage.save(ROOT_STATE_KEY, &json).await
}

/// Load the root snapshot, falling back to an empty tree when it is missing,
/// unreadable or undecodable
pub async fn load_snapshot(storage: &dyn StateStorage) -> AppState {
    let raw = match storage.load(ROOT_STATE_KEY).await {
        Ok(Some(raw)) => raw,
        Ok(None) => return AppState::default(),
        Err(e) => {
            tracing::warn!("Failed to read state snapshot, starting empty: {}", e);
            return AppState::default();
        }
    };

    match serde_json::from_str::<AppState>(&raw) {
        Ok(state) => state.rehydrated(),
        Err(e) => {
            tracing::warn!("Discarding undecodable state snapshot: {}", e);
            AppState::default()
        }
    }
}
