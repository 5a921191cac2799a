//! SQLite user store: table `users (psid TEXT PRIMARY KEY, data TEXT)` holding the record as JSON.

use crate::error::StorageError;
use crate::sqlite_pool::SqlitePoolManager;
use crate::user_store::{merged, UserStore};
use async_trait::async_trait;
use mbot_core::UserRecord;
use tokio::sync::Mutex;
use tracing::{debug, info};

pub struct SqliteUserStore {
    pool_manager: SqlitePoolManager,
    /// Serialises the read-merge-replace cycle of `save_user`.
    write_lock: Mutex<()>,
}

impl SqliteUserStore {
    pub async fn new(database_path: &str) -> Result<Self, StorageError> {
        let pool_manager = SqlitePoolManager::new(database_path).await?;
        let store = Self {
            pool_manager,
            write_lock: Mutex::new(()),
        };
        store.init().await?;
        Ok(store)
    }

    async fn init(&self) -> Result<(), StorageError> {
        info!("Creating users table if not exists");
        sqlx::query("CREATE TABLE IF NOT EXISTS users (psid TEXT PRIMARY KEY, data TEXT)")
            .execute(self.pool_manager.pool())
            .await?;
        Ok(())
    }

    async fn fetch(&self, psid: &str) -> Result<Option<UserRecord>, StorageError> {
        let row: Option<(String,)> = sqlx::query_as("SELECT data FROM users WHERE psid = ?")
            .bind(psid)
            .fetch_optional(self.pool_manager.pool())
            .await?;
        match row {
            Some((data,)) => Ok(Some(serde_json::from_str(&data)?)),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl UserStore for SqliteUserStore {
    async fn get_user(&self, psid: &str) -> Result<Option<UserRecord>, StorageError> {
        self.fetch(psid).await
    }

    async fn save_user(&self, psid: &str, update: UserRecord) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock().await;
        let record = merged(psid, self.fetch(psid).await?, update);
        let data = serde_json::to_string(&record)?;

        sqlx::query("INSERT OR REPLACE INTO users (psid, data) VALUES (?, ?)")
            .bind(psid)
            .bind(data)
            .execute(self.pool_manager.pool())
            .await?;

        debug!(psid = %psid, "Saved user record");
        Ok(())
    }

    async fn get_all_users(&self) -> Result<Vec<UserRecord>, StorageError> {
        let rows: Vec<(String,)> = sqlx::query_as("SELECT data FROM users")
            .fetch_all(self.pool_manager.pool())
            .await?;
        rows.into_iter()
            .map(|(data,)| serde_json::from_str(&data).map_err(StorageError::from))
            .collect()
    }
}
