//! In-memory user store. Process-local; used by tests and `USER_DB_TYPE=memory`.

use crate::error::StorageError;
use crate::user_store::{merged, UserStore};
use async_trait::async_trait;
use mbot_core::UserRecord;
use std::collections::HashMap;
use tokio::sync::RwLock;

#[derive(Default)]
pub struct InMemoryUserStore {
    users: RwLock<HashMap<String, UserRecord>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn get_user(&self, psid: &str) -> Result<Option<UserRecord>, StorageError> {
        Ok(self.users.read().await.get(psid).cloned())
    }

    async fn save_user(&self, psid: &str, update: UserRecord) -> Result<(), StorageError> {
        let mut users = self.users.write().await;
        let record = merged(psid, users.remove(psid), update);
        users.insert(psid.to_string(), record);
        Ok(())
    }

    async fn get_all_users(&self) -> Result<Vec<UserRecord>, StorageError> {
        Ok(self.users.read().await.values().cloned().collect())
    }
}
