//! JSON file user store: one object `{ psid: record }` rewritten on every save.

use crate::error::StorageError;
use crate::user_store::{merged, UserStore};
use async_trait::async_trait;
use mbot_core::UserRecord;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{debug, info};

type UserMap = BTreeMap<String, UserRecord>;

pub struct JsonFileUserStore {
    path: PathBuf,
    /// Serialises read-modify-write cycles on the file.
    lock: Mutex<()>,
}

impl JsonFileUserStore {
    /// Opens the store, creating the file (and its directory) with `{}` when missing.
    pub async fn new(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref().to_path_buf();
        info!(path = %path.display(), "Opening JSON user store");
        let store = Self {
            path,
            lock: Mutex::new(()),
        };
        store.ensure_file().await?;
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn ensure_file(&self) -> Result<(), StorageError> {
        if tokio::fs::try_exists(&self.path).await? {
            return Ok(());
        }
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        tokio::fs::write(&self.path, b"{}").await?;
        Ok(())
    }

    async fn read_all(&self) -> Result<UserMap, StorageError> {
        self.ensure_file().await?;
        let bytes = tokio::fs::read(&self.path).await?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(UserMap::new());
        }
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn write_all(&self, users: &UserMap) -> Result<(), StorageError> {
        // Write to a sibling temp file, then rename over the store.
        let tmp = self.path.with_extension("json.tmp");
        let body = serde_json::to_vec_pretty(users)?;
        tokio::fs::write(&tmp, body).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl UserStore for JsonFileUserStore {
    async fn get_user(&self, psid: &str) -> Result<Option<UserRecord>, StorageError> {
        let _guard = self.lock.lock().await;
        Ok(self.read_all().await?.remove(psid))
    }

    async fn save_user(&self, psid: &str, update: UserRecord) -> Result<(), StorageError> {
        let _guard = self.lock.lock().await;
        let mut users = self.read_all().await?;
        let record = merged(psid, users.remove(psid), update);
        users.insert(psid.to_string(), record);
        self.write_all(&users).await?;
        debug!(psid = %psid, "Saved user record");
        Ok(())
    }

    async fn get_all_users(&self) -> Result<Vec<UserRecord>, StorageError> {
        let _guard = self.lock.lock().await;
        Ok(self.read_all().await?.into_values().collect())
    }
}
