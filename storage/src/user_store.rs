//! User store abstraction: read-by-id, upsert with shallow merge, list-all.

use crate::error::StorageError;
use async_trait::async_trait;
use mbot_core::UserRecord;

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn get_user(&self, psid: &str) -> Result<Option<UserRecord>, StorageError>;

    /// Upserts `update` for `psid`, merged onto any stored record with [`UserRecord::merge`].
    async fn save_user(&self, psid: &str, update: UserRecord) -> Result<(), StorageError>;

    async fn get_all_users(&self) -> Result<Vec<UserRecord>, StorageError>;
}

/// Applies `update` onto `existing` (or starts a fresh record) and pins the psid.
pub(crate) fn merged(psid: &str, existing: Option<UserRecord>, update: UserRecord) -> UserRecord {
    let mut record = existing.unwrap_or_else(|| UserRecord::new(psid));
    record.merge(update);
    record.psid = psid.to_string();
    record
}
