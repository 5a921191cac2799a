//! Storage crate: user record persistence behind the [`UserStore`] trait.
//!
//! ## Modules
//!
//! - [`error`] – Storage error types
//! - [`user_store`] – UserStore trait and the shallow-merge rule
//! - [`memory_store`] – InMemoryUserStore
//! - [`json_store`] – JsonFileUserStore
//! - [`sqlite_store`] – SqliteUserStore
//! - [`sqlite_pool`] – SqlitePoolManager

mod error;
mod json_store;
mod memory_store;
mod sqlite_pool;
mod sqlite_store;
mod user_store;

use std::str::FromStr;
use std::sync::Arc;

pub use error::StorageError;
pub use json_store::JsonFileUserStore;
pub use memory_store::InMemoryUserStore;
pub use sqlite_pool::SqlitePoolManager;
pub use sqlite_store::SqliteUserStore;
pub use user_store::UserStore;

/// Backend selected by `USER_DB_TYPE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserStoreBackend {
    Json,
    Sqlite,
    Memory,
}

impl FromStr for UserStoreBackend {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(UserStoreBackend::Json),
            "sqlite" => Ok(UserStoreBackend::Sqlite),
            "memory" => Ok(UserStoreBackend::Memory),
            other => Err(StorageError::UnknownBackend(other.to_string())),
        }
    }
}

/// Opens the configured backend. `json_path` and `sqlite_path` are used by their backend only.
pub async fn open_user_store(
    backend: UserStoreBackend,
    json_path: &str,
    sqlite_path: &str,
) -> Result<Arc<dyn UserStore>, StorageError> {
    tracing::info!(backend = ?backend, "Opening user store");
    let store: Arc<dyn UserStore> = match backend {
        UserStoreBackend::Json => Arc::new(JsonFileUserStore::new(json_path).await?),
        UserStoreBackend::Sqlite => Arc::new(SqliteUserStore::new(sqlite_path).await?),
        UserStoreBackend::Memory => Arc::new(InMemoryUserStore::new()),
    };
    Ok(store)
}
