//! Storage error types.
//!
//! Used by the user store backends and converted into [`mbot_core::MbotError::Storage`] at the
//! crate boundary.

use mbot_core::MbotError;
use thiserror::Error;

/// Errors that can occur when using storage operations.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Unknown user store backend: {0}")]
    UnknownBackend(String),
}

impl From<sqlx::Error> for StorageError {
    fn from(e: sqlx::Error) -> Self {
        StorageError::Database(e.to_string())
    }
}

impl From<StorageError> for MbotError {
    fn from(e: StorageError) -> Self {
        MbotError::Storage(e.to_string())
    }
}
