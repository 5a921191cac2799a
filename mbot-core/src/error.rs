//! Error types for the bot core.
//!
//! [`MbotError`] is the top-level error; [`HandlerError`] is used for command handler failures and
//! [`RegistryError`] for command registry management (load, reload, install).

use thiserror::Error;

/// Top-level error for the bot (storage, transport, handler, registry, config, IO).
#[derive(Error, Debug)]
pub enum MbotError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Handler error: {0}")]
    Handler(#[from] HandlerError),

    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Errors produced by command handlers.
#[derive(Error, Debug)]
pub enum HandlerError {
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    #[error("State error: {0}")]
    State(String),

    #[error("Command failed: {0}")]
    Failed(String),
}

/// Errors from loading, reloading or installing command definitions.
///
/// "Not found" is not an error: `reload` and `unload` report it as `false`.
#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("Failed to parse command '{name}': {reason}")]
    Parse { name: String, reason: String },

    #[error("Command '{name}' refers to unknown handler '{handler}'")]
    UnknownHandler { name: String, handler: String },

    #[error("Key '{key}' is already owned by command '{owner}'")]
    DuplicateKey { key: String, owner: String },

    #[error("Manifest declares name '{found}' but was installed as '{expected}'")]
    NameMismatch { expected: String, found: String },

    #[error("Install source not allowed: {0}")]
    SourceNotAllowed(String),

    #[error("Failed to fetch command source: {0}")]
    Fetch(String),

    #[error("Failed to persist command source: {0}")]
    Persist(String),

    #[error("Command source IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for core operations; uses [`MbotError`].
pub type Result<T> = std::result::Result<T, MbotError>;
