//! Command sources: where the registry reads definitions from and where installs write to.

use super::manifest::{CommandManifest, HandlerTable};
use crate::command::CommandDefinition;
use async_trait::async_trait;
use mbot_core::RegistryError;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

#[async_trait]
pub trait CommandSource: Send + Sync {
    /// Every source entry name, sorted.
    async fn names(&self) -> Result<Vec<String>, RegistryError>;

    /// Raw content of the entry `name`; `None` when no such entry exists.
    async fn read(&self, name: &str) -> Result<Option<String>, RegistryError>;

    /// Parses and resolves `content` as the entry `name`.
    fn parse(&self, name: &str, content: &str) -> Result<CommandDefinition, RegistryError>;

    /// Persists `content` as the entry `name`, replacing any existing one.
    async fn store(&self, name: &str, content: &str) -> Result<(), RegistryError>;
}

/// Entry names become file names; only `[A-Za-z0-9_-]` is accepted.
pub fn validate_entry_name(name: &str) -> Result<(), RegistryError> {
    let valid = !name.is_empty()
        && name.len() <= 64
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if valid {
        Ok(())
    } else {
        Err(RegistryError::Parse {
            name: name.to_string(),
            reason: "command names may only contain letters, digits, '_' and '-'".to_string(),
        })
    }
}

/// Directory of `<name>.json` manifests resolved against a [`HandlerTable`].
pub struct ManifestDirectory {
    dir: PathBuf,
    table: HandlerTable,
}

impl ManifestDirectory {
    pub fn new(dir: impl Into<PathBuf>, table: HandlerTable) -> Self {
        Self {
            dir: dir.into(),
            table,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}.json", name))
    }

    /// Writes each manifest that has no file yet. Returns the names written.
    pub async fn seed(&self, manifests: &[CommandManifest]) -> Result<Vec<String>, RegistryError> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let mut written = Vec::new();
        for manifest in manifests {
            validate_entry_name(&manifest.name)?;
            if tokio::fs::try_exists(self.path_for(&manifest.name)).await? {
                continue;
            }
            self.store(&manifest.name, &manifest.to_json()?).await?;
            written.push(manifest.name.clone());
        }
        if !written.is_empty() {
            info!(dir = %self.dir.display(), seeded = ?written, "Seeded command manifests");
        }
        Ok(written)
    }
}

#[async_trait]
impl CommandSource for ManifestDirectory {
    async fn names(&self) -> Result<Vec<String>, RegistryError> {
        if !tokio::fs::try_exists(&self.dir).await? {
            return Ok(Vec::new());
        }
        let mut names = Vec::new();
        let mut entries = tokio::fs::read_dir(&self.dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                names.push(stem.to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    async fn read(&self, name: &str) -> Result<Option<String>, RegistryError> {
        validate_entry_name(name)?;
        let path = self.path_for(name);
        if !tokio::fs::try_exists(&path).await? {
            return Ok(None);
        }
        Ok(Some(tokio::fs::read_to_string(&path).await?))
    }

    fn parse(&self, name: &str, content: &str) -> Result<CommandDefinition, RegistryError> {
        CommandManifest::parse(name, content)?.into_definition(&self.table)
    }

    async fn store(&self, name: &str, content: &str) -> Result<(), RegistryError> {
        validate_entry_name(name)?;
        let persist = |e: std::io::Error| RegistryError::Persist(e.to_string());
        tokio::fs::create_dir_all(&self.dir).await.map_err(persist)?;

        let path = self.path_for(name);
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, content).await.map_err(persist)?;
        tokio::fs::rename(&tmp, &path).await.map_err(persist)?;
        debug!(path = %path.display(), "Stored command manifest");
        Ok(())
    }
}
