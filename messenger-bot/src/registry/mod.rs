//! # Command registry
//!
//! Maps lower-cased command names and aliases to loaded [`CommandDefinition`]s. Readers take a
//! snapshot of the key map; mutators build a replacement map and swap it in, so a lookup never
//! observes a half-applied load, reload or unload. Mutators are serialised by an async mutex.
//!
//! Definitions come from a [`CommandSource`] (normally a [`ManifestDirectory`]).

mod manifest;
mod source;

pub use manifest::{CommandManifest, HandlerTable};
pub use source::{validate_entry_name, CommandSource, ManifestDirectory};

use crate::command::CommandDefinition;
use mbot_core::RegistryError;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{info, instrument, warn};

type KeyMap = HashMap<String, Arc<CommandDefinition>>;

const INSTALL_FETCH_TIMEOUT: Duration = Duration::from_secs(30);

pub struct CommandRegistry {
    source: Arc<dyn CommandSource>,
    keys: RwLock<Arc<KeyMap>>,
    mutation: Mutex<()>,
    install_allowlist: Vec<String>,
    http: reqwest::Client,
}

impl CommandRegistry {
    /// Empty registry over `source`. Call [`load`](Self::load) to populate it.
    pub fn new(source: Arc<dyn CommandSource>, install_allowlist: Vec<String>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(INSTALL_FETCH_TIMEOUT)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            source,
            keys: RwLock::new(Arc::new(KeyMap::new())),
            mutation: Mutex::new(()),
            install_allowlist,
            http,
        }
    }

    fn snapshot(&self) -> Arc<KeyMap> {
        Arc::clone(&*self.keys.read())
    }

    fn swap(&self, next: KeyMap) {
        *self.keys.write() = Arc::new(next);
    }

    /// Definition registered under `key` (name or alias, any case).
    pub fn lookup(&self, key: &str) -> Option<Arc<CommandDefinition>> {
        self.snapshot().get(&key.trim().to_lowercase()).cloned()
    }

    /// Unique definitions sorted by name.
    pub fn definitions(&self) -> Vec<Arc<CommandDefinition>> {
        let snapshot = self.snapshot();
        let mut by_name: HashMap<&str, &Arc<CommandDefinition>> = HashMap::new();
        for definition in snapshot.values() {
            by_name.entry(definition.name.as_str()).or_insert(definition);
        }
        let mut definitions: Vec<Arc<CommandDefinition>> =
            by_name.into_values().map(Arc::clone).collect();
        definitions.sort_by(|a, b| a.name.cmp(&b.name));
        definitions
    }

    /// Number of registered keys (names plus aliases).
    pub fn key_count(&self) -> usize {
        self.snapshot().len()
    }

    /// Replaces the registry with every definition in the source.
    #[instrument(skip(self))]
    pub async fn load(&self) -> Result<usize, RegistryError> {
        self.load_with_progress(|_| {}).await
    }

    /// Like [`load`](Self::load), calling `progress` once per loaded definition.
    ///
    /// Fails on the first parse error or key collision; the registry is then left unchanged.
    pub async fn load_with_progress<F>(&self, mut progress: F) -> Result<usize, RegistryError>
    where
        F: FnMut(&CommandDefinition) + Send,
    {
        let _guard = self.mutation.lock().await;
        let mut next = KeyMap::new();
        let mut loaded = 0;

        for name in self.source.names().await? {
            let Some(content) = self.source.read(&name).await? else {
                warn!(command = %name, "Command source vanished during load");
                continue;
            };
            let definition = Arc::new(self.source.parse(&name, &content)?);
            insert_keys(&mut next, &definition)?;
            progress(&definition);
            loaded += 1;
        }

        self.swap(next);
        info!(commands = loaded, "step: commands loaded");
        Ok(loaded)
    }

    /// Re-reads the source entry `name`. `Ok(false)` when the source has no such entry.
    #[instrument(skip(self))]
    pub async fn reload(&self, name: &str) -> Result<bool, RegistryError> {
        let _guard = self.mutation.lock().await;
        let Some(content) = self.source.read(name).await? else {
            info!(command = %name, "step: reload skipped, no source");
            return Ok(false);
        };
        let definition = Arc::new(self.source.parse(name, &content)?);
        let next = replaced(&self.snapshot(), name, &definition)?;
        self.swap(next);
        info!(command = %name, "step: command reloaded");
        Ok(true)
    }

    /// Removes every key owned by the definition registered under `name`.
    #[instrument(skip(self))]
    pub async fn unload(&self, name: &str) -> bool {
        let _guard = self.mutation.lock().await;
        let current = self.snapshot();
        let Some(definition) = current.get(&name.trim().to_lowercase()).cloned() else {
            return false;
        };
        let next: KeyMap = current
            .iter()
            .filter(|(_, d)| !Arc::ptr_eq(d, &definition))
            .map(|(k, d)| (k.clone(), Arc::clone(d)))
            .collect();
        self.swap(next);
        info!(command = %definition.name, "step: command unloaded");
        true
    }

    /// Whether `url` starts with an allow-listed prefix. Always false for an empty allow-list.
    pub fn is_install_allowed(&self, url: &str) -> bool {
        self.install_allowlist
            .iter()
            .any(|prefix| !prefix.is_empty() && url.starts_with(prefix.as_str()))
    }

    /// Fetches a manifest from `url`, validates it, persists it as `name` and activates it.
    ///
    /// The entry is stored under the lower-cased `name`. On any failure the registry and the
    /// source are left unchanged.
    #[instrument(skip(self))]
    pub async fn install(&self, name: &str, url: &str) -> Result<(), RegistryError> {
        validate_entry_name(name)?;
        let name = name.to_ascii_lowercase();
        let name = name.as_str();
        if self.install_allowlist.is_empty() {
            return Err(RegistryError::SourceNotAllowed(
                "installs are disabled (INSTALL_ALLOWLIST is empty)".to_string(),
            ));
        }
        if !self.is_install_allowed(url) {
            return Err(RegistryError::SourceNotAllowed(url.to_string()));
        }

        info!(command = %name, url = %url, "step: fetching command manifest");
        let content = self
            .http
            .get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| RegistryError::Fetch(e.to_string()))?
            .text()
            .await
            .map_err(|e| RegistryError::Fetch(e.to_string()))?;

        let definition = Arc::new(self.source.parse(name, &content)?);
        if !definition.name.eq_ignore_ascii_case(name) {
            return Err(RegistryError::NameMismatch {
                expected: name.to_string(),
                found: definition.name.clone(),
            });
        }

        let _guard = self.mutation.lock().await;
        let next = replaced(&self.snapshot(), name, &definition)?;
        self.source.store(name, &content).await?;
        self.swap(next);
        info!(command = %name, "step: command installed");
        Ok(())
    }
}

/// Inserts every key of `definition`, rejecting keys owned by another command.
fn insert_keys(map: &mut KeyMap, definition: &Arc<CommandDefinition>) -> Result<(), RegistryError> {
    for key in definition.keys() {
        if let Some(owner) = map.get(&key) {
            if !Arc::ptr_eq(owner, definition) {
                return Err(RegistryError::DuplicateKey {
                    key,
                    owner: owner.name.clone(),
                });
            }
        }
        map.insert(key, Arc::clone(definition));
    }
    Ok(())
}

/// `current` without the keys of `name` (and of the new definition's name), plus `definition`.
fn replaced(
    current: &KeyMap,
    name: &str,
    definition: &Arc<CommandDefinition>,
) -> Result<KeyMap, RegistryError> {
    let mut next: KeyMap = current
        .iter()
        .filter(|(_, d)| {
            !d.name.eq_ignore_ascii_case(name) && !d.name.eq_ignore_ascii_case(&definition.name)
        })
        .map(|(k, d)| (k.clone(), Arc::clone(d)))
        .collect();
    insert_keys(&mut next, definition)?;
    Ok(next)
}
