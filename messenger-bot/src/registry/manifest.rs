//! Command manifest: the data half of a command, one JSON file per command.

use crate::command::{Command, CommandDefinition};
use mbot_core::RegistryError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandManifest {
    pub name: String,
    #[serde(default)]
    pub aliases: Vec<String>,
    #[serde(default)]
    pub admin_only: bool,
    /// Handler kind in the [`HandlerTable`].
    pub handler: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub usage: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub examples: Vec<String>,
}

impl CommandManifest {
    pub fn parse(name: &str, content: &str) -> Result<Self, RegistryError> {
        let manifest: CommandManifest =
            serde_json::from_str(content).map_err(|e| RegistryError::Parse {
                name: name.to_string(),
                reason: e.to_string(),
            })?;
        if manifest.name.trim().is_empty() {
            return Err(RegistryError::Parse {
                name: name.to_string(),
                reason: "manifest has an empty name".to_string(),
            });
        }
        Ok(manifest)
    }

    pub fn to_json(&self) -> Result<String, RegistryError> {
        serde_json::to_string_pretty(self).map_err(|e| RegistryError::Parse {
            name: self.name.clone(),
            reason: e.to_string(),
        })
    }

    /// Resolves the handler kind and builds the definition.
    pub fn into_definition(self, table: &HandlerTable) -> Result<CommandDefinition, RegistryError> {
        let handler = table
            .get(&self.handler)
            .ok_or_else(|| RegistryError::UnknownHandler {
                name: self.name.clone(),
                handler: self.handler.clone(),
            })?;
        let mut definition = CommandDefinition::new(self.name, self.handler, handler)
            .with_aliases(self.aliases)
            .admin_only(self.admin_only);
        definition.description = self.description;
        definition.usage = self.usage;
        definition.category = self.category;
        definition.examples = self.examples;
        Ok(definition)
    }
}

/// Compiled-in handler implementations keyed by kind.
#[derive(Clone, Default)]
pub struct HandlerTable {
    handlers: HashMap<String, Arc<dyn Command>>,
}

impl HandlerTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, kind: &str, handler: Arc<dyn Command>) -> Self {
        self.register(kind, handler);
        self
    }

    pub fn register(&mut self, kind: &str, handler: Arc<dyn Command>) {
        self.handlers.insert(kind.to_lowercase(), handler);
    }

    pub fn get(&self, kind: &str) -> Option<Arc<dyn Command>> {
        self.handlers.get(&kind.to_lowercase()).cloned()
    }

    pub fn kinds(&self) -> Vec<String> {
        let mut kinds: Vec<String> = self.handlers.keys().cloned().collect();
        kinds.sort();
        kinds
    }
}
