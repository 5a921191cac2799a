//! Command handler trait and the immutable command definition.
//!
//! A handler implements [`Command::call`] and may opt into continuations (`on_reply`) and
//! postbacks (`on_postback`) by returning `true` from the matching capability flag.

use crate::context::InvocationContext;
use async_trait::async_trait;
use mbot_core::{HandlerError, Result};
use std::fmt;
use std::sync::Arc;

#[async_trait]
pub trait Command: Send + Sync {
    /// Runs the command for a prefixed invocation.
    async fn call(&self, ctx: &InvocationContext) -> Result<()>;

    /// Whether replies sent by this command register a continuation.
    fn supports_reply(&self) -> bool {
        false
    }

    /// Runs when the user replies to the last message this command sent.
    async fn on_reply(&self, _ctx: &InvocationContext) -> Result<()> {
        Err(HandlerError::Failed("continuation not supported".to_string()).into())
    }

    /// Whether postbacks with payload `<name>:<rest>` are routed to this command.
    fn supports_postback(&self) -> bool {
        false
    }

    async fn on_postback(&self, _ctx: &InvocationContext, _payload: &str) -> Result<()> {
        Err(HandlerError::Failed("postback not supported".to_string()).into())
    }
}

/// Loaded command: manifest metadata plus the handler it resolves to.
#[derive(Clone)]
pub struct CommandDefinition {
    pub name: String,
    pub aliases: Vec<String>,
    pub admin_only: bool,
    pub description: String,
    pub usage: String,
    pub category: String,
    pub examples: Vec<String>,
    /// Handler kind the manifest named.
    pub handler_kind: String,
    handler: Arc<dyn Command>,
}

impl CommandDefinition {
    pub fn new(name: impl Into<String>, handler_kind: impl Into<String>, handler: Arc<dyn Command>) -> Self {
        Self {
            name: name.into(),
            aliases: Vec::new(),
            admin_only: false,
            description: String::new(),
            usage: String::new(),
            category: String::new(),
            examples: Vec::new(),
            handler_kind: handler_kind.into(),
            handler,
        }
    }

    pub fn with_aliases<I, S>(mut self, aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.aliases = aliases.into_iter().map(Into::into).collect();
        self
    }

    pub fn admin_only(mut self, admin_only: bool) -> Self {
        self.admin_only = admin_only;
        self
    }

    pub fn handler(&self) -> &Arc<dyn Command> {
        &self.handler
    }

    pub fn supports_reply(&self) -> bool {
        self.handler.supports_reply()
    }

    pub fn supports_postback(&self) -> bool {
        self.handler.supports_postback()
    }

    /// Registry keys owned by this definition: lower-cased name then aliases.
    pub fn keys(&self) -> Vec<String> {
        std::iter::once(&self.name)
            .chain(self.aliases.iter())
            .map(|k| k.trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect()
    }
}

impl fmt::Debug for CommandDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandDefinition")
            .field("name", &self.name)
            .field("aliases", &self.aliases)
            .field("admin_only", &self.admin_only)
            .field("handler_kind", &self.handler_kind)
            .finish()
    }
}
