//! `cmd install|reload|unload`: registry management for admins.

use crate::command::Command;
use crate::context::InvocationContext;
use async_trait::async_trait;
use mbot_core::Result;
use tracing::warn;

pub struct CmdCommand;

#[async_trait]
impl Command for CmdCommand {
    async fn call(&self, ctx: &InvocationContext) -> Result<()> {
        let args: Vec<&str> = ctx.args.iter().map(String::as_str).collect();
        let registry = ctx.registry();

        let text = match args.as_slice() {
            ["install", name, url, ..] => match registry.install(name, url).await {
                Ok(()) => format!("✅ Command '{}' installed from {}", name, url),
                Err(e) => {
                    warn!(error = %e, command = %name, "Install failed");
                    format!("❌ Failed to install command: {}", e)
                }
            },
            ["reload", name, ..] => match registry.reload(name).await {
                Ok(true) => format!("♻️ Command '{}' reloaded.", name),
                Ok(false) => format!("❌ Command '{}' not found.", name),
                Err(e) => {
                    warn!(error = %e, command = %name, "Reload failed");
                    format!("❌ Failed to reload command: {}", e)
                }
            },
            ["unload", name, ..] => {
                if registry.unload(name).await {
                    format!("🗑️ Command '{}' unloaded from memory.", name)
                } else {
                    format!("❌ Command '{}' not found.", name)
                }
            }
            _ => ctx.with_prefix(
                "Usage: {prefix}cmd install <name> <url> | reload <name> | unload <name>",
            ),
        };
        ctx.reply(&text).await;
        Ok(())
    }
}
