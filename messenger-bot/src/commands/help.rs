//! `help [command]`: lists unique commands or describes one. Also answers the `help` postback.

use crate::command::{Command, CommandDefinition};
use crate::context::InvocationContext;
use async_trait::async_trait;
use mbot_core::Result;

pub struct HelpCommand;

impl HelpCommand {
    /// Usage with placeholders substituted and the prefix prepended when missing.
    fn usage(ctx: &InvocationContext, definition: &CommandDefinition) -> String {
        let usage = ctx.with_prefix(&definition.usage);
        if !usage.is_empty() && !usage.starts_with(&ctx.prefix) {
            format!("{}{}", ctx.prefix, usage)
        } else {
            usage
        }
    }

    fn overview(ctx: &InvocationContext) -> String {
        let is_admin = ctx.is_admin();
        let lines: Vec<String> = ctx
            .registry()
            .definitions()
            .iter()
            .filter(|d| !d.admin_only || is_admin)
            .map(|d| {
                let mut line = format!("• {}", d.name);
                if d.admin_only {
                    line.push_str(" (admin)");
                }
                if !d.aliases.is_empty() {
                    line.push_str(&format!(" ({})", d.aliases.join(", ")));
                }
                line.push_str(&format!(" - {}", ctx.with_prefix(&d.description)));
                let usage = Self::usage(ctx, d);
                if !usage.is_empty() {
                    line.push_str(&format!("\n   Usage: {}", usage));
                }
                line
            })
            .collect();
        format!("Available commands:\n{}", lines.join("\n"))
    }

    fn detail(ctx: &InvocationContext, key: &str) -> String {
        let name = key.to_lowercase();
        let definition = match ctx.registry().lookup(&name) {
            Some(d) if !d.admin_only || ctx.is_admin() => d,
            _ => return format!("No such command: {}", name),
        };

        let aliases = if definition.aliases.is_empty() {
            "None".to_string()
        } else {
            definition.aliases.join(", ")
        };
        let examples = if definition.examples.is_empty() {
            "None".to_string()
        } else {
            definition
                .examples
                .iter()
                .map(|e| ctx.with_prefix(e))
                .collect::<Vec<_>>()
                .join("\n")
        };
        format!(
            "Command: {}\nAliases: {}\nDescription: {}\nUsage: {}{}\nExamples:\n{}",
            definition.name,
            aliases,
            ctx.with_prefix(&definition.description),
            Self::usage(ctx, &definition),
            if definition.admin_only { "\n(Admin only)" } else { "" },
            examples
        )
    }
}

#[async_trait]
impl Command for HelpCommand {
    async fn call(&self, ctx: &InvocationContext) -> Result<()> {
        let text = match ctx.args.first() {
            Some(key) => Self::detail(ctx, key),
            None => Self::overview(ctx),
        };
        ctx.reply(&text).await;
        Ok(())
    }

    fn supports_postback(&self) -> bool {
        true
    }

    async fn on_postback(&self, ctx: &InvocationContext, payload: &str) -> Result<()> {
        let text = if payload.trim().is_empty() {
            Self::overview(ctx)
        } else {
            Self::detail(ctx, payload.trim())
        };
        ctx.reply(&text).await;
        Ok(())
    }
}
