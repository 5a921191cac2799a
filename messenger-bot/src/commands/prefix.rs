//! `prefix [new]`: shows or sets the sender's custom prefix (at most 5 characters).

use crate::command::Command;
use crate::context::InvocationContext;
use async_trait::async_trait;
use mbot_core::{Result, UserRecord};
use serde_json::Value;
use tracing::info;

pub const MAX_PREFIX_CHARS: usize = 5;

pub struct PrefixCommand;

#[async_trait]
impl Command for PrefixCommand {
    async fn call(&self, ctx: &InvocationContext) -> Result<()> {
        let Some(new_prefix) = ctx.args.first() else {
            let text = match ctx.user.as_ref().and_then(|u| u.custom_prefix()) {
                Some(current) => format!("Your current prefix is: {}", current),
                None => "You are using the default prefix.".to_string(),
            };
            ctx.reply(&text).await;
            return Ok(());
        };

        if new_prefix.chars().count() > MAX_PREFIX_CHARS {
            ctx.reply("Prefix must be a string of up to 5 characters.")
                .await;
            return Ok(());
        }

        ctx.users()
            .save_user(
                &ctx.sender_id,
                UserRecord::custom_update(&ctx.sender_id, "prefix", Value::from(new_prefix.as_str())),
            )
            .await?;
        info!(sender_id = %ctx.sender_id, prefix = %new_prefix, "Custom prefix set");
        ctx.reply(&format!("Your custom prefix is now set to: {}", new_prefix))
            .await;
        Ok(())
    }
}
