use crate::command::Command;
use crate::context::InvocationContext;
use async_trait::async_trait;
use mbot_core::Result;

/// `ping`: last and average reply latency for the sender.
pub struct PingCommand;

#[async_trait]
impl Command for PingCommand {
    async fn call(&self, ctx: &InvocationContext) -> Result<()> {
        let text = match ctx.state().latency.stats(&ctx.sender_id) {
            Some(stats) => format!(
                "🏓 Pong! Last latency: {}ms | Average: {:.2}ms",
                stats.last, stats.average
            ),
            None => "Not available. Try running another command first.".to_string(),
        };
        ctx.reply(&text).await;
        Ok(())
    }
}
