//! mbot CLI: run the webhook bot, broadcast moments, list commands. Config from env and optional CLI args.

use anyhow::Result;
use clap::Parser;
use messenger_bot::cli::{load_config, Cli, Commands};
use messenger_bot::components::create_registry;
use messenger_bot::{run_bot, run_broadcast};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run { port } => {
            let config = load_config(port)?;
            run_bot(config).await
        }
        Commands::Broadcast { kind } => {
            let config = load_config(None)?;
            let report = run_broadcast(config, kind).await?;
            println!(
                "{} moments: sent {}, skipped {}, failed {}",
                kind, report.sent, report.skipped, report.failed
            );
            Ok(())
        }
        Commands::ListCommands => {
            let config = load_config(None)?;
            config.validate()?;
            let registry = create_registry(&config).await?;
            for definition in registry.definitions() {
                let aliases = if definition.aliases.is_empty() {
                    String::new()
                } else {
                    format!(" ({})", definition.aliases.join(", "))
                };
                let admin = if definition.admin_only { " [admin]" } else { "" };
                println!("{}{}{} - {}", definition.name, aliases, admin, definition.description);
            }
            Ok(())
        }
    }
}
