use anyhow::Result;
use mbot_core::{init_tracing, Messenger};
use std::sync::Arc;
use storage::UserStore;
use tracing::{error, info, instrument};

use crate::components::{build_bot_components, create_messenger, create_user_store, BotComponents};
use crate::config::BotConfig;
use crate::scheduler::{MomentKind, SweepReport};
use crate::webhook;

/// Main entry: validate config, init logging, build components, start the scheduler, then serve
/// the webhook until the process exits.
#[instrument(skip(config))]
pub async fn run_bot(config: BotConfig) -> Result<()> {
    config.validate()?;
    init_tracing(config.log_file())?;

    info!(
        port = config.port(),
        user_db_type = %config.base.user_db_type,
        commands_dir = %config.engine.commands_dir.display(),
        "Initializing bot"
    );

    let users = create_user_store(&config).await?;
    let messenger = create_messenger(&config)?;
    let components = build_bot_components(&config, users, messenger).await?;
    serve_components(&config, components).await
}

/// Serves pre-built components. Used by tests that inject stores and a mock messenger.
pub async fn serve_components(config: &BotConfig, components: BotComponents) -> Result<()> {
    if config.engine.scheduler_enabled {
        let scheduler = Arc::clone(&components.scheduler);
        tokio::spawn(async move {
            if let Err(e) = scheduler.run().await {
                error!(error = %e, "Moment scheduler stopped");
            }
        });
    } else {
        info!("Moment scheduler disabled");
    }

    info!("Bot started successfully");
    webhook::serve(components.webhook_state(config), config.port()).await
}

/// Runs one moment sweep immediately (the `broadcast` subcommand).
#[instrument(skip(config))]
pub async fn run_broadcast(config: BotConfig, kind: MomentKind) -> Result<SweepReport> {
    config.validate()?;
    init_tracing(config.log_file())?;

    let users = create_user_store(&config).await?;
    let messenger = create_messenger(&config)?;
    broadcast_with(&config, users, messenger, kind).await
}

/// Broadcast over injected users and messenger.
pub async fn broadcast_with(
    config: &BotConfig,
    users: Arc<dyn UserStore>,
    messenger: Arc<dyn Messenger>,
    kind: MomentKind,
) -> Result<SweepReport> {
    let components = build_bot_components(config, users, messenger).await?;
    components.scheduler.sweep(kind, chrono::Utc::now()).await
}
