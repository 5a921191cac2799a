//! Component factory: builds BotComponents from config. Isolates assembly logic from runner.

use anyhow::{Context, Result};
use mbot_core::Messenger;
use std::sync::Arc;
use storage::{open_user_store, UserStore};
use tracing::{error, info, instrument};

use crate::commands::{builtin_table, default_manifests};
use crate::config::BotConfig;
use crate::graph::GraphApiClient;
use crate::registry::{CommandRegistry, ManifestDirectory};
use crate::scheduler::MomentScheduler;
use crate::state::{BotState, DispatchSettings};
use crate::webhook::WebhookState;

/// Everything the runner needs; produced by the component factory.
pub struct BotComponents {
    pub state: Arc<BotState>,
    pub scheduler: Arc<MomentScheduler>,
}

impl BotComponents {
    pub fn webhook_state(&self, config: &BotConfig) -> WebhookState {
        WebhookState {
            bot: Arc::clone(&self.state),
            verify_token: config.base.verify_token.clone(),
            app_secret: config.base.app_secret.clone(),
        }
    }
}

/// Opens the user store selected by `USER_DB_TYPE`.
#[instrument(skip(config))]
pub async fn create_user_store(config: &BotConfig) -> Result<Arc<dyn UserStore>> {
    let backend = config.base.user_store_backend()?;
    open_user_store(backend, &config.base.user_db_path, &config.base.sqlite_path)
        .await
        .map_err(|e| {
            error!(error = %e, backend = ?backend, "Failed to open user store");
            anyhow::anyhow!("Failed to open user store: {}", e)
        })
}

/// Graph API client for the configured page token.
pub fn create_messenger(config: &BotConfig) -> Result<Arc<dyn Messenger>> {
    let client = GraphApiClient::new(config.graph_api_url(), &config.base.page_access_token)
        .context("Failed to build Graph API client")?;
    Ok(Arc::new(client))
}

/// Seeds missing built-in manifests into `COMMANDS_DIR` and loads every manifest.
#[instrument(skip(config))]
pub async fn create_registry(config: &BotConfig) -> Result<Arc<CommandRegistry>> {
    let source = Arc::new(ManifestDirectory::new(
        config.engine.commands_dir.clone(),
        builtin_table(),
    ));
    let seeded = source
        .seed(&default_manifests())
        .await
        .context("Failed to seed command manifests")?;
    if !seeded.is_empty() {
        info!(commands = ?seeded, dir = %source.dir().display(), "step: manifests seeded");
    }

    let registry = Arc::new(CommandRegistry::new(
        source,
        config.engine.install_allowlist.clone(),
    ));
    let mut count = 0usize;
    registry
        .load_with_progress(|definition| {
            count += 1;
            info!(index = count, command = %definition.name, "Loaded command");
        })
        .await
        .context("Failed to load commands")?;
    info!(commands = count, keys = registry.key_count(), "step: all commands loaded");
    Ok(registry)
}

/// Builds BotComponents from injected users and messenger.
#[instrument(skip(config, users, messenger))]
pub async fn build_bot_components(
    config: &BotConfig,
    users: Arc<dyn UserStore>,
    messenger: Arc<dyn Messenger>,
) -> Result<BotComponents> {
    let settings = DispatchSettings::from_config(config)?;
    let timezone = settings.timezone;
    let registry = create_registry(config).await?;

    let state = Arc::new(BotState::new(
        settings,
        registry,
        BotState::correlation_store(config),
        Arc::clone(&users),
        Arc::clone(&messenger),
    ));
    let scheduler = Arc::new(MomentScheduler::new(
        users,
        messenger,
        timezone,
        config.engine.broadcast_concurrency,
    ));

    Ok(BotComponents { state, scheduler })
}
