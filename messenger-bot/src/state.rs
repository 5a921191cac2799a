//! Shared bot state handed to the dispatcher, commands and scheduler.

use crate::config::BotConfig;
use crate::correlation::CorrelationStore;
use crate::latency::LatencyTracker;
use crate::registry::CommandRegistry;
use chrono_tz::Tz;
use mbot_core::Messenger;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;
use storage::UserStore;

/// Dispatch-time settings derived from config.
#[derive(Debug, Clone)]
pub struct DispatchSettings {
    pub page_id: Option<String>,
    pub admin_ids: Vec<String>,
    pub command_prefix: String,
    pub timezone: Tz,
}

impl DispatchSettings {
    pub fn from_config(config: &BotConfig) -> anyhow::Result<Self> {
        Ok(Self {
            page_id: config.base.page_id.clone(),
            admin_ids: config.engine.admin_ids.clone(),
            command_prefix: config.engine.command_prefix.clone(),
            timezone: config.engine.tz()?,
        })
    }

    pub fn is_admin(&self, sender_id: &str) -> bool {
        self.admin_ids.iter().any(|id| id == sender_id)
    }
}

impl Default for DispatchSettings {
    fn default() -> Self {
        Self {
            page_id: None,
            admin_ids: Vec::new(),
            command_prefix: "!".to_string(),
            timezone: chrono_tz::Asia::Dhaka,
        }
    }
}

pub struct BotState {
    pub settings: DispatchSettings,
    pub registry: Arc<CommandRegistry>,
    pub correlations: CorrelationStore,
    pub latency: LatencyTracker,
    pub users: Arc<dyn UserStore>,
    pub messenger: Arc<dyn Messenger>,
}

impl BotState {
    pub fn new(
        settings: DispatchSettings,
        registry: Arc<CommandRegistry>,
        correlations: CorrelationStore,
        users: Arc<dyn UserStore>,
        messenger: Arc<dyn Messenger>,
    ) -> Self {
        Self {
            settings,
            registry,
            correlations,
            latency: LatencyTracker::new(),
            users,
            messenger,
        }
    }

    /// Correlation store sized from `CORRELATION_CAPACITY` / `CORRELATION_TTL_SECS`.
    pub fn correlation_store(config: &BotConfig) -> CorrelationStore {
        let capacity = NonZeroUsize::new(config.engine.correlation_capacity).unwrap_or(NonZeroUsize::MIN);
        CorrelationStore::new(
            capacity,
            Duration::from_secs(config.engine.correlation_ttl_secs),
        )
    }

    /// Effective prefix: the user's custom prefix, else the process default.
    pub fn prefix_for(&self, user: Option<&mbot_core::UserRecord>) -> String {
        user.and_then(|u| u.custom_prefix())
            .unwrap_or(&self.settings.command_prefix)
            .to_string()
    }
}
