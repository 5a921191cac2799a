//! BotConfig: BaseConfig + EngineConfig. Use load() for env-based loading.

use anyhow::Result;

use super::{BaseConfig, EngineConfig};

/// Bot config: BaseConfig + engine settings. Use BotConfig::load() for env-based loading.
#[derive(Debug, Clone)]
pub struct BotConfig {
    pub base: BaseConfig,
    pub engine: EngineConfig,
}

impl BotConfig {
    /// Load full config from environment variables. If `port` is provided it overrides PORT.
    /// Call validate() after load to check config before init.
    pub fn load(port: Option<u16>) -> Result<Self> {
        let base = BaseConfig::load(port)?;
        let engine = EngineConfig::from_env()?;
        Ok(Self { base, engine })
    }

    /// Validate config. Call after load() to fail fast before init.
    pub fn validate(&self) -> Result<()> {
        self.base.validate()?;
        self.engine.validate()
    }

    pub fn base(&self) -> &BaseConfig {
        &self.base
    }
    pub fn engine(&self) -> &EngineConfig {
        &self.engine
    }

    pub fn port(&self) -> u16 {
        self.base.port
    }
    pub fn log_file(&self) -> &str {
        &self.base.log_file
    }
    pub fn graph_api_url(&self) -> &str {
        &self.base.graph_api_url
    }
    pub fn command_prefix(&self) -> &str {
        &self.engine.command_prefix
    }
}
