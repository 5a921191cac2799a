//! Bot configuration: BaseConfig (platform + HTTP + log + user store) + EngineConfig (dispatch,
//! correlation, registry, broadcast).

mod base;
mod bot_config;
mod engine;

#[cfg(test)]
mod tests;

pub use base::BaseConfig;
pub use bot_config::BotConfig;
pub use engine::EngineConfig;
