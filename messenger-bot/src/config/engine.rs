//! Engine config: command prefix, admins, default timezone, correlation bounds, command
//! manifests, broadcast fan-out.

use anyhow::{Context, Result};
use chrono_tz::Tz;
use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// COMMAND_PREFIX
    pub command_prefix: String,
    /// ADMIN_IDS (comma separated)
    pub admin_ids: Vec<String>,
    /// TIMEZONE: process default IANA zone for schedules and users without one
    pub timezone: String,
    /// COMMANDS_DIR: one `<name>.json` manifest per command
    pub commands_dir: PathBuf,
    /// INSTALL_ALLOWLIST (comma separated URL prefixes); empty disables `cmd install`
    pub install_allowlist: Vec<String>,
    /// CORRELATION_CAPACITY
    pub correlation_capacity: usize,
    /// CORRELATION_TTL_SECS
    pub correlation_ttl_secs: u64,
    /// BROADCAST_CONCURRENCY
    pub broadcast_concurrency: usize,
    /// SCHEDULER_ENABLED
    pub scheduler_enabled: bool,
}

fn list(key: &str) -> Vec<String> {
    env::var(key)
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

fn parsed<T: std::str::FromStr>(key: &str, default: T) -> Result<T> {
    match env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map_err(|_| anyhow::anyhow!("{} has an invalid value: {}", key, raw)),
        _ => Ok(default),
    }
}

impl EngineConfig {
    pub fn from_env() -> Result<Self> {
        let command_prefix = env::var("COMMAND_PREFIX")
            .ok()
            .filter(|p| !p.trim().is_empty())
            .unwrap_or_else(|| "!".to_string());
        let timezone = env::var("TIMEZONE")
            .ok()
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| "Asia/Dhaka".to_string());
        let commands_dir = env::var("COMMANDS_DIR")
            .ok()
            .filter(|d| !d.trim().is_empty())
            .unwrap_or_else(|| "./commands".to_string());

        Ok(Self {
            command_prefix,
            admin_ids: list("ADMIN_IDS"),
            timezone,
            commands_dir: PathBuf::from(commands_dir),
            install_allowlist: list("INSTALL_ALLOWLIST"),
            correlation_capacity: parsed("CORRELATION_CAPACITY", 10_000)?,
            correlation_ttl_secs: parsed("CORRELATION_TTL_SECS", 86_400)?,
            broadcast_concurrency: parsed("BROADCAST_CONCURRENCY", 8)?,
            scheduler_enabled: parsed("SCHEDULER_ENABLED", true)?,
        })
    }

    pub fn validate(&self) -> Result<()> {
        self.tz()?;
        if self.correlation_capacity == 0 {
            anyhow::bail!("CORRELATION_CAPACITY must be greater than zero");
        }
        if self.broadcast_concurrency == 0 {
            anyhow::bail!("BROADCAST_CONCURRENCY must be greater than zero");
        }
        Ok(())
    }

    /// Parsed default timezone.
    pub fn tz(&self) -> Result<Tz> {
        self.timezone
            .parse::<Tz>()
            .map_err(|e| anyhow::anyhow!("{}", e))
            .with_context(|| format!("TIMEZONE is not a valid IANA zone: {}", self.timezone))
    }
}
