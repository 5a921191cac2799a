//! CLI parser and config loading.

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::config::BotConfig;
use crate::scheduler::MomentKind;

#[derive(Parser)]
#[command(name = "mbot")]
#[command(about = "Messenger webhook bot: run, broadcast, list commands", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the webhook server and moment scheduler (config from env; port can override PORT).
    Run {
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Send one round of moment messages now.
    Broadcast {
        /// morning, night or random
        #[arg(short, long, default_value = "random")]
        kind: MomentKind,
    },
    /// Print the commands found in COMMANDS_DIR.
    ListCommands,
}

/// Load BotConfig from environment. If `port` is provided it overrides PORT.
pub fn load_config(port: Option<u16>) -> Result<BotConfig> {
    BotConfig::load(port)
}
