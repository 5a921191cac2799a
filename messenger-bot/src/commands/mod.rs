//! Built-in framework commands and their default manifests.

mod cmd;
mod help;
mod ping;
mod prefix;
mod timezone;
mod userinfo;

pub use cmd::CmdCommand;
pub use help::HelpCommand;
pub use ping::PingCommand;
pub use prefix::PrefixCommand;
pub use timezone::{resolve_timezone, TimezoneCommand, TimezoneResolution};
pub use userinfo::{relative_time, UserInfoCommand};

use crate::registry::{CommandManifest, HandlerTable};
use std::sync::Arc;

/// Handler kinds available to manifests.
pub fn builtin_table() -> HandlerTable {
    HandlerTable::new()
        .with("help", Arc::new(HelpCommand))
        .with("ping", Arc::new(PingCommand))
        .with("prefix", Arc::new(PrefixCommand))
        .with("cmd", Arc::new(CmdCommand))
        .with("userinfo", Arc::new(UserInfoCommand))
        .with("timezone", Arc::new(TimezoneCommand))
}

fn manifest(
    name: &str,
    aliases: &[&str],
    admin_only: bool,
    description: &str,
    usage: &str,
    category: &str,
    examples: &[&str],
) -> CommandManifest {
    CommandManifest {
        name: name.to_string(),
        aliases: aliases.iter().map(|a| a.to_string()).collect(),
        admin_only,
        handler: name.to_string(),
        description: description.to_string(),
        usage: usage.to_string(),
        category: category.to_string(),
        examples: examples.iter().map(|e| e.to_string()).collect(),
    }
}

/// Manifests seeded into an empty command directory.
pub fn default_manifests() -> Vec<CommandManifest> {
    vec![
        manifest(
            "help",
            &["h"],
            false,
            "List all commands or get help for a specific command.",
            "{prefix}help [command]",
            "general",
            &["{prefix}help", "{prefix}help ping"],
        ),
        manifest(
            "ping",
            &["p"],
            false,
            "Replies with Pong!",
            "{prefix}ping",
            "utility",
            &[],
        ),
        manifest(
            "prefix",
            &[],
            false,
            "Gets or sets your custom command prefix.",
            "{prefix}prefix [newPrefix]",
            "utility",
            &["{prefix}prefix", "{prefix}prefix ?"],
        ),
        manifest(
            "cmd",
            &[],
            true,
            "Manage bot commands (admin only).",
            "{prefix}cmd install <name> <url> | reload <name> | unload <name>",
            "admin",
            &[],
        ),
        manifest(
            "userinfo",
            &["me", "profile"],
            false,
            "Shows your Messenger profile info.",
            "{prefix}userinfo [refresh]",
            "general",
            &["{prefix}userinfo", "{prefix}userinfo refresh"],
        ),
        manifest(
            "timezone",
            &[],
            false,
            "Set your timezone for personalized moment messages.",
            "{prefix}timezone <timezone_name_or_gmt_offset>",
            "utility",
            &[
                "{prefix}timezone Asia/Dhaka",
                "{prefix}timezone Dhaka",
                "{prefix}timezone London",
                "{prefix}timezone Europe/Berlin",
                "{prefix}timezone GMT+6",
                "{prefix}timezone PST",
            ],
        ),
    ]
}
