//! Config tests.

use crate::config::BotConfig;
use serial_test::serial;
use std::env;

const KEYS: &[&str] = &[
    "PORT",
    "VERIFY_TOKEN",
    "PAGE_ACCESS_TOKEN",
    "APP_SECRET",
    "PAGE_ID",
    "ADMIN_IDS",
    "COMMAND_PREFIX",
    "USER_DB_TYPE",
    "USER_DB_PATH",
    "SQLITE_PATH",
    "TIMEZONE",
    "GRAPH_API_URL",
    "LOG_FILE",
    "COMMANDS_DIR",
    "INSTALL_ALLOWLIST",
    "CORRELATION_CAPACITY",
    "CORRELATION_TTL_SECS",
    "BROADCAST_CONCURRENCY",
    "SCHEDULER_ENABLED",
];

fn clear_env() {
    for key in KEYS {
        env::remove_var(key);
    }
}

#[test]
#[serial]
fn test_load_config_with_defaults() {
    clear_env();
    env::set_var("PAGE_ACCESS_TOKEN", "page_token");

    let config = BotConfig::load(None).unwrap();

    assert_eq!(config.port(), 3000);
    assert_eq!(config.base.page_access_token, "page_token");
    assert!(config.base.verify_token.is_empty());
    assert!(config.base.app_secret.is_none());
    assert!(config.base.page_id.is_none());
    assert_eq!(config.graph_api_url(), "https://graph.facebook.com/v19.0");
    assert_eq!(config.log_file(), "logs/messenger-bot.log");
    assert_eq!(config.base.user_db_type, "json");
    assert_eq!(config.base.user_db_path, "./data/users.json");
    assert_eq!(config.base.sqlite_path, "./data/users.sqlite");

    let engine = config.engine();
    assert_eq!(config.command_prefix(), "!");
    assert!(engine.admin_ids.is_empty());
    assert_eq!(engine.timezone, "Asia/Dhaka");
    assert_eq!(engine.commands_dir.to_str(), Some("./commands"));
    assert!(engine.install_allowlist.is_empty());
    assert_eq!(engine.correlation_capacity, 10_000);
    assert_eq!(engine.correlation_ttl_secs, 86_400);
    assert_eq!(engine.broadcast_concurrency, 8);
    assert!(engine.scheduler_enabled);
    assert!(config.validate().is_ok());
}

#[test]
#[serial]
fn test_load_config_with_custom_values() {
    clear_env();
    env::set_var("PAGE_ACCESS_TOKEN", "page_token");
    env::set_var("PORT", "8080");
    env::set_var("VERIFY_TOKEN", "verify");
    env::set_var("APP_SECRET", "secret");
    env::set_var("PAGE_ID", "PAGE1");
    env::set_var("ADMIN_IDS", "100, 200,,300");
    env::set_var("COMMAND_PREFIX", "/");
    env::set_var("USER_DB_TYPE", "sqlite");
    env::set_var("TIMEZONE", "Europe/Berlin");
    env::set_var("INSTALL_ALLOWLIST", "https://raw.example.com/cmds/");
    env::set_var("CORRELATION_CAPACITY", "50");
    env::set_var("SCHEDULER_ENABLED", "false");

    let config = BotConfig::load(None).unwrap();

    assert_eq!(config.port(), 8080);
    assert_eq!(config.base.verify_token, "verify");
    assert_eq!(config.base.app_secret.as_deref(), Some("secret"));
    assert_eq!(config.base.page_id.as_deref(), Some("PAGE1"));
    assert_eq!(config.engine.admin_ids, vec!["100", "200", "300"]);
    assert_eq!(config.command_prefix(), "/");
    assert_eq!(config.base.user_db_type, "sqlite");
    assert_eq!(config.engine.tz().unwrap(), chrono_tz::Europe::Berlin);
    assert_eq!(
        config.engine.install_allowlist,
        vec!["https://raw.example.com/cmds/"]
    );
    assert_eq!(config.engine.correlation_capacity, 50);
    assert!(!config.engine.scheduler_enabled);
    assert!(config.validate().is_ok());

    clear_env();
}

#[test]
#[serial]
fn test_load_config_with_override_port() {
    clear_env();
    env::set_var("PAGE_ACCESS_TOKEN", "page_token");
    env::set_var("PORT", "8080");

    let config = BotConfig::load(Some(9090)).unwrap();

    assert_eq!(config.port(), 9090);
    clear_env();
}

#[test]
#[serial]
fn test_load_config_requires_page_access_token() {
    clear_env();

    let err = BotConfig::load(None).unwrap_err();

    assert!(err.to_string().contains("PAGE_ACCESS_TOKEN"));
}

#[test]
#[serial]
fn test_validate_rejects_invalid_values() {
    clear_env();
    env::set_var("PAGE_ACCESS_TOKEN", "page_token");
    env::set_var("GRAPH_API_URL", "not-a-valid-url");
    let config = BotConfig::load(None).unwrap();
    let err = config.validate().unwrap_err();
    assert!(err.to_string().contains("GRAPH_API_URL"));

    clear_env();
    env::set_var("PAGE_ACCESS_TOKEN", "page_token");
    env::set_var("USER_DB_TYPE", "mongodb");
    let config = BotConfig::load(None).unwrap();
    assert!(config.validate().is_err());

    clear_env();
    env::set_var("PAGE_ACCESS_TOKEN", "page_token");
    env::set_var("TIMEZONE", "Mars/Olympus");
    let config = BotConfig::load(None).unwrap();
    assert!(config.validate().is_err());

    clear_env();
}

#[test]
#[serial]
fn test_load_config_rejects_malformed_numbers() {
    clear_env();
    env::set_var("PAGE_ACCESS_TOKEN", "page_token");
    env::set_var("CORRELATION_TTL_SECS", "a day");

    assert!(BotConfig::load(None).is_err());
    clear_env();
}
