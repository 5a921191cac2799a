//! Integration tests for component assembly from env config.
//!
//! Sets env vars for a temp commands directory, builds components over injected stores and the
//! recording messenger, then exercises dispatch and broadcast through them.

mod common;

use common::MockMessenger;
use mbot_core::{UserRecord, WebhookEvent};
use messenger_bot::{
    broadcast_with, build_bot_components, dispatch, BotConfig, DispatchOutcome, MomentKind,
};
use serial_test::serial;
use std::env;
use std::sync::Arc;
use storage::{InMemoryUserStore, UserStore};
use tempfile::TempDir;

fn setup_env(temp_dir: &TempDir) -> BotConfig {
    for key in ["PORT", "APP_SECRET", "PAGE_ID", "GRAPH_API_URL", "TIMEZONE", "INSTALL_ALLOWLIST"] {
        env::remove_var(key);
    }
    env::set_var("PAGE_ACCESS_TOKEN", "test_page_token");
    env::set_var("VERIFY_TOKEN", "test_verify_token");
    env::set_var("USER_DB_TYPE", "memory");
    env::set_var("COMMAND_PREFIX", "/");
    env::set_var("ADMIN_IDS", "admin-1, admin-2");
    env::set_var("SCHEDULER_ENABLED", "false");
    env::set_var(
        "COMMANDS_DIR",
        temp_dir.path().join("commands").display().to_string(),
    );
    BotConfig::load(None).expect("BotConfig::load must succeed in test setup")
}

/// **Test: Components seed the commands directory and dispatch with the configured prefix**
///
/// **Setup:** Env with COMMAND_PREFIX=/ and an empty temp COMMANDS_DIR.
///
/// **Action:** Build components, then dispatch `/help` from an admin.
///
/// **Expected:** Manifests are written to disk; help runs and lists the admin-only cmd command.
#[tokio::test]
#[serial]
async fn test_build_components_from_env() {
    common::init_tracing();
    let temp_dir = TempDir::new().expect("TempDir::new must succeed");
    let config = setup_env(&temp_dir);
    let messenger = Arc::new(MockMessenger::new());

    let components = build_bot_components(&config, Arc::new(InMemoryUserStore::new()), messenger.clone())
        .await
        .unwrap();

    assert!(temp_dir.path().join("commands").join("help.json").exists());
    assert_eq!(components.state.registry.definitions().len(), 6);
    let webhook = components.webhook_state(&config);
    assert_eq!(webhook.verify_token, "test_verify_token");
    assert!(webhook.app_secret.is_none());

    let event = WebhookEvent::text("admin-2", "page", "/help");
    let outcome = dispatch(Arc::clone(&components.state), event).await.unwrap();

    assert_eq!(
        outcome,
        DispatchOutcome::CommandInvoked {
            command: "help".to_string()
        }
    );
    let overview = messenger.texts().pop().unwrap();
    assert!(overview.contains("• cmd (admin) - Manage bot commands (admin only)."));
    assert!(overview.contains("Usage: /ping"));
}

/// **Test: A one-off broadcast reaches every stored user**
///
/// **Setup:** Env config; two stored users.
///
/// **Action:** `broadcast_with(.., Morning)`.
///
/// **Expected:** Two sends, no skips.
#[tokio::test]
#[serial]
async fn test_broadcast_with_injected_store() {
    let temp_dir = TempDir::new().expect("TempDir::new must succeed");
    let config = setup_env(&temp_dir);
    let users = Arc::new(InMemoryUserStore::new());
    for psid in ["u1", "u2"] {
        users.save_user(psid, UserRecord::new(psid)).await.unwrap();
    }
    let messenger = Arc::new(MockMessenger::new());

    let report = broadcast_with(&config, users, messenger.clone(), MomentKind::Morning)
        .await
        .unwrap();

    assert_eq!(report.sent, 2);
    assert_eq!(report.skipped, 0);
    assert_eq!(messenger.texts_to("u1").len(), 1);
    assert_eq!(messenger.texts_to("u2").len(), 1);
}
