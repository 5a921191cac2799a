//! Shared integration-test harness: a bot state over an in-memory user store, a recording
//! messenger and a temporary manifest directory seeded with the built-in commands.

#![allow(dead_code)]

pub mod mock_messenger;

pub use mock_messenger::{MockMessenger, SentRecord};

use async_trait::async_trait;
use mbot_core::Result;
use messenger_bot::commands::{builtin_table, default_manifests};
use messenger_bot::{
    BotState, Command, CommandRegistry, CorrelationStore, DispatchSettings, HandlerTable,
    InvocationContext, ManifestDirectory,
};
use parking_lot::Mutex;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::sync::Once;
use std::time::Duration;
use storage::InMemoryUserStore;
use tempfile::TempDir;
use tracing_subscriber::{fmt, EnvFilter};

pub const PAGE_ID: &str = "page-1";
pub const USER_ID: &str = "user-1";
pub const ADMIN_ID: &str = "admin-1";

static TRACING_INIT: Once = Once::new();

/// Test-writer tracing; `RUST_LOG` overrides the default filter.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        let env_filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("debug,messenger_bot=debug"));
        let _ = fmt().with_env_filter(env_filter).with_test_writer().try_init();
    });
}

pub struct TestBot {
    pub state: Arc<BotState>,
    pub messenger: Arc<MockMessenger>,
    pub users: Arc<InMemoryUserStore>,
    pub source: Arc<ManifestDirectory>,
    /// Keeps the manifest directory alive for the test.
    pub dir: TempDir,
}

pub fn settings() -> DispatchSettings {
    DispatchSettings {
        page_id: Some(PAGE_ID.to_string()),
        admin_ids: vec![ADMIN_ID.to_string()],
        command_prefix: "!".to_string(),
        timezone: chrono_tz::Asia::Dhaka,
    }
}

/// Wraps a handler and records the args of every `call`.
pub struct RecordingCommand {
    inner: Arc<dyn Command>,
    calls: Mutex<Vec<Vec<String>>>,
}

impl RecordingCommand {
    pub fn new(inner: Arc<dyn Command>) -> Self {
        Self {
            inner,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl Command for RecordingCommand {
    async fn call(&self, ctx: &InvocationContext) -> Result<()> {
        self.calls.lock().push(ctx.args.clone());
        self.inner.call(ctx).await
    }
}

/// Built-ins seeded and loaded; installs allowed from `allowlist`.
pub async fn test_bot_with(allowlist: Vec<String>) -> TestBot {
    test_bot_with_table(allowlist, builtin_table()).await
}

/// Like [`test_bot_with`] with handlers resolved from `table`.
pub async fn test_bot_with_table(allowlist: Vec<String>, table: HandlerTable) -> TestBot {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let source = Arc::new(ManifestDirectory::new(dir.path().join("commands"), table));
    source.seed(&default_manifests()).await.unwrap();

    let registry = Arc::new(CommandRegistry::new(source.clone(), allowlist));
    registry.load().await.unwrap();

    let messenger = Arc::new(MockMessenger::new());
    let users = Arc::new(InMemoryUserStore::new());
    let correlations = CorrelationStore::new(NonZeroUsize::new(100).unwrap(), Duration::from_secs(3600));
    let state = Arc::new(BotState::new(
        settings(),
        registry,
        correlations,
        users.clone(),
        messenger.clone(),
    ));

    TestBot {
        state,
        messenger,
        users,
        source,
        dir,
    }
}

pub async fn test_bot() -> TestBot {
    test_bot_with(Vec::new()).await
}
