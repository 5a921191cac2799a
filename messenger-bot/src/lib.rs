//! # Messenger webhook bot
//!
//! Receives page webhook events, classifies and dispatches them to data-described commands,
//! correlates user replies with earlier bot messages, and broadcasts timezone-aware moment
//! messages. Wires mbot-core types, the storage user stores, the Graph API client and the axum
//! webhook server. Loads config from env.

pub mod chunker;
pub mod cli;
pub mod command;
pub mod commands;
pub mod components;
pub mod config;
pub mod context;
pub mod correlation;
pub mod dispatcher;
pub mod graph;
pub mod latency;
pub mod registry;
pub mod runner;
pub mod scheduler;
pub mod state;
pub mod webhook;

pub use cli::{load_config, Cli, Commands};

pub use command::{Command, CommandDefinition};
pub use context::{AttachmentData, InvocationContext, ReplyMode};
pub use correlation::{ContextSnapshot, CorrelationEntry, CorrelationStore};
pub use dispatcher::{dispatch, DispatchOutcome, IgnoreReason};
pub use registry::{CommandManifest, CommandRegistry, CommandSource, HandlerTable, ManifestDirectory};
pub use state::{BotState, DispatchSettings};

pub use config::{BaseConfig, BotConfig, EngineConfig};
pub use graph::GraphApiClient;
pub use runner::{broadcast_with, run_bot, run_broadcast, serve_components};
pub use scheduler::{Bucket, MomentKind, MomentScheduler, SweepReport};
pub use webhook::{router, WebhookState};

pub use components::{build_bot_components, create_registry, create_user_store, BotComponents};
