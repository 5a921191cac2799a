//! # mbot-core
//!
//! Core types and traits for the Messenger bot: webhook events, outbound payloads, the user
//! record, the [`Messenger`] transport trait, the error taxonomy and tracing initialization.
//! Transport-agnostic; used by storage and messenger-bot.

pub mod error;
pub mod logger;
pub mod messenger;
pub mod types;

pub use error::{HandlerError, MbotError, RegistryError, Result};
pub use logger::init_tracing;
pub use messenger::{Messenger, SendReceipt};
pub use types::{
    AttachmentKind, AttachmentUpload, IncomingAttachment, IncomingMessage, OutboundPayload, Party,
    Postback, QuickReply, ReplyTo, SenderAction, UserProfile, UserRecord, WebhookEntry,
    WebhookEvent, WebhookPayload,
};
