//! Core types: webhook events, outbound payloads, and user records.
//!
//! Types are split into one file per concern for easier navigation.

mod event;
mod outbound;
mod user;

pub use event::{
    IncomingAttachment, IncomingMessage, Party, Postback, QuickReply, ReplyTo, WebhookEntry,
    WebhookEvent, WebhookPayload,
};
pub use outbound::{AttachmentKind, AttachmentUpload, OutboundPayload, SenderAction};
pub use user::{UserProfile, UserRecord};
