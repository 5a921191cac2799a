//! Invocation context: everything a command sees for one inbound event, plus bound reply and
//! attachment senders.
//!
//! Replies are chunked and sent in order. Command and continuation replies record latency after
//! every send attempt and, when the command supports continuations, register the last chunk's
//! message id in the correlation store. Postback replies do neither.

use crate::chunker::{self, MAX_MESSAGE_CHARS};
use crate::command::CommandDefinition;
use crate::correlation::{ContextSnapshot, CorrelationEntry};
use crate::registry::CommandRegistry;
use crate::state::BotState;
use mbot_core::{
    AttachmentKind, AttachmentUpload, IncomingMessage, OutboundPayload, SendReceipt, UserRecord,
    WebhookEvent,
};
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Instant;
use storage::UserStore;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyMode {
    Command,
    Continuation,
    Postback,
}

impl ReplyMode {
    fn is_tracked(self) -> bool {
        !matches!(self, ReplyMode::Postback)
    }
}

/// Attachment source accepted by [`InvocationContext::send_attachment`].
#[derive(Debug, Clone)]
pub enum AttachmentData {
    /// Remote `http(s)` URL.
    Url(String),
    /// Raw bytes sent as a multipart upload.
    Bytes {
        data: Vec<u8>,
        filename: String,
        content_type: String,
    },
    /// Structured payload passed through as the attachment `payload`.
    Payload(Value),
    /// Each item is sent in order.
    Many(Vec<AttachmentData>),
}

impl AttachmentData {
    /// PNG bytes with the default upload filename.
    pub fn png(data: Vec<u8>) -> Self {
        AttachmentData::Bytes {
            data,
            filename: "upload.png".to_string(),
            content_type: "image/png".to_string(),
        }
    }

    fn flatten_into(self, out: &mut Vec<AttachmentData>) {
        match self {
            AttachmentData::Many(items) => {
                for item in items {
                    item.flatten_into(out);
                }
            }
            single => out.push(single),
        }
    }
}

#[derive(Clone)]
pub struct InvocationContext {
    pub args: Vec<String>,
    pub sender_id: String,
    pub thread_id: String,
    pub message: Option<IncomingMessage>,
    /// The user's reply; set for continuations only.
    pub reply_message: Option<IncomingMessage>,
    pub event: WebhookEvent,
    pub user: Option<UserRecord>,
    pub received_at: Instant,
    pub prefix: String,
    /// State supplied by the command that registered this continuation.
    pub captured: Map<String, Value>,
    command: Arc<CommandDefinition>,
    mode: ReplyMode,
    state: Arc<BotState>,
}

/// Per-event inputs shared by every context constructor.
pub(crate) struct EventInputs {
    pub sender_id: String,
    pub thread_id: String,
    pub event: WebhookEvent,
    pub user: Option<UserRecord>,
    pub received_at: Instant,
    pub prefix: String,
}

impl InvocationContext {
    pub(crate) fn for_command(
        state: Arc<BotState>,
        command: Arc<CommandDefinition>,
        inputs: EventInputs,
        args: Vec<String>,
    ) -> Self {
        Self {
            args,
            sender_id: inputs.sender_id,
            thread_id: inputs.thread_id,
            message: inputs.event.message.clone(),
            reply_message: None,
            event: inputs.event,
            user: inputs.user,
            received_at: inputs.received_at,
            prefix: inputs.prefix,
            captured: Map::new(),
            command,
            mode: ReplyMode::Command,
            state,
        }
    }

    /// Frozen snapshot overridden by the live sender, user and event.
    pub(crate) fn for_continuation(
        state: Arc<BotState>,
        entry: CorrelationEntry,
        inputs: EventInputs,
    ) -> Self {
        let snapshot = entry.snapshot;
        Self {
            args: snapshot.args,
            sender_id: inputs.sender_id,
            thread_id: snapshot.thread_id,
            message: snapshot.message,
            reply_message: inputs.event.message.clone(),
            event: inputs.event,
            user: inputs.user,
            received_at: inputs.received_at,
            prefix: snapshot.prefix,
            captured: snapshot.captured,
            command: entry.command,
            mode: ReplyMode::Continuation,
            state,
        }
    }

    pub(crate) fn for_postback(
        state: Arc<BotState>,
        command: Arc<CommandDefinition>,
        inputs: EventInputs,
    ) -> Self {
        Self {
            args: Vec::new(),
            sender_id: inputs.sender_id,
            thread_id: inputs.thread_id,
            message: None,
            reply_message: None,
            event: inputs.event,
            user: inputs.user,
            received_at: inputs.received_at,
            prefix: inputs.prefix,
            captured: Map::new(),
            command,
            mode: ReplyMode::Postback,
            state,
        }
    }

    pub fn command(&self) -> &Arc<CommandDefinition> {
        &self.command
    }

    pub fn mode(&self) -> ReplyMode {
        self.mode
    }

    pub fn state(&self) -> &Arc<BotState> {
        &self.state
    }

    pub fn registry(&self) -> &Arc<CommandRegistry> {
        &self.state.registry
    }

    pub fn users(&self) -> &Arc<dyn UserStore> {
        &self.state.users
    }

    pub fn is_admin(&self) -> bool {
        self.state.settings.is_admin(&self.sender_id)
    }

    /// Replaces `{prefix}` (any case) with the effective prefix.
    pub fn with_prefix(&self, template: &str) -> String {
        replace_prefix_placeholder(template, &self.prefix)
    }

    fn elapsed_ms(&self) -> u64 {
        u64::try_from(self.received_at.elapsed().as_millis()).unwrap_or(u64::MAX)
    }

    fn snapshot(&self) -> ContextSnapshot {
        ContextSnapshot {
            args: self.args.clone(),
            sender_id: self.sender_id.clone(),
            thread_id: self.thread_id.clone(),
            message: self.message.clone(),
            event: self.event.clone(),
            user: self.user.clone(),
            prefix: self.prefix.clone(),
            captured: self.captured.clone(),
        }
    }

    /// Sends `text` to the sender in chunks.
    ///
    /// Returns the receipt of the last chunk, or `None` when that send failed. Transport failures
    /// are logged, never returned.
    pub async fn reply(&self, text: &str) -> Option<SendReceipt> {
        self.send_text(text, self.command.supports_reply()).await
    }

    /// Like [`reply`](Self::reply) but never registers a continuation, even for commands that
    /// support them.
    pub async fn reply_final(&self, text: &str) -> Option<SendReceipt> {
        self.send_text(text, false).await
    }

    async fn send_text(&self, text: &str, register: bool) -> Option<SendReceipt> {
        let mut last = None;
        for chunk in chunker::split(text, MAX_MESSAGE_CHARS) {
            let payload = OutboundPayload::Text(chunk);
            let sent = self.state.messenger.send(&self.sender_id, &payload).await;
            if self.mode.is_tracked() {
                self.state.latency.record(&self.sender_id, self.elapsed_ms());
            }
            match sent {
                Ok(receipt) => {
                    last = Some(receipt);
                }
                Err(e) => {
                    warn!(
                        error = %e,
                        sender_id = %self.sender_id,
                        command = %self.command.name,
                        "Reply chunk send failed"
                    );
                    last = None;
                }
            }
        }

        if self.mode.is_tracked() && register {
            if let Some(message_id) = last.as_ref().and_then(|r| r.message_id.clone()) {
                info!(
                    sender_id = %self.sender_id,
                    command = %self.command.name,
                    message_id = %message_id,
                    "step: continuation registered"
                );
                self.state.correlations.register(
                    message_id,
                    CorrelationEntry {
                        command: Arc::clone(&self.command),
                        snapshot: self.snapshot(),
                    },
                );
            }
        }

        last
    }

    /// Like [`reply`](Self::reply), storing `captured` for the continuation it registers.
    pub async fn reply_expecting(
        &self,
        text: &str,
        captured: Map<String, Value>,
    ) -> Option<SendReceipt> {
        let mut ctx = self.clone();
        ctx.captured = captured;
        ctx.reply(text).await
    }

    /// Sends an attachment of `kind`. Returns the receipt of the last item sent.
    pub async fn send_attachment(
        &self,
        kind: AttachmentKind,
        data: AttachmentData,
    ) -> Option<SendReceipt> {
        let mut items = Vec::new();
        data.flatten_into(&mut items);

        let mut last = None;
        for item in items {
            let payload = match item {
                AttachmentData::Url(url) if url.starts_with("http") => {
                    OutboundPayload::url_attachment(kind, url)
                }
                AttachmentData::Url(other) => {
                    warn!(sender_id = %self.sender_id, value = %other, "Unsupported attachment source");
                    last = None;
                    continue;
                }
                AttachmentData::Bytes {
                    data,
                    filename,
                    content_type,
                } => OutboundPayload::Upload(AttachmentUpload {
                    kind,
                    data,
                    filename,
                    content_type,
                }),
                AttachmentData::Payload(payload) => OutboundPayload::Attachment { kind, payload },
                AttachmentData::Many(_) => continue,
            };

            last = match self.state.messenger.send(&self.sender_id, &payload).await {
                Ok(receipt) => Some(receipt),
                Err(e) => {
                    warn!(error = %e, sender_id = %self.sender_id, "Attachment send failed");
                    None
                }
            };
        }
        last
    }
}

/// Case-insensitive `{prefix}` substitution.
pub fn replace_prefix_placeholder(template: &str, prefix: &str) -> String {
    const PLACEHOLDER: &str = "{prefix}";
    let lower = template.to_ascii_lowercase();
    let mut out = String::with_capacity(template.len());
    let mut cursor = 0;
    while let Some(found) = lower[cursor..].find(PLACEHOLDER) {
        let start = cursor + found;
        out.push_str(&template[cursor..start]);
        out.push_str(prefix);
        cursor = start + PLACEHOLDER.len();
    }
    out.push_str(&template[cursor..]);
    out
}
