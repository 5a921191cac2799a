//! Pure event classification: admission filter and routing. No I/O.

use mbot_core::WebhookEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// Sent by the page itself.
    OwnPage,
    /// Sender equals recipient.
    SelfAddressed,
    /// Delivery or read receipt.
    Receipt,
    Echo,
    /// Message with no text, quick reply or reply-to.
    EmptyMessage,
    /// Neither a message nor a postback.
    Unsupported,
}

/// Route taken by an admitted event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// Prefixed text. `token` is the command word as typed (may be empty).
    Command { token: String, args: Vec<String> },
    /// Unprefixed text replying to `mid`.
    Continuation { mid: String },
    /// Unprefixed text with no reply reference.
    Fallback,
    /// Postback payload split on the first `:`.
    Postback {
        key: String,
        rest: String,
        payload: String,
    },
    Attachment,
    QuickReply { payload: String },
    /// Reply-to reference without text, attachments or quick reply.
    NoAction,
}

/// Admission filter, first match wins.
pub fn admit(event: &WebhookEvent, page_id: Option<&str>) -> Result<(), IgnoreReason> {
    let sender_id = event.sender_id();
    if page_id.is_some_and(|page| !page.is_empty() && page == sender_id) {
        return Err(IgnoreReason::OwnPage);
    }
    if event.sender.is_some() && sender_id == event.thread_id() {
        return Err(IgnoreReason::SelfAddressed);
    }
    if event.read.is_some() || event.delivery.is_some() {
        return Err(IgnoreReason::Receipt);
    }
    match (&event.message, &event.postback) {
        (Some(message), _) if message.is_echo => Err(IgnoreReason::Echo),
        (Some(message), _) => {
            if message.text().is_some()
                || message.quick_reply.is_some()
                || message.reply_to_mid().is_some()
            {
                Ok(())
            } else {
                Err(IgnoreReason::EmptyMessage)
            }
        }
        (None, Some(_)) => Ok(()),
        (None, None) => Err(IgnoreReason::Unsupported),
    }
}

/// Routes an admitted event given the sender's effective prefix.
pub fn route(event: &WebhookEvent, prefix: &str) -> Route {
    let Some(message) = &event.message else {
        let payload = event
            .postback
            .as_ref()
            .map(|p| p.payload.clone())
            .unwrap_or_default();
        let (key, rest) = match payload.split_once(':') {
            Some((key, rest)) => (key.to_string(), rest.to_string()),
            None => (payload.clone(), String::new()),
        };
        return Route::Postback { key, rest, payload };
    };

    if let Some(text) = message.text() {
        if let Some(body) = text.strip_prefix(prefix) {
            let mut words = body.split_whitespace().map(str::to_string);
            let token = words.next().unwrap_or_default();
            return Route::Command {
                token,
                args: words.collect(),
            };
        }
        if let Some(mid) = message.reply_to_mid() {
            return Route::Continuation {
                mid: mid.to_string(),
            };
        }
        return Route::Fallback;
    }

    if message.has_attachments() {
        return Route::Attachment;
    }
    match &message.quick_reply {
        Some(quick_reply) => Route::QuickReply {
            payload: quick_reply.payload.clone(),
        },
        None => Route::NoAction,
    }
}
