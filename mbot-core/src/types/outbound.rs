//! Outbound payloads: text, sender actions, URL/template attachments, and binary uploads.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SenderAction {
    MarkSeen,
    TypingOn,
    TypingOff,
}

impl SenderAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            SenderAction::MarkSeen => "mark_seen",
            SenderAction::TypingOn => "typing_on",
            SenderAction::TypingOff => "typing_off",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttachmentKind {
    Image,
    Audio,
    Video,
    File,
    Template,
}

impl AttachmentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttachmentKind::Image => "image",
            AttachmentKind::Audio => "audio",
            AttachmentKind::Video => "video",
            AttachmentKind::File => "file",
            AttachmentKind::Template => "template",
        }
    }
}

/// Binary attachment sent as multipart form data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentUpload {
    pub kind: AttachmentKind,
    pub data: Vec<u8>,
    pub filename: String,
    pub content_type: String,
}

/// One outbound unit handed to [`crate::Messenger::send`].
#[derive(Debug, Clone, PartialEq)]
pub enum OutboundPayload {
    Text(String),
    Action(SenderAction),
    /// Attachment referenced by URL or a structured template payload.
    Attachment { kind: AttachmentKind, payload: Value },
    Upload(AttachmentUpload),
}

impl OutboundPayload {
    pub fn text(text: impl Into<String>) -> Self {
        OutboundPayload::Text(text.into())
    }

    pub fn image_url(url: impl Into<String>) -> Self {
        Self::url_attachment(AttachmentKind::Image, url)
    }

    pub fn url_attachment(kind: AttachmentKind, url: impl Into<String>) -> Self {
        OutboundPayload::Attachment {
            kind,
            payload: json!({ "url": url.into(), "is_reusable": false }),
        }
    }

    /// Generic/button template attachment.
    pub fn template(payload: Value) -> Self {
        OutboundPayload::Attachment {
            kind: AttachmentKind::Template,
            payload,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            OutboundPayload::Text(text) => Some(text),
            _ => None,
        }
    }

    /// The `message` object of a Send API request; `None` for sender actions and uploads.
    pub fn message_json(&self) -> Option<Value> {
        match self {
            OutboundPayload::Text(text) => Some(json!({ "text": text })),
            OutboundPayload::Attachment { kind, payload } => Some(json!({
                "attachment": { "type": kind.as_str(), "payload": payload }
            })),
            OutboundPayload::Action(_) | OutboundPayload::Upload(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_message_json() {
        let payload = OutboundPayload::text("hello");
        assert_eq!(payload.message_json(), Some(json!({ "text": "hello" })));
        assert_eq!(payload.as_text(), Some("hello"));
    }

    #[test]
    fn test_url_attachment_json() {
        let payload = OutboundPayload::image_url("https://example.com/a.png");
        assert_eq!(
            payload.message_json(),
            Some(json!({
                "attachment": {
                    "type": "image",
                    "payload": { "url": "https://example.com/a.png", "is_reusable": false }
                }
            }))
        );
    }

    #[test]
    fn test_sender_action_has_no_message() {
        let payload = OutboundPayload::Action(SenderAction::MarkSeen);
        assert!(payload.message_json().is_none());
        assert_eq!(SenderAction::TypingOn.as_str(), "typing_on");
    }
}
