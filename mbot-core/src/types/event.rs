//! Inbound webhook payload as delivered by the Messenger platform.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Top-level webhook body: `{ "object": "page", "entry": [...] }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookPayload {
    pub object: String,
    #[serde(default)]
    pub entry: Vec<WebhookEntry>,
}

impl WebhookPayload {
    /// Every messaging event across all entries, in delivery order.
    pub fn into_events(self) -> Vec<WebhookEvent> {
        self.entry
            .into_iter()
            .flat_map(|entry| entry.messaging)
            .collect()
    }
}

/// One page entry; carries a batch of messaging events.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookEntry {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub time: Option<i64>,
    #[serde(default)]
    pub messaging: Vec<WebhookEvent>,
}

/// Sender or recipient identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Party {
    pub id: String,
}

/// One user action: a message, a postback, or a delivery/read receipt.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WebhookEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender: Option<Party>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipient: Option<Party>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<IncomingMessage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postback: Option<Postback>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read: Option<Value>,
}

/// Message body. Every field is optional on the wire.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IncomingMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachments: Option<Vec<IncomingAttachment>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quick_reply: Option<QuickReply>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<ReplyTo>,
    #[serde(default)]
    pub is_echo: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncomingAttachment {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub payload: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuickReply {
    pub payload: String,
}

/// Reference to the message this one replies to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplyTo {
    pub mid: String,
}

/// Structured button activation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Postback {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default)]
    pub payload: String,
}

impl IncomingMessage {
    /// Text with empty strings treated as absent.
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref().filter(|t| !t.is_empty())
    }

    pub fn reply_to_mid(&self) -> Option<&str> {
        self.reply_to
            .as_ref()
            .map(|r| r.mid.as_str())
            .filter(|mid| !mid.is_empty())
    }

    pub fn has_attachments(&self) -> bool {
        self.attachments.as_ref().is_some_and(|a| !a.is_empty())
    }
}

impl WebhookEvent {
    pub const UNKNOWN_SENDER: &'static str = "UNKNOWN_SENDER";
    pub const UNKNOWN_THREAD: &'static str = "UNKNOWN_THREAD";

    pub fn sender_id(&self) -> &str {
        self.sender
            .as_ref()
            .map(|p| p.id.as_str())
            .unwrap_or(Self::UNKNOWN_SENDER)
    }

    pub fn thread_id(&self) -> &str {
        self.recipient
            .as_ref()
            .map(|p| p.id.as_str())
            .unwrap_or(Self::UNKNOWN_THREAD)
    }

    /// Text message from `sender` to `recipient`.
    pub fn text(sender: &str, recipient: &str, text: &str) -> Self {
        Self {
            sender: Some(Party { id: sender.to_string() }),
            recipient: Some(Party { id: recipient.to_string() }),
            timestamp: Some(chrono::Utc::now().timestamp_millis()),
            message: Some(IncomingMessage {
                mid: Some(format!("m_{}", chrono::Utc::now().timestamp_nanos_opt().unwrap_or(0))),
                text: Some(text.to_string()),
                ..IncomingMessage::default()
            }),
            ..Self::default()
        }
    }

    /// Postback from `sender` to `recipient`.
    pub fn postback(sender: &str, recipient: &str, payload: &str) -> Self {
        Self {
            sender: Some(Party { id: sender.to_string() }),
            recipient: Some(Party { id: recipient.to_string() }),
            timestamp: Some(chrono::Utc::now().timestamp_millis()),
            postback: Some(Postback {
                title: None,
                payload: payload.to_string(),
            }),
            ..Self::default()
        }
    }

    /// Marks the message as a reply to `mid`. No-op for events without a message.
    pub fn replying_to(mut self, mid: &str) -> Self {
        if let Some(message) = self.message.as_mut() {
            message.reply_to = Some(ReplyTo { mid: mid.to_string() });
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_page_payload() {
        let body = r#"{
            "object": "page",
            "entry": [{
                "id": "PAGE",
                "time": 1720000000000,
                "messaging": [
                    {
                        "sender": {"id": "U1"},
                        "recipient": {"id": "PAGE"},
                        "timestamp": 1720000000000,
                        "message": {"mid": "m1", "text": "!help", "reply_to": {"mid": "m0"}}
                    },
                    {
                        "sender": {"id": "U2"},
                        "recipient": {"id": "PAGE"},
                        "postback": {"title": "Jokes", "payload": "TELL_JOKE"}
                    },
                    {
                        "sender": {"id": "U3"},
                        "recipient": {"id": "PAGE"},
                        "read": {"watermark": 1}
                    }
                ]
            }]
        }"#;

        let payload: WebhookPayload = serde_json::from_str(body).unwrap();
        assert_eq!(payload.object, "page");
        let events = payload.into_events();
        assert_eq!(events.len(), 3);

        let message = events[0].message.as_ref().unwrap();
        assert_eq!(message.text(), Some("!help"));
        assert_eq!(message.reply_to_mid(), Some("m0"));
        assert!(!message.is_echo);
        assert_eq!(events[1].postback.as_ref().unwrap().payload, "TELL_JOKE");
        assert!(events[2].read.is_some());
    }

    #[test]
    fn test_missing_parties_fall_back_to_unknown() {
        let event = WebhookEvent::default();
        assert_eq!(event.sender_id(), WebhookEvent::UNKNOWN_SENDER);
        assert_eq!(event.thread_id(), WebhookEvent::UNKNOWN_THREAD);
    }

    #[test]
    fn test_empty_text_is_absent() {
        let message = IncomingMessage {
            text: Some(String::new()),
            ..IncomingMessage::default()
        };
        assert!(message.text().is_none());
    }
}
