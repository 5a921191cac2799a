//! Recording implementation of [`mbot_core::Messenger`] for integration tests.
//!
//! Every send is recorded with the message id handed back, so tests can assert on reply text
//! and simulate a user replying to a specific bot message.

use async_trait::async_trait;
use mbot_core::{MbotError, Messenger, OutboundPayload, Result, SendReceipt, UserProfile};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

/// One recorded call to `send(recipient_id, payload)`.
#[derive(Debug, Clone)]
pub struct SentRecord {
    pub recipient_id: String,
    pub payload: OutboundPayload,
    /// Id returned to the caller; `None` for sender actions and failed sends.
    pub message_id: Option<String>,
}

#[derive(Default)]
pub struct MockMessenger {
    sent: Mutex<Vec<SentRecord>>,
    profiles: Mutex<HashMap<String, UserProfile>>,
    /// When set, every non-action send fails with a transport error.
    failing: AtomicBool,
}

#[allow(dead_code)]
impl MockMessenger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_profile(&self, psid: &str, profile: UserProfile) {
        self.profiles.lock().insert(psid.to_string(), profile);
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn sent(&self) -> Vec<SentRecord> {
        self.sent.lock().clone()
    }

    /// Text payloads in send order.
    pub fn texts(&self) -> Vec<String> {
        self.sent
            .lock()
            .iter()
            .filter_map(|r| r.payload.as_text().map(str::to_string))
            .collect()
    }

    /// Text payloads sent to `recipient_id`.
    pub fn texts_to(&self, recipient_id: &str) -> Vec<String> {
        self.sent
            .lock()
            .iter()
            .filter(|r| r.recipient_id == recipient_id)
            .filter_map(|r| r.payload.as_text().map(str::to_string))
            .collect()
    }

    /// Message id of the most recent successful text send.
    pub fn last_text_id(&self) -> Option<String> {
        self.sent
            .lock()
            .iter()
            .rev()
            .find(|r| r.payload.as_text().is_some())
            .and_then(|r| r.message_id.clone())
    }

    pub fn clear(&self) {
        self.sent.lock().clear();
    }
}

#[async_trait]
impl Messenger for MockMessenger {
    async fn send(&self, recipient_id: &str, payload: &OutboundPayload) -> Result<SendReceipt> {
        let is_action = matches!(payload, OutboundPayload::Action(_));
        let failing = !is_action && self.failing.load(Ordering::SeqCst);
        let message_id = if is_action || failing {
            None
        } else {
            Some(format!("mid.{}", uuid::Uuid::new_v4()))
        };

        self.sent.lock().push(SentRecord {
            recipient_id: recipient_id.to_string(),
            payload: payload.clone(),
            message_id: message_id.clone(),
        });

        if failing {
            return Err(MbotError::Transport("mock send failure".to_string()));
        }
        Ok(SendReceipt {
            recipient_id: Some(recipient_id.to_string()),
            message_id,
        })
    }

    async fn fetch_profile(&self, psid: &str) -> Result<Option<UserProfile>> {
        Ok(self.profiles.lock().get(psid).cloned())
    }
}
