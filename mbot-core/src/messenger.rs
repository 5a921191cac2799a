//! Messenger abstraction for outbound sends and profile lookups.
//!
//! [`Messenger`] is transport-agnostic; the Graph API client in messenger-bot implements it and
//! tests substitute a recording mock.

use crate::error::Result;
use crate::types::{OutboundPayload, UserProfile};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Result of a successful send. `message_id` is absent for sender actions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendReceipt {
    #[serde(default)]
    pub recipient_id: Option<String>,
    #[serde(default)]
    pub message_id: Option<String>,
}

impl SendReceipt {
    pub fn with_message_id(message_id: impl Into<String>) -> Self {
        Self {
            recipient_id: None,
            message_id: Some(message_id.into()),
        }
    }
}

/// Outbound side of the messaging platform.
#[async_trait]
pub trait Messenger: Send + Sync {
    /// Sends one payload to the recipient and returns the provider's receipt.
    async fn send(&self, recipient_id: &str, payload: &OutboundPayload) -> Result<SendReceipt>;
    /// Looks up the public profile of a user. `Ok(None)` when the platform has no profile for them.
    async fn fetch_profile(&self, psid: &str) -> Result<Option<UserProfile>>;
}
