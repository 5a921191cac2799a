//! Graph API client: the production [`Messenger`].
//!
//! `POST {base}/me/messages` for messages, sender actions and multipart uploads;
//! `GET {base}/{psid}?fields=…` for profiles. The page access token goes in the query string.

use async_trait::async_trait;
use mbot_core::{
    AttachmentUpload, MbotError, Messenger, OutboundPayload, Result, SendReceipt, UserProfile,
};
use reqwest::multipart::{Form, Part};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, error, instrument};

pub const PROFILE_FIELDS: &str = "first_name,last_name,profile_pic,locale,timezone,gender";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub struct GraphApiClient {
    http: reqwest::Client,
    base_url: String,
    access_token: String,
}

impl GraphApiClient {
    pub fn new(base_url: impl Into<String>, access_token: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| MbotError::Transport(e.to_string()))?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            access_token: access_token.into(),
        })
    }

    fn messages_url(&self) -> String {
        format!("{}/me/messages", self.base_url)
    }

    /// JSON body for everything except uploads.
    fn request_body(recipient_id: &str, payload: &OutboundPayload) -> Option<Value> {
        match payload {
            OutboundPayload::Action(action) => Some(json!({
                "recipient": { "id": recipient_id },
                "sender_action": action.as_str(),
            })),
            other => other.message_json().map(|message| {
                json!({
                    "recipient": { "id": recipient_id },
                    "message": message,
                    "messaging_type": "RESPONSE",
                })
            }),
        }
    }

    fn upload_form(recipient_id: &str, upload: &AttachmentUpload) -> Result<Form> {
        let file = Part::bytes(upload.data.clone())
            .file_name(upload.filename.clone())
            .mime_str(&upload.content_type)
            .map_err(|e| MbotError::Transport(e.to_string()))?;
        let message = json!({ "attachment": { "type": upload.kind.as_str(), "payload": {} } });
        Ok(Form::new()
            .text("recipient", json!({ "id": recipient_id }).to_string())
            .text("messaging_type", "RESPONSE")
            .text("message", message.to_string())
            .part("filedata", file))
    }

    async fn receipt(response: reqwest::Response) -> Result<SendReceipt> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %body, "Graph API send failed");
            return Err(MbotError::Transport(format!("Graph API returned {}", status)));
        }
        response
            .json::<SendReceipt>()
            .await
            .map_err(|e| MbotError::Transport(format!("Invalid Graph API response: {}", e)))
    }
}

#[async_trait]
impl Messenger for GraphApiClient {
    #[instrument(skip(self, payload))]
    async fn send(&self, recipient_id: &str, payload: &OutboundPayload) -> Result<SendReceipt> {
        let request = self
            .http
            .post(self.messages_url())
            .query(&[("access_token", self.access_token.as_str())]);

        let request = match payload {
            OutboundPayload::Upload(upload) => request.multipart(Self::upload_form(recipient_id, upload)?),
            other => match Self::request_body(recipient_id, other) {
                Some(body) => request.json(&body),
                None => return Err(MbotError::Transport("Payload has no request body".to_string())),
            },
        };

        let response = request
            .send()
            .await
            .map_err(|e| MbotError::Transport(e.to_string()))?;
        let receipt = Self::receipt(response).await?;
        debug!(message_id = ?receipt.message_id, "Graph API send ok");
        Ok(receipt)
    }

    #[instrument(skip(self))]
    async fn fetch_profile(&self, psid: &str) -> Result<Option<UserProfile>> {
        let response = self
            .http
            .get(format!("{}/{}", self.base_url, psid))
            .query(&[
                ("fields", PROFILE_FIELDS),
                ("access_token", self.access_token.as_str()),
            ])
            .send()
            .await
            .map_err(|e| MbotError::Transport(e.to_string()))?;

        let status = response.status();
        if status.is_client_error() {
            debug!(status = %status, "No profile available");
            return Ok(None);
        }
        if !status.is_success() {
            return Err(MbotError::Transport(format!("Graph API returned {}", status)));
        }
        response
            .json::<UserProfile>()
            .await
            .map(Some)
            .map_err(|e| MbotError::Transport(format!("Invalid profile response: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mbot_core::SenderAction;

    #[test]
    fn test_text_request_body() {
        let body = GraphApiClient::request_body("42", &OutboundPayload::text("hi")).unwrap();
        assert_eq!(
            body,
            json!({
                "recipient": { "id": "42" },
                "message": { "text": "hi" },
                "messaging_type": "RESPONSE",
            })
        );
    }

    #[test]
    fn test_sender_action_body() {
        let body =
            GraphApiClient::request_body("42", &OutboundPayload::Action(SenderAction::TypingOn))
                .unwrap();
        assert_eq!(
            body,
            json!({ "recipient": { "id": "42" }, "sender_action": "typing_on" })
        );
    }
}
