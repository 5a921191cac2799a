//! Webhook HTTP server (axum).
//!
//! `GET /` greeting, `GET /health`, `GET /webhook` subscription handshake, `POST /webhook` event
//! intake. Events are acknowledged with 200 before they are handled; each messaging event is
//! dispatched on its own task and failures are logged there.

use crate::dispatcher::dispatch;
use crate::state::BotState;
use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use mbot_core::WebhookPayload;
use serde::Deserialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

pub const SIGNATURE_HEADER: &str = "X-Hub-Signature-256";

#[derive(Clone)]
pub struct WebhookState {
    pub bot: Arc<BotState>,
    pub verify_token: String,
    /// When set, `POST /webhook` requires a valid signature.
    pub app_secret: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct VerifyQuery {
    #[serde(rename = "hub.mode")]
    pub mode: Option<String>,
    #[serde(rename = "hub.verify_token")]
    pub verify_token: Option<String>,
    #[serde(rename = "hub.challenge")]
    pub challenge: Option<String>,
}

pub fn router(state: WebhookState) -> Router {
    Router::new()
        .route("/", get(handle_root))
        .route("/health", get(handle_health))
        .route("/webhook", get(handle_verify).post(handle_event))
        .with_state(state)
}

/// Binds `0.0.0.0:port` and serves until the process exits.
pub async fn serve(state: WebhookState, port: u16) -> anyhow::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(address = %addr, "step: webhook server listening");
    axum::serve(listener, router(state)).await?;
    Ok(())
}

async fn handle_root() -> &'static str {
    "Hello, World!"
}

async fn handle_health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

fn constant_time_eq(a: &str, b: &str) -> bool {
    let (a, b) = (a.as_bytes(), b.as_bytes());
    let mut diff = a.len() ^ b.len();
    for i in 0..a.len().max(b.len()) {
        diff |= usize::from(a.get(i).copied().unwrap_or(0) ^ b.get(i).copied().unwrap_or(0));
    }
    diff == 0
}

async fn handle_verify(
    State(state): State<WebhookState>,
    Query(params): Query<VerifyQuery>,
) -> impl IntoResponse {
    let token_matches = !state.verify_token.is_empty()
        && params
            .verify_token
            .as_deref()
            .is_some_and(|t| constant_time_eq(t, &state.verify_token));

    if params.mode.as_deref() == Some("subscribe") && token_matches {
        info!("step: webhook verified");
        return (StatusCode::OK, params.challenge.unwrap_or_default());
    }
    warn!("Webhook verification failed: token mismatch or incorrect mode");
    (StatusCode::FORBIDDEN, "Forbidden".to_string())
}

/// Checks an `X-Hub-Signature-256` value (`sha256=<hex>`) against the body.
pub fn verify_signature(app_secret: &str, body: &[u8], signature_header: &str) -> bool {
    use hmac::{Hmac, Mac};
    use sha2::Sha256;

    let Some(hex_sig) = signature_header.strip_prefix("sha256=") else {
        return false;
    };
    let Ok(expected) = hex::decode(hex_sig) else {
        return false;
    };
    let Ok(mut mac) = Hmac::<Sha256>::new_from_slice(app_secret.as_bytes()) else {
        return false;
    };
    mac.update(body);
    mac.verify_slice(&expected).is_ok()
}

async fn handle_event(
    State(state): State<WebhookState>,
    headers: HeaderMap,
    body: Bytes,
) -> impl IntoResponse {
    if let Some(secret) = state.app_secret.as_deref().filter(|s| !s.is_empty()) {
        let signature = headers
            .get(SIGNATURE_HEADER)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");
        if !verify_signature(secret, &body, signature) {
            warn!(
                signature = if signature.is_empty() { "missing" } else { "invalid" },
                "Webhook signature verification failed"
            );
            return (StatusCode::UNAUTHORIZED, "Invalid signature");
        }
    }

    let payload: WebhookPayload = match serde_json::from_slice(&body) {
        Ok(payload) => payload,
        Err(e) => {
            warn!(error = %e, "Malformed webhook payload");
            return (StatusCode::BAD_REQUEST, "Invalid JSON payload");
        }
    };

    if payload.object != "page" {
        debug!(object = %payload.object, "Ignoring non-page webhook");
        return (StatusCode::OK, "EVENT_RECEIVED");
    }

    for event in payload.into_events() {
        let bot = Arc::clone(&state.bot);
        tokio::spawn(async move {
            let sender_id = event.sender_id().to_string();
            match dispatch(bot, event).await {
                Ok(outcome) => debug!(sender_id = %sender_id, outcome = ?outcome, "step: event handled"),
                Err(e) => error!(error = %e, sender_id = %sender_id, "Event handler failed"),
            }
        });
    }
    (StatusCode::OK, "EVENT_RECEIVED")
}
