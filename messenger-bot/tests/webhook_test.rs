//! Integration tests for the webhook HTTP surface.
//!
//! Drives the axum router in-process with `tower::ServiceExt::oneshot`; dispatch runs against
//! the recording messenger.

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::{test_bot, TestBot, PAGE_ID, USER_ID};
use hmac::{Hmac, Mac};
use http_body_util::BodyExt;
use messenger_bot::webhook::{verify_signature, SIGNATURE_HEADER};
use messenger_bot::{router, WebhookState};
use sha2::Sha256;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

const VERIFY_TOKEN: &str = "verify-me";
const APP_SECRET: &str = "app-secret";

fn webhook_state(bot: &TestBot, app_secret: Option<&str>) -> WebhookState {
    WebhookState {
        bot: Arc::clone(&bot.state),
        verify_token: VERIFY_TOKEN.to_string(),
        app_secret: app_secret.map(str::to_string),
    }
}

fn sign(body: &[u8]) -> String {
    let mut mac = Hmac::<Sha256>::new_from_slice(APP_SECRET.as_bytes()).unwrap();
    mac.update(body);
    format!("sha256={}", hex::encode(mac.finalize().into_bytes()))
}

fn text_event_body(text: &str) -> String {
    serde_json::json!({
        "object": "page",
        "entry": [{
            "id": PAGE_ID,
            "time": 1720000000000i64,
            "messaging": [{
                "sender": {"id": USER_ID},
                "recipient": {"id": PAGE_ID},
                "timestamp": 1720000000000i64,
                "message": {"mid": "m_1", "text": text}
            }]
        }]
    })
    .to_string()
}

async fn body_string(response: axum::response::Response) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn post(body: String, signature: Option<String>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/webhook")
        .header("content-type", "application/json");
    if let Some(signature) = signature {
        builder = builder.header(SIGNATURE_HEADER, signature);
    }
    builder.body(Body::from(body)).unwrap()
}

/// Dispatch runs on spawned tasks; waits until `count` texts were sent or a second passes.
async fn wait_for_texts(bot: &TestBot, count: usize) -> Vec<String> {
    for _ in 0..100 {
        let texts = bot.messenger.texts();
        if texts.len() >= count {
            return texts;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    bot.messenger.texts()
}

/// **Test: Root and health endpoints answer**
///
/// **Setup:** Router over a test bot.
///
/// **Action:** `GET /` and `GET /health`.
///
/// **Expected:** The greeting, and `{"status":"ok"}`.
#[tokio::test]
async fn test_root_and_health() {
    let bot = test_bot().await;
    let app = router(webhook_state(&bot, None));

    let root = app
        .clone()
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(root.status(), StatusCode::OK);
    assert_eq!(body_string(root).await, "Hello, World!");

    let health = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(health.status(), StatusCode::OK);
    let json: serde_json::Value = serde_json::from_str(&body_string(health).await).unwrap();
    assert_eq!(json["status"], "ok");
}

/// **Test: Subscription handshake echoes the challenge only for the right token**
///
/// **Setup:** Router with verify token `verify-me`.
///
/// **Action:** GET /webhook with the right token, a wrong token, and the wrong mode.
///
/// **Expected:** 200 with the challenge, then 403 Forbidden twice.
#[tokio::test]
async fn test_verify_handshake() {
    let bot = test_bot().await;
    let app = router(webhook_state(&bot, None));

    let ok = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/webhook?hub.mode=subscribe&hub.verify_token=verify-me&hub.challenge=12345")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(ok.status(), StatusCode::OK);
    assert_eq!(body_string(ok).await, "12345");

    for uri in [
        "/webhook?hub.mode=subscribe&hub.verify_token=wrong&hub.challenge=1",
        "/webhook?hub.mode=unsubscribe&hub.verify_token=verify-me&hub.challenge=1",
    ] {
        let denied = app
            .clone()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(denied.status(), StatusCode::FORBIDDEN);
        assert_eq!(body_string(denied).await, "Forbidden");
    }
}

/// **Test: An empty configured token never verifies**
///
/// **Setup:** Router with an empty verify token.
///
/// **Action:** Handshake with an empty `hub.verify_token`.
///
/// **Expected:** 403.
#[tokio::test]
async fn test_verify_with_empty_token_fails() {
    let bot = test_bot().await;
    let mut state = webhook_state(&bot, None);
    state.verify_token = String::new();

    let response = router(state)
        .oneshot(
            Request::builder()
                .uri("/webhook?hub.mode=subscribe&hub.verify_token=&hub.challenge=1")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

/// **Test: Events are acknowledged and then dispatched**
///
/// **Setup:** Router without an app secret.
///
/// **Action:** POST a page event carrying `!ping`.
///
/// **Expected:** 200 EVENT_RECEIVED; the ping reply is sent to the user.
#[tokio::test]
async fn test_event_received_and_dispatched() {
    let bot = test_bot().await;
    let app = router(webhook_state(&bot, None));

    let response = app.oneshot(post(text_event_body("!ping"), None)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "EVENT_RECEIVED");
    let texts = wait_for_texts(&bot, 1).await;
    assert_eq!(texts, vec!["Not available. Try running another command first.".to_string()]);
}

/// **Test: Malformed bodies are rejected**
///
/// **Setup:** Router without an app secret.
///
/// **Action:** POST `not json`.
///
/// **Expected:** 400 Invalid JSON payload; nothing dispatched.
#[tokio::test]
async fn test_malformed_body_rejected() {
    let bot = test_bot().await;
    let app = router(webhook_state(&bot, None));

    let response = app.oneshot(post("not json".to_string(), None)).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_string(response).await, "Invalid JSON payload");
    assert!(bot.messenger.sent().is_empty());
}

/// **Test: Non-page objects are acknowledged without dispatch**
///
/// **Setup:** Router without an app secret.
///
/// **Action:** POST `{"object":"instagram","entry":[]}`.
///
/// **Expected:** 200 EVENT_RECEIVED; nothing sent.
#[tokio::test]
async fn test_non_page_object_acknowledged() {
    let bot = test_bot().await;
    let app = router(webhook_state(&bot, None));

    let response = app
        .oneshot(post(r#"{"object":"instagram","entry":[]}"#.to_string(), None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(bot.messenger.sent().is_empty());
}

/// **Test: With an app secret, unsigned or mis-signed posts are refused**
///
/// **Setup:** Router with app secret `app-secret`.
///
/// **Action:** POST without a signature, with a wrong one, and correctly signed.
///
/// **Expected:** 401 twice, then 200 EVENT_RECEIVED.
#[tokio::test]
async fn test_signature_required_with_app_secret() {
    let bot = test_bot().await;
    let app = router(webhook_state(&bot, Some(APP_SECRET)));
    let body = text_event_body("!help");

    let unsigned = app.clone().oneshot(post(body.clone(), None)).await.unwrap();
    assert_eq!(unsigned.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_string(unsigned).await, "Invalid signature");

    let wrong = app
        .clone()
        .oneshot(post(body.clone(), Some(format!("sha256={}", "00".repeat(32)))))
        .await
        .unwrap();
    assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);

    let signature = sign(body.as_bytes());
    assert!(verify_signature(APP_SECRET, body.as_bytes(), &signature));
    let signed = app.oneshot(post(body, Some(signature))).await.unwrap();
    assert_eq!(signed.status(), StatusCode::OK);
    assert_eq!(body_string(signed).await, "EVENT_RECEIVED");
}
