//! Built-in postback responses for payloads no command claims.

use mbot_core::OutboundPayload;
use rand::seq::SliceRandom;
use serde_json::json;

pub const GET_STARTED: &str = "GET_STARTED";
pub const TELL_JOKE: &str = "TELL_JOKE";
pub const SHOW_OPTIONS: &str = "SHOW_OPTIONS";

const WELCOME_IMAGE: &str = "https://placehold.co/600x400/EEE/31343C?text=Veltrix%20AI";

pub const JOKES: &[&str] = &[
    "Why don't scientists trust atoms? Because they make up everything!",
    "Why did the scarecrow win an award? Because he was outstanding in his field!",
    "Why did the math book look sad? Because it had too many problems.",
    "Parallel lines have so much in common. It's a shame they'll never meet.",
    "Why did the bicycle fall over? Because it was two-tired!",
    "I told my computer I needed a break, and it said 'No problem, I'll go to sleep.'",
];

fn welcome() -> OutboundPayload {
    OutboundPayload::template(json!({
        "template_type": "generic",
        "elements": [{
            "title": "Welcome to Veltrix AI!",
            "subtitle": "I am a bot designed to help you. What can I do for you?",
            "image_url": WELCOME_IMAGE,
            "buttons": [
                { "type": "postback", "title": "Tell me a joke", "payload": TELL_JOKE },
                { "type": "postback", "title": "Show me options", "payload": SHOW_OPTIONS },
            ],
        }],
    }))
}

fn options() -> OutboundPayload {
    let buttons: Vec<_> = [
        ("Tell me a joke", TELL_JOKE),
        ("Show me memes", "meme"),
        ("Show my profile", "userinfo"),
        ("Help", "help"),
    ]
    .iter()
    .map(|(title, payload)| json!({ "type": "postback", "title": title, "payload": payload }))
    .collect();

    OutboundPayload::template(json!({
        "template_type": "button",
        "text": "Here are some options:",
        "buttons": buttons,
    }))
}

/// Response for a demo payload, `None` when the payload is not one of them.
pub fn demo_response(payload: &str) -> Option<OutboundPayload> {
    match payload {
        GET_STARTED => Some(welcome()),
        TELL_JOKE => JOKES
            .choose(&mut rand::thread_rng())
            .map(|joke| OutboundPayload::text(*joke)),
        SHOW_OPTIONS => Some(options()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_joke_comes_from_pool() {
        let payload = demo_response(TELL_JOKE).unwrap();
        let text = payload.as_text().unwrap();
        assert!(JOKES.contains(&text));
    }

    #[test]
    fn test_options_template_buttons() {
        let json = demo_response(SHOW_OPTIONS).unwrap().message_json().unwrap();
        let buttons = json["attachment"]["payload"]["buttons"].as_array().unwrap();
        assert_eq!(json["attachment"]["type"], "template");
        assert_eq!(buttons.len(), 4);
        assert_eq!(buttons[2]["payload"], "userinfo");
    }

    #[test]
    fn test_unknown_payload_has_no_demo() {
        assert!(demo_response("NOPE").is_none());
    }
}
