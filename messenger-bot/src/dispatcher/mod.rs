//! # Event dispatcher
//!
//! Turns one webhook event into at most one handler invocation:
//! admit → mark seen → resolve user → route → invoke. Returns the [`DispatchOutcome`] reached.
//!
//! Handler errors propagate (typing-off is then skipped); sender-action, notice and user-store
//! failures are logged only.

mod classify;
mod postback;

pub use classify::{admit, route, IgnoreReason, Route};
pub use postback::{demo_response, GET_STARTED, JOKES, SHOW_OPTIONS, TELL_JOKE};

use crate::context::{EventInputs, InvocationContext};
use crate::state::BotState;
use chrono::Utc;
use mbot_core::{OutboundPayload, Result, SenderAction, UserRecord, WebhookEvent};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, instrument, warn};

pub const ADMIN_ONLY_NOTICE: &str = "🚫 This command is for admins only.";
pub const ATTACHMENT_ACK: &str =
    "Thanks for the attachment! I can't process it yet, but I'll learn soon.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    Ignored(IgnoreReason),
    CommandInvoked { command: String },
    CommandNotFound { token: String },
    MissingCommand,
    AccessDenied { command: String },
    ContinuationInvoked { command: String },
    FallbackNotice,
    PostbackInvoked { command: String },
    DemoPostback { payload: String },
    UnhandledPostback { payload: String },
    AttachmentAcknowledged,
    QuickReplyAcknowledged { payload: String },
    NoAction,
}

async fn sender_action(state: &BotState, sender_id: &str, action: SenderAction) {
    if let Err(e) = state
        .messenger
        .send(sender_id, &OutboundPayload::Action(action))
        .await
    {
        debug!(error = %e, sender_id = %sender_id, action = action.as_str(), "Sender action failed");
    }
}

async fn notify(state: &BotState, sender_id: &str, payload: OutboundPayload) {
    if let Err(e) = state.messenger.send(sender_id, &payload).await {
        warn!(error = %e, sender_id = %sender_id, "Notice send failed");
    }
}

/// Stored user, else the platform profile. `last_active` is refreshed and saved.
async fn resolve_user(state: &BotState, sender_id: &str) -> Option<UserRecord> {
    let stored = match state.users.get_user(sender_id).await {
        Ok(user) => user,
        Err(e) => {
            warn!(error = %e, sender_id = %sender_id, "User lookup failed");
            None
        }
    };

    let mut user = match stored {
        Some(user) => user,
        None => match state.messenger.fetch_profile(sender_id).await {
            Ok(Some(profile)) => UserRecord::from_profile(sender_id, profile),
            Ok(None) => return None,
            Err(e) => {
                warn!(error = %e, sender_id = %sender_id, "Profile fetch failed");
                return None;
            }
        },
    };

    user.last_active = Some(Utc::now());
    if let Err(e) = state.users.save_user(sender_id, user.clone()).await {
        warn!(error = %e, sender_id = %sender_id, "User save failed");
    }
    Some(user)
}

/// Handles one webhook event end to end.
#[instrument(skip(state, event), fields(sender_id = %event.sender_id()))]
pub async fn dispatch(state: Arc<BotState>, event: WebhookEvent) -> Result<DispatchOutcome> {
    let received_at = Instant::now();

    if let Err(reason) = admit(&event, state.settings.page_id.as_deref()) {
        debug!(reason = ?reason, "step: event ignored");
        return Ok(DispatchOutcome::Ignored(reason));
    }

    let sender_id = event.sender_id().to_string();
    let thread_id = event.thread_id().to_string();
    sender_action(&state, &sender_id, SenderAction::MarkSeen).await;

    let user = resolve_user(&state, &sender_id).await;
    let user_display = user
        .as_ref()
        .map(|u| format!("{} ({})", u.display_name(), sender_id))
        .unwrap_or_else(|| sender_id.clone());
    let prefix = state.prefix_for(user.as_ref());
    let routed = route(&event, &prefix);

    let inputs = EventInputs {
        sender_id: sender_id.clone(),
        thread_id,
        event,
        user,
        received_at,
        prefix: prefix.clone(),
    };

    match routed {
        Route::Command { token, args } => {
            let Some(definition) = state.registry.lookup(&token) else {
                info!(user = %user_display, token = %token, "step: unknown command");
                if token.is_empty() {
                    notify(
                        &state,
                        &sender_id,
                        OutboundPayload::text(format!(
                            "Please enter a command. Use {}help to see all available commands.",
                            prefix
                        )),
                    )
                    .await;
                    return Ok(DispatchOutcome::MissingCommand);
                }
                notify(
                    &state,
                    &sender_id,
                    OutboundPayload::text(format!(
                        "Command {} not found, try {}help to see all available commands.",
                        token, prefix
                    )),
                )
                .await;
                return Ok(DispatchOutcome::CommandNotFound { token });
            };

            let command = definition.name.clone();
            if definition.admin_only && !state.settings.is_admin(&sender_id) {
                info!(user = %user_display, command = %command, "step: admin-only command denied");
                notify(&state, &sender_id, OutboundPayload::text(ADMIN_ONLY_NOTICE)).await;
                return Ok(DispatchOutcome::AccessDenied { command });
            }

            info!(user = %user_display, command = %command, args = %args.join(" "), "step: command invoked");
            sender_action(&state, &sender_id, SenderAction::TypingOn).await;
            let ctx = InvocationContext::for_command(Arc::clone(&state), Arc::clone(&definition), inputs, args);
            definition.handler().call(&ctx).await?;
            sender_action(&state, &sender_id, SenderAction::TypingOff).await;
            Ok(DispatchOutcome::CommandInvoked { command })
        }

        Route::Continuation { mid } => match state.correlations.resolve(&mid) {
            Some(entry) => {
                let definition = Arc::clone(&entry.command);
                info!(user = %user_display, command = %definition.name, reply_to = %mid, "step: continuation invoked");
                sender_action(&state, &sender_id, SenderAction::TypingOn).await;
                let ctx = InvocationContext::for_continuation(Arc::clone(&state), entry, inputs);
                definition.handler().on_reply(&ctx).await?;
                sender_action(&state, &sender_id, SenderAction::TypingOff).await;
                Ok(DispatchOutcome::ContinuationInvoked {
                    command: definition.name.clone(),
                })
            }
            None => fallback(&state, &sender_id, &prefix).await,
        },

        Route::Fallback => fallback(&state, &sender_id, &prefix).await,

        Route::Postback { key, rest, payload } => {
            info!(user = %user_display, payload = %payload, "step: postback received");
            if let Some(definition) = state
                .registry
                .lookup(&key)
                .filter(|d| d.supports_postback())
            {
                let ctx = InvocationContext::for_postback(Arc::clone(&state), Arc::clone(&definition), inputs);
                definition.handler().on_postback(&ctx, &rest).await?;
                return Ok(DispatchOutcome::PostbackInvoked {
                    command: definition.name.clone(),
                });
            }

            match demo_response(&payload) {
                Some(response) => {
                    notify(&state, &sender_id, response).await;
                    Ok(DispatchOutcome::DemoPostback { payload })
                }
                None => {
                    warn!(user = %user_display, payload = %payload, "Unhandled postback");
                    notify(
                        &state,
                        &sender_id,
                        OutboundPayload::text(format!("Unhandled postback: {}", payload)),
                    )
                    .await;
                    Ok(DispatchOutcome::UnhandledPostback { payload })
                }
            }
        }

        Route::Attachment => {
            info!(user = %user_display, "step: attachment acknowledged");
            sender_action(&state, &sender_id, SenderAction::TypingOn).await;
            notify(&state, &sender_id, OutboundPayload::text(ATTACHMENT_ACK)).await;
            sender_action(&state, &sender_id, SenderAction::TypingOff).await;
            Ok(DispatchOutcome::AttachmentAcknowledged)
        }

        Route::QuickReply { payload } => {
            info!(user = %user_display, payload = %payload, "step: quick reply acknowledged");
            sender_action(&state, &sender_id, SenderAction::TypingOn).await;
            notify(
                &state,
                &sender_id,
                OutboundPayload::text(format!("You chose: \"{}\".", payload)),
            )
            .await;
            sender_action(&state, &sender_id, SenderAction::TypingOff).await;
            Ok(DispatchOutcome::QuickReplyAcknowledged { payload })
        }

        Route::NoAction => Ok(DispatchOutcome::NoAction),
    }
}

/// Notice for text that is neither a command nor a reply to a pending continuation.
pub fn prefix_notice(prefix: &str) -> String {
    format!(
        "👋 Hi! My current command prefix for you is \"{p}\". Use it before any command. For example: {p}help",
        p = prefix
    )
}

async fn fallback(state: &BotState, sender_id: &str, prefix: &str) -> Result<DispatchOutcome> {
    sender_action(state, sender_id, SenderAction::TypingOn).await;
    notify(
        state,
        sender_id,
        OutboundPayload::text(prefix_notice(prefix)),
    )
    .await;
    sender_action(state, sender_id, SenderAction::TypingOff).await;
    Ok(DispatchOutcome::FallbackNotice)
}
