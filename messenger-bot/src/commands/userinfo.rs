//! `userinfo [refresh]`: the sender's stored profile, optionally re-fetched from the Graph API.

use crate::command::Command;
use crate::context::{AttachmentData, InvocationContext};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use mbot_core::{AttachmentKind, Result, UserRecord};
use tracing::{info, warn};

pub struct UserInfoCommand;

impl UserInfoCommand {
    async fn resolve_user(ctx: &InvocationContext, refresh: bool) -> Option<UserRecord> {
        if refresh {
            return match ctx.state().messenger.fetch_profile(&ctx.sender_id).await {
                Ok(Some(profile)) => {
                    let update = UserRecord::from_profile(&ctx.sender_id, profile);
                    if let Err(e) = ctx.users().save_user(&ctx.sender_id, update.clone()).await {
                        warn!(error = %e, sender_id = %ctx.sender_id, "Saving refreshed profile failed");
                        return Some(update);
                    }
                    info!(sender_id = %ctx.sender_id, "Profile refreshed");
                    match ctx.users().get_user(&ctx.sender_id).await {
                        Ok(Some(saved)) => Some(saved),
                        _ => Some(update),
                    }
                }
                Ok(None) => None,
                Err(e) => {
                    warn!(error = %e, sender_id = %ctx.sender_id, "Profile refresh failed");
                    None
                }
            };
        }

        if let Some(user) = &ctx.user {
            return Some(user.clone());
        }
        match ctx.users().get_user(&ctx.sender_id).await {
            Ok(user) => user,
            Err(e) => {
                warn!(error = %e, sender_id = %ctx.sender_id, "User lookup failed");
                None
            }
        }
    }

    async fn show(ctx: &InvocationContext, refresh: bool) -> Result<()> {
        let Some(user) = Self::resolve_user(ctx, refresh).await else {
            ctx.reply("User info not found.").await;
            return Ok(());
        };
        let text = render(&user, Utc::now());
        if let Some(pic) = &user.profile_pic {
            ctx.send_attachment(AttachmentKind::Image, AttachmentData::Url(pic.clone()))
                .await;
        }
        ctx.reply(&text).await;
        Ok(())
    }
}

/// Profile summary lines; absent fields are skipped.
pub fn render(user: &UserRecord, now: DateTime<Utc>) -> String {
    let mut lines = vec![format!(
        "👤 Name: {} {}",
        user.first_name.as_deref().unwrap_or(""),
        user.last_name.as_deref().unwrap_or("")
    )];
    if !user.psid.is_empty() {
        lines.push(format!("🆔 ID: {}", user.psid));
    }
    if let Some(locale) = &user.locale {
        lines.push(format!("🌐 Locale: {}", locale));
    }
    if let Some(name) = user.custom_timezone() {
        match name.parse::<Tz>() {
            Ok(tz) => lines.push(format!(
                "🕒 Timezone: {} (GMT{})",
                name,
                now.with_timezone(&tz).format("%:z")
            )),
            Err(_) => lines.push(format!("🕒 Timezone: {}", name)),
        }
    }
    if let Some(gender) = &user.gender {
        lines.push(format!("⚧ Gender: {}", gender));
    }
    if let Some(last_active) = user.last_active {
        lines.push(format!("🕓 Last Active: {}", relative_time(last_active, now)));
    }
    lines.join("\n").trim().to_string()
}

/// Human-readable distance between `then` and `now`, e.g. `3 minutes ago` or `in 2 days`.
pub fn relative_time(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let delta = now.signed_duration_since(then).num_seconds();
    let secs = delta.unsigned_abs() as f64;
    let minutes = (secs / 60.0).round();
    let hours = (secs / 3600.0).round();
    let days = (secs / 86_400.0).round();

    let phrase = if secs < 45.0 {
        "a few seconds".to_string()
    } else if secs < 90.0 {
        "a minute".to_string()
    } else if minutes < 45.0 {
        format!("{} minutes", minutes)
    } else if minutes < 90.0 {
        "an hour".to_string()
    } else if hours < 22.0 {
        format!("{} hours", hours)
    } else if hours < 36.0 {
        "a day".to_string()
    } else if days < 26.0 {
        format!("{} days", days)
    } else if days < 45.0 {
        "a month".to_string()
    } else if days < 320.0 {
        format!("{} months", (days / 30.4).round())
    } else if days < 548.0 {
        "a year".to_string()
    } else {
        format!("{} years", (days / 365.0).round())
    };

    if delta >= 0 {
        format!("{} ago", phrase)
    } else {
        format!("in {}", phrase)
    }
}

#[async_trait]
impl Command for UserInfoCommand {
    async fn call(&self, ctx: &InvocationContext) -> Result<()> {
        let refresh = ctx
            .args
            .first()
            .is_some_and(|a| a.eq_ignore_ascii_case("refresh"));
        Self::show(ctx, refresh).await
    }

    fn supports_postback(&self) -> bool {
        true
    }

    async fn on_postback(&self, ctx: &InvocationContext, payload: &str) -> Result<()> {
        Self::show(ctx, payload.trim().eq_ignore_ascii_case("refresh")).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use serde_json::json;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    #[test]
    fn test_relative_time_thresholds() {
        let now = at(0);
        assert_eq!(relative_time(now - Duration::seconds(10), now), "a few seconds ago");
        assert_eq!(relative_time(now - Duration::seconds(60), now), "a minute ago");
        assert_eq!(relative_time(now - Duration::minutes(5), now), "5 minutes ago");
        assert_eq!(relative_time(now - Duration::hours(3), now), "3 hours ago");
        assert_eq!(relative_time(now - Duration::hours(30), now), "a day ago");
        assert_eq!(relative_time(now - Duration::days(4), now), "4 days ago");
        assert_eq!(relative_time(now - Duration::days(800), now), "2 years ago");
        assert_eq!(relative_time(now + Duration::minutes(5), now), "in 5 minutes");
    }

    #[test]
    fn test_render_includes_timezone_offset() {
        let mut user = UserRecord::new("42");
        user.first_name = Some("Ada".to_string());
        user.last_name = Some("Lovelace".to_string());
        user.custom.insert("timezone".to_string(), json!("Asia/Dhaka"));

        let text = render(&user, at(0));
        assert!(text.starts_with("👤 Name: Ada Lovelace\n🆔 ID: 42"));
        assert!(text.contains("🕒 Timezone: Asia/Dhaka (GMT+06:00)"));
        assert!(!text.contains("Gender"));
    }
}
