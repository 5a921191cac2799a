//! `timezone <name|GMT±N|city>`: stores `custom.timezone` for scheduled moments.
//!
//! Resolution order: GMT/UTC offset, common city/country/abbreviation table, exact IANA name,
//! substring search over IANA names. Ambiguous input gets a numbered list; replying to it with a
//! number picks that zone. Only the numbered list and its re-prompt wait for a reply.

use crate::command::Command;
use crate::context::InvocationContext;
use crate::dispatcher::prefix_notice;
use async_trait::async_trait;
use chrono::{Offset, Utc};
use chrono_tz::{Tz, TZ_VARIANTS};
use mbot_core::{Result, UserRecord};
use serde_json::{json, Map, Value};
use tracing::{error, info};

/// Upper bound on candidates offered as a numbered list.
pub const MAX_CANDIDATES: usize = 15;

const TZ_LIST_URL: &str = "https://en.wikipedia.org/wiki/List_of_tz_database_time_zones";

const COMMON_ZONES: &[(&str, &str)] = &[
    ("dhaka", "Asia/Dhaka"),
    ("london", "Europe/London"),
    ("newyork", "America/New_York"),
    ("paris", "Europe/Paris"),
    ("tokyo", "Asia/Tokyo"),
    ("sydney", "Australia/Sydney"),
    ("losangeles", "America/Los_Angeles"),
    ("chicago", "America/Chicago"),
    ("denver", "America/Denver"),
    ("dubai", "Asia/Dubai"),
    ("kolkata", "Asia/Kolkata"),
    ("india", "Asia/Kolkata"),
    ("bangladesh", "Asia/Dhaka"),
    ("united kingdom", "Europe/London"),
    ("united states", "America/New_York"),
    ("canada", "America/Toronto"),
    ("australia", "Australia/Sydney"),
    ("germany", "Europe/Berlin"),
    ("france", "Europe/Paris"),
    ("japan", "Asia/Tokyo"),
    ("uae", "Asia/Dubai"),
    ("china", "Asia/Shanghai"),
    ("russia", "Europe/Moscow"),
    ("brazil", "America/Sao_Paulo"),
    ("mexico", "America/Mexico_City"),
    ("south africa", "Africa/Johannesburg"),
    ("egypt", "Africa/Cairo"),
    ("greece", "Europe/Athens"),
    ("spain", "Europe/Madrid"),
    ("italy", "Europe/Rome"),
    ("netherlands", "Europe/Amsterdam"),
    ("sweden", "Europe/Stockholm"),
    ("norway", "Europe/Oslo"),
    ("denmark", "Europe/Copenhagen"),
    ("finland", "Europe/Helsinki"),
    ("ireland", "Europe/Dublin"),
    ("new zealand", "Pacific/Auckland"),
    ("argentina", "America/Argentina/Buenos_Aires"),
    ("chile", "America/Santiago"),
    ("peru", "America/Lima"),
    ("colombia", "America/Bogota"),
    ("venezuela", "America/Caracas"),
    ("pakistan", "Asia/Karachi"),
    ("indonesia", "Asia/Jakarta"),
    ("thailand", "Asia/Bangkok"),
    ("vietnam", "Asia/Ho_Chi_Minh"),
    ("philippines", "Asia/Manila"),
    ("malaysia", "Asia/Kuala_Lumpur"),
    ("singapore", "Asia/Singapore"),
    ("saudi arabia", "Asia/Riyadh"),
    ("turkey", "Europe/Istanbul"),
    ("iran", "Asia/Tehran"),
    ("nigeria", "Africa/Lagos"),
    ("kenya", "Africa/Nairobi"),
    ("south korea", "Asia/Seoul"),
    ("hong kong", "Asia/Hong_Kong"),
    ("taiwan", "Asia/Taipei"),
    ("gulf standard time", "Asia/Dubai"),
    ("central european time", "Europe/Paris"),
    ("eastern european time", "Europe/Athens"),
    ("australian eastern standard time", "Australia/Sydney"),
    ("pst", "America/Los_Angeles"),
    ("est", "America/New_York"),
    ("cst", "America/Chicago"),
    ("mst", "America/Denver"),
    ("ist", "Asia/Kolkata"),
    ("bdt", "Asia/Dhaka"),
    ("gst", "Asia/Dubai"),
    ("cet", "Europe/Paris"),
    ("eet", "Europe/Athens"),
    ("aest", "Australia/Sydney"),
    ("berlin", "Europe/Berlin"),
    ("rome", "Europe/Rome"),
    ("madrid", "Europe/Madrid"),
    ("amsterdam", "Europe/Amsterdam"),
    ("stockholm", "Europe/Stockholm"),
    ("oslo", "Europe/Oslo"),
    ("copenhagen", "Europe/Copenhagen"),
    ("helsinki", "Europe/Helsinki"),
    ("dublin", "Europe/Dublin"),
    ("auckland", "Pacific/Auckland"),
    ("buenosaires", "America/Argentina/Buenos_Aires"),
    ("santiago", "America/Santiago"),
    ("lima", "America/Lima"),
    ("bogota", "America/Bogota"),
    ("caracas", "America/Caracas"),
    ("karachi", "Asia/Karachi"),
    ("jakarta", "Asia/Jakarta"),
    ("bangkok", "Asia/Bangkok"),
    ("hochiminh", "Asia/Ho_Chi_Minh"),
    ("manila", "Asia/Manila"),
    ("kualalumpur", "Asia/Kuala_Lumpur"),
    ("riyadh", "Asia/Riyadh"),
    ("istanbul", "Europe/Istanbul"),
    ("tehran", "Asia/Tehran"),
    ("lagos", "Africa/Lagos"),
    ("nairobi", "Africa/Nairobi"),
    ("seoul", "Asia/Seoul"),
    ("shanghai", "Asia/Shanghai"),
    ("hongkong", "Asia/Hong_Kong"),
    ("taipei", "Asia/Taipei"),
    ("johannesburg", "Africa/Johannesburg"),
    ("cairo", "Africa/Cairo"),
    ("moscow", "Europe/Moscow"),
    ("saopaulo", "America/Sao_Paulo"),
    ("mexicocity", "America/Mexico_City"),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimezoneResolution {
    /// `from_offset` is set when the zone was picked for a GMT/UTC offset.
    Set { tz: String, from_offset: bool },
    Ambiguous(Vec<String>),
    TooBroad,
    Unknown,
}

/// Parses `GMT+6` / `utc-5` into whole hours.
fn parse_offset_hours(input: &str) -> Option<i32> {
    let lower = input.to_ascii_lowercase();
    let rest = lower
        .strip_prefix("gmt")
        .or_else(|| lower.strip_prefix("utc"))?;
    let (sign, digits) = match rest.chars().next()? {
        '+' => (1, &rest[1..]),
        '-' => (-1, &rest[1..]),
        _ => return None,
    };
    if digits.is_empty() || digits.len() > 2 || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    digits.parse::<i32>().ok().map(|h| sign * h)
}

fn zone_with_current_offset(hours: i32) -> Option<&'static Tz> {
    let now = Utc::now();
    TZ_VARIANTS
        .iter()
        .find(|tz| now.with_timezone(*tz).offset().fix().local_minus_utc() == hours * 3600)
}

fn common_zone(key: &str) -> Option<&'static str> {
    COMMON_ZONES
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, zone)| *zone)
}

/// Resolves free-form user input to an IANA zone name.
pub fn resolve_timezone(input: &str) -> TimezoneResolution {
    let input = input.trim();
    if input.is_empty() {
        return TimezoneResolution::Unknown;
    }

    if let Some(hours) = parse_offset_hours(input) {
        if let Some(tz) = zone_with_current_offset(hours) {
            return TimezoneResolution::Set {
                tz: tz.name().to_string(),
                from_offset: true,
            };
        }
    }

    let lower = input.to_lowercase();
    let compact: String = lower.split_whitespace().collect();
    if let Some(zone) = common_zone(&lower).or_else(|| common_zone(&compact)) {
        return TimezoneResolution::Set {
            tz: zone.to_string(),
            from_offset: false,
        };
    }

    if let Some(tz) = TZ_VARIANTS
        .iter()
        .find(|tz| tz.name().eq_ignore_ascii_case(input))
    {
        return TimezoneResolution::Set {
            tz: tz.name().to_string(),
            from_offset: false,
        };
    }

    let matches: Vec<String> = TZ_VARIANTS
        .iter()
        .map(|tz| tz.name())
        .filter(|name| name.to_lowercase().contains(&lower))
        .map(str::to_string)
        .collect();

    match matches.len() {
        0 => TimezoneResolution::Unknown,
        1 => TimezoneResolution::Set {
            tz: matches[0].clone(),
            from_offset: false,
        },
        n if n <= MAX_CANDIDATES => TimezoneResolution::Ambiguous(matches),
        _ => TimezoneResolution::TooBroad,
    }
}

pub struct TimezoneCommand;

impl TimezoneCommand {
    async fn save(ctx: &InvocationContext, tz: &str, input: &str, from_offset: bool) {
        let update = UserRecord::custom_update(&ctx.sender_id, "timezone", Value::from(tz));
        let text = match ctx.users().save_user(&ctx.sender_id, update).await {
            Ok(_) => {
                info!(sender_id = %ctx.sender_id, timezone = %tz, "Timezone set");
                if from_offset {
                    format!(
                        "Your timezone has been set to {} (based on your {} input). Moment messages will now be sent based on this timezone.",
                        tz, input
                    )
                } else {
                    format!(
                        "Your timezone has been set to {}. Moment messages will now be sent based on this timezone.",
                        tz
                    )
                }
            }
            Err(e) => {
                error!(error = %e, sender_id = %ctx.sender_id, "Saving timezone failed");
                "There was an error saving your timezone. Please try again later.".to_string()
            }
        };
        ctx.reply_final(&text).await;
    }

    fn candidates(captured: &Map<String, Value>) -> Vec<String> {
        captured
            .get("candidates")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[async_trait]
impl Command for TimezoneCommand {
    async fn call(&self, ctx: &InvocationContext) -> Result<()> {
        let input = ctx.args.join(" ");
        if input.trim().is_empty() {
            let p = &ctx.prefix;
            ctx.reply_final(&format!(
                "Please provide a timezone. Examples: {p}timezone Asia/Dhaka, {p}timezone London, {p}timezone GMT+6, or {p}timezone PST."
            ))
            .await;
            return Ok(());
        }

        match resolve_timezone(&input) {
            TimezoneResolution::Set { tz, from_offset } => {
                Self::save(ctx, &tz, &input, from_offset).await;
            }
            TimezoneResolution::Ambiguous(candidates) => {
                let list = candidates
                    .iter()
                    .enumerate()
                    .map(|(i, name)| format!("{}. {}", i + 1, name))
                    .collect::<Vec<_>>()
                    .join("\n");
                let mut captured = Map::new();
                captured.insert("candidates".to_string(), json!(candidates));
                ctx.reply_expecting(
                    &format!(
                        "Did you mean one of these? Reply to this message with a number, or use the exact name:\n{}\n\nOr provide a GMT/UTC offset (e.g., GMT+6).",
                        list
                    ),
                    captured,
                )
                .await;
            }
            TimezoneResolution::TooBroad => {
                ctx.reply_final(&format!(
                    "Your input '{}' is too broad and matches too many timezones. Please be more specific (e.g., Asia/Dhaka, Europe/London, or a major city name). You can find a list here: {}",
                    input, TZ_LIST_URL
                ))
                .await;
            }
            TimezoneResolution::Unknown => {
                ctx.reply_final(&format!(
                    "I couldn't recognize '{}' as a valid timezone. Please try:\n- A full IANA timezone name (e.g., Asia/Dhaka, Europe/London)\n- A GMT/UTC offset (e.g., GMT+6, UTC-5)\n- A common city or country name, or abbreviation (e.g., Dhaka, London, India, PST)\n\nYou can find a list of IANA timezones here: {}",
                    input, TZ_LIST_URL
                ))
                .await;
            }
        }
        Ok(())
    }

    fn supports_reply(&self) -> bool {
        true
    }

    async fn on_reply(&self, ctx: &InvocationContext) -> Result<()> {
        let candidates = Self::candidates(&ctx.captured);
        if candidates.is_empty() {
            ctx.reply_final(&prefix_notice(&ctx.prefix)).await;
            return Ok(());
        }
        let answer = ctx
            .reply_message
            .as_ref()
            .and_then(|m| m.text())
            .unwrap_or("")
            .trim()
            .to_string();

        let picked = answer
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|i| candidates.get(i))
            .or_else(|| candidates.iter().find(|c| c.eq_ignore_ascii_case(&answer)))
            .cloned();

        match picked {
            Some(tz) => Self::save(ctx, &tz, &answer, false).await,
            None => {
                ctx.reply(&format!(
                    "Please reply with a number between 1 and {}.",
                    candidates.len()
                ))
                .await;
            }
        }
        Ok(())
    }
}
