//! # Scheduled moment messages
//!
//! Three cron schedules (morning, night, random) evaluated in the process default timezone. Each
//! firing sweeps every stored user and sends one message drawn from the pool matching the user's
//! local hour. Sends go straight to the [`Messenger`]; they never touch the dispatcher or the
//! correlation store.

use anyhow::{Context, Result};
use chrono::{DateTime, Timelike, Utc};
use chrono_tz::Tz;
use cron::Schedule;
use futures::{stream, StreamExt};
use mbot_core::{Messenger, OutboundPayload, UserRecord};
use rand::seq::SliceRandom;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use storage::UserStore;
use tracing::{info, instrument, warn};

pub const MORNING_MESSAGES: &[&str] = &[
    "Good morning, sunshine! ☀️ Hope you have a day as amazing as you are!",
    "Rise and shine! The world is waiting for your awesomeness. ☕",
    "A brand new day is here! Make it count. Good morning! ✨",
    "Wakey, wakey, eggs and bakey! Just kidding, but seriously, have a great morning! 😄",
    "Sending you good vibes for a productive and joyful morning! 😊",
];

pub const NIGHT_MESSAGES: &[&str] = &[
    "Good night, sleep tight, don't let the bed bugs bite! 😴",
    "Time to recharge. May your dreams be sweet and peaceful. 🌙",
    "Wishing you a night filled with calm and restful sleep. 🛌",
    "The stars are out, and so should you be... sleeping! Good night! ✨",
    "May your evening be relaxing and your sleep be deep. Good night!",
];

pub const RANDOM_MESSAGES: &[&str] = &[
    "Just popping in to say hi and wish you a fantastic day! 😊",
    "Sending good vibes and positive energy your way! ✨",
    "Hope you're having an absolutely wonderful day! Keep shining!",
    "You're doing great! Keep up the amazing work. 👍",
    "Remember to take a moment for yourself today and relax. 🧘‍♀️",
    "A little message to brighten your day! You got this! 🌟",
    "Thinking of you and sending a smile! 😄",
    "Don't forget to stay hydrated! 💧",
    "You're awesome! Just a friendly reminder. 💪",
    "Hope your day is as sweet as you are! 🍬",
];

/// Which schedule fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MomentKind {
    Morning,
    Night,
    Random,
}

impl MomentKind {
    pub const ALL: [MomentKind; 3] = [MomentKind::Morning, MomentKind::Night, MomentKind::Random];

    /// Six-field cron expression (seconds first).
    pub fn cron_expr(self) -> &'static str {
        match self {
            MomentKind::Morning => "0 0 8 * * *",
            MomentKind::Night => "0 0 22 * * *",
            MomentKind::Random => "0 0 */3 * * *",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MomentKind::Morning => "morning",
            MomentKind::Night => "night",
            MomentKind::Random => "random",
        }
    }
}

impl fmt::Display for MomentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MomentKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "morning" => Ok(MomentKind::Morning),
            "night" => Ok(MomentKind::Night),
            "random" => Ok(MomentKind::Random),
            other => anyhow::bail!("Unknown moment kind: {} (expected morning, night or random)", other),
        }
    }
}

/// Message pool, chosen from the recipient's local hour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bucket {
    Morning,
    Night,
    Random,
}

impl Bucket {
    /// 05–11 morning, 20–04 night, otherwise random.
    pub fn for_hour(hour: u32) -> Self {
        match hour {
            5..=11 => Bucket::Morning,
            h if h >= 20 || h < 5 => Bucket::Night,
            _ => Bucket::Random,
        }
    }

    pub fn pool(self) -> &'static [&'static str] {
        match self {
            Bucket::Morning => MORNING_MESSAGES,
            Bucket::Night => NIGHT_MESSAGES,
            Bucket::Random => RANDOM_MESSAGES,
        }
    }

    pub fn pick(self) -> &'static str {
        self.pool()
            .choose(&mut rand::thread_rng())
            .copied()
            .unwrap_or_default()
    }
}

/// Local hours (09:00–19:59) during which the random schedule sends.
pub fn is_active_hour(hour: u32) -> bool {
    (9..20).contains(&hour)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub sent: usize,
    pub skipped: usize,
    pub failed: usize,
}

pub struct MomentScheduler {
    users: Arc<dyn UserStore>,
    messenger: Arc<dyn Messenger>,
    default_tz: Tz,
    concurrency: usize,
}

impl MomentScheduler {
    pub fn new(
        users: Arc<dyn UserStore>,
        messenger: Arc<dyn Messenger>,
        default_tz: Tz,
        concurrency: usize,
    ) -> Self {
        Self {
            users,
            messenger,
            default_tz,
            concurrency: concurrency.max(1),
        }
    }

    /// The user's `custom.timezone` when it names a known zone, else the default.
    pub fn user_tz(&self, user: &UserRecord) -> Tz {
        user.custom_timezone()
            .and_then(|name| name.parse::<Tz>().ok())
            .unwrap_or(self.default_tz)
    }

    /// Bucket to send from for `user` at `now`; `None` to skip them.
    pub fn plan(&self, kind: MomentKind, user: &UserRecord, now: DateTime<Utc>) -> Option<Bucket> {
        if user.psid.is_empty() {
            return None;
        }
        let hour = now.with_timezone(&self.user_tz(user)).hour();
        if kind == MomentKind::Random && !is_active_hour(hour) {
            return None;
        }
        Some(Bucket::for_hour(hour))
    }

    /// Sends one moment message to every eligible user.
    #[instrument(skip(self))]
    pub async fn sweep(&self, kind: MomentKind, now: DateTime<Utc>) -> Result<SweepReport> {
        let users = self
            .users
            .get_all_users()
            .await
            .context("Failed to load users for moment sweep")?;

        let mut report = SweepReport::default();
        let mut sends = Vec::new();
        for user in users {
            match self.plan(kind, &user, now) {
                Some(bucket) => sends.push((user.psid, bucket, bucket.pick().to_string())),
                None => report.skipped += 1,
            }
        }
        info!(kind = %kind, recipients = sends.len(), skipped = report.skipped, "step: moment sweep started");

        let mut in_flight = stream::iter(sends.into_iter().map(|(psid, bucket, text)| {
            let messenger = Arc::clone(&self.messenger);
            async move {
                let result = messenger.send(&psid, &OutboundPayload::text(text)).await;
                (psid, bucket, result)
            }
        }))
        .buffer_unordered(self.concurrency);

        while let Some((psid, bucket, result)) = in_flight.next().await {
            match result {
                Ok(_) => {
                    info!(psid = %psid, bucket = ?bucket, "Moment message sent");
                    report.sent += 1;
                }
                Err(e) => {
                    warn!(error = %e, psid = %psid, "Moment message failed");
                    report.failed += 1;
                }
            }
        }

        info!(
            kind = %kind,
            sent = report.sent,
            skipped = report.skipped,
            failed = report.failed,
            "step: moment sweep complete"
        );
        Ok(report)
    }

    /// Next firing strictly after `now` and every kind due at that instant.
    pub fn next_firing(
        &self,
        schedules: &[(MomentKind, Schedule)],
        now: DateTime<Utc>,
    ) -> Option<(DateTime<Utc>, Vec<MomentKind>)> {
        let local = now.with_timezone(&self.default_tz);
        let upcoming: Vec<(MomentKind, DateTime<Utc>)> = schedules
            .iter()
            .filter_map(|(kind, schedule)| {
                schedule
                    .after(&local)
                    .next()
                    .map(|at| (*kind, at.with_timezone(&Utc)))
            })
            .collect();
        let earliest = upcoming.iter().map(|(_, at)| *at).min()?;
        let due = upcoming
            .into_iter()
            .filter(|(_, at)| *at == earliest)
            .map(|(kind, _)| kind)
            .collect();
        Some((earliest, due))
    }

    /// Runs the three schedules until the task is dropped.
    pub async fn run(self: Arc<Self>) -> Result<()> {
        let schedules = MomentKind::ALL
            .iter()
            .map(|kind| {
                Schedule::from_str(kind.cron_expr())
                    .map(|schedule| (*kind, schedule))
                    .with_context(|| format!("Invalid cron expression for {} moments", kind))
            })
            .collect::<Result<Vec<_>>>()?;
        info!(timezone = %self.default_tz, "step: moment scheduler started");

        loop {
            let now = Utc::now();
            let Some((at, due)) = self.next_firing(&schedules, now) else {
                anyhow::bail!("Moment schedules have no upcoming firing");
            };
            let wait = (at - now).to_std().unwrap_or_default();
            tokio::time::sleep(wait).await;

            for kind in due {
                if let Err(e) = self.sweep(kind, Utc::now()).await {
                    warn!(error = %e, kind = %kind, "Moment sweep failed");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bucket_boundaries() {
        assert_eq!(Bucket::for_hour(4), Bucket::Night);
        assert_eq!(Bucket::for_hour(5), Bucket::Morning);
        assert_eq!(Bucket::for_hour(11), Bucket::Morning);
        assert_eq!(Bucket::for_hour(12), Bucket::Random);
        assert_eq!(Bucket::for_hour(19), Bucket::Random);
        assert_eq!(Bucket::for_hour(20), Bucket::Night);
        assert_eq!(Bucket::for_hour(0), Bucket::Night);
    }

    #[test]
    fn test_active_hours() {
        assert!(!is_active_hour(8));
        assert!(is_active_hour(9));
        assert!(is_active_hour(19));
        assert!(!is_active_hour(20));
    }

    #[test]
    fn test_cron_expressions_parse() {
        for kind in MomentKind::ALL {
            assert!(Schedule::from_str(kind.cron_expr()).is_ok(), "{}", kind);
        }
    }

    #[test]
    fn test_kind_from_str() {
        assert_eq!("Morning".parse::<MomentKind>().unwrap(), MomentKind::Morning);
        assert!("noon".parse::<MomentKind>().is_err());
    }

    #[test]
    fn test_picked_message_belongs_to_pool() {
        for bucket in [Bucket::Morning, Bucket::Night, Bucket::Random] {
            assert!(bucket.pool().contains(&bucket.pick()));
        }
    }
}
