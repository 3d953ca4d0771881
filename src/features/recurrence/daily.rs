//! Daily role ping
//!
//! DMs every holder of a configured role at a fixed local time. Unlike the
//! polled weekly triggers this is a self-rescheduling one-shot: sleep until
//! the next occurrence, dispatch, recompute, sleep again. The required
//! precision is an exact wall-clock minute, not "sometime this hour".
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.5.0

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;
use log::{debug, info, warn};
use serenity::model::id::UserId;
use std::collections::HashSet;
use std::sync::Arc;

use crate::core::config::Config;
use crate::core::format::format_local;
use crate::gateway::{ChatGateway, MentionAllowList};

pub struct DailyRolePing {
    gateway: Arc<dyn ChatGateway>,
    zone: Tz,
    role_name: String,
    hour: u32,
    minute: u32,
    message: String,
}

impl DailyRolePing {
    pub fn new(gateway: Arc<dyn ChatGateway>, config: &Config) -> Self {
        DailyRolePing {
            gateway,
            zone: config.timezone,
            role_name: config.daily_ping_role.clone(),
            hour: config.daily_ping_hour,
            minute: config.daily_ping_minute,
            message: config.daily_ping_message.clone(),
        }
    }

    /// Next instant the local clock reads `hour:minute` - today if still
    /// ahead, otherwise tomorrow.
    pub fn next_occurrence(now: DateTime<Tz>, hour: u32, minute: u32) -> DateTime<Tz> {
        let zone = now.timezone();
        let at_time = |date: NaiveDate| {
            date.and_hms_opt(hour, minute, 0)
                .and_then(|naive| zone.from_local_datetime(&naive).earliest())
        };

        if let Some(today) = at_time(now.date_naive()) {
            if today > now {
                return today;
            }
        }
        at_time(now.date_naive() + Duration::days(1)).unwrap_or(now + Duration::days(1))
    }

    pub async fn run(self) {
        info!(
            "Daily role ping armed for {:02}:{:02} ({}) targeting role '{}'",
            self.hour, self.minute, self.zone, self.role_name
        );

        loop {
            let now = Utc::now().with_timezone(&self.zone);
            let next = Self::next_occurrence(now, self.hour, self.minute);
            let wait = (next - now).to_std().unwrap_or_default();
            debug!("Next daily ping at {next}");

            tokio::time::sleep(wait).await;
            self.dispatch().await;
        }
    }

    /// One firing: find the role in every guild, dedupe holders across
    /// guilds, DM each one, and summarize to the audit channel.
    async fn dispatch(&self) {
        let roles = self.gateway.roles_named(&self.role_name).await;

        let mut recipients = Vec::new();
        let mut seen: HashSet<UserId> = HashSet::new();
        let mut targeted = Vec::new();
        for (guild, role) in &roles {
            targeted.push(format!("{} ({})", role.name, guild));
            for member in self.gateway.role_members(*guild, role.id).await {
                if seen.insert(member.id) {
                    recipients.push(member);
                }
            }
        }

        let mut reached = 0usize;
        let mut failures = 0usize;
        for recipient in &recipients {
            match self
                .gateway
                .send_direct_message(recipient.id, &self.message)
                .await
            {
                Ok(()) => reached += 1,
                Err(e) => {
                    warn!("Failed to DM daily ping recipient {}: {e}", recipient.id);
                    failures += 1;
                }
            }
        }

        let mut lines = vec![
            "Daily reminder has been sent".to_string(),
            if targeted.is_empty() {
                format!("• Target role: \"{}\" not found", self.role_name)
            } else {
                format!("• Target role: {}", targeted.join(", "))
            },
            format!("• Scheduled at: {}", format_local(Utc::now(), self.zone)),
            format!("• Recipients reached: {reached}/{}", recipients.len()),
        ];
        if failures > 0 {
            lines.push(format!("• DM failures: {failures}"));
        }

        self.gateway
            .emit_audit_entry(&lines.join("\n"), &MentionAllowList::none())
            .await;
    }
}
