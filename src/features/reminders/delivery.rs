//! Reminder delivery engine
//!
//! Expands the audience into concrete recipients at fire time, DMs each one
//! independently, and classifies the aggregate result. A failed recipient
//! never aborts the others; a single-user audience with zero successful DMs
//! gets one retry in the originating channel.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.4.0

use chrono::Utc;
use chrono_tz::Tz;
use log::{error, warn};
use serenity::model::id::{RoleId, UserId};
use std::sync::Arc;

use super::store::ReminderRecord;
use crate::core::format::format_local;
use crate::features::audience::AudienceKind;
use crate::gateway::{ChatGateway, MentionAllowList, Recipient};

/// Terminal result of one delivery attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// Every intended recipient was reached directly.
    Delivered,
    /// Some recipients of a group audience were reached, some were not.
    PartiallyDelivered,
    /// Direct delivery failed but the originating channel rescued it.
    ChannelFallback,
    /// Nobody was reached and no fallback applied (or it failed too).
    FailedDelivery,
}

impl DeliveryOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryOutcome::Delivered => "delivered",
            DeliveryOutcome::PartiallyDelivered => "partial",
            DeliveryOutcome::ChannelFallback => "channel-fallback",
            DeliveryOutcome::FailedDelivery => "failed",
        }
    }
}

/// Collapse per-recipient accounting into one outcome. Fallback success
/// overrides everything else.
pub(crate) fn classify(total: usize, reached: usize, fallback_used: bool) -> DeliveryOutcome {
    if fallback_used {
        return DeliveryOutcome::ChannelFallback;
    }
    if total > 0 && reached == total {
        return DeliveryOutcome::Delivered;
    }
    if reached > 0 {
        return DeliveryOutcome::PartiallyDelivered;
    }
    DeliveryOutcome::FailedDelivery
}

pub struct DeliveryEngine {
    gateway: Arc<dyn ChatGateway>,
    zone: Tz,
}

impl DeliveryEngine {
    pub fn new(gateway: Arc<dyn ChatGateway>, zone: Tz) -> Self {
        DeliveryEngine { gateway, zone }
    }

    /// Deliver one due record and report what happened. Never errors: every
    /// failure path collapses into the returned outcome.
    pub async fn deliver(&self, record: &ReminderRecord) -> DeliveryOutcome {
        let text = self.render_message(record);
        let recipients = self.expand_recipients(record).await;

        let mut reached = 0usize;
        let mut failures = 0usize;
        for recipient in &recipients {
            match self
                .gateway
                .send_direct_message(recipient.id, &text)
                .await
            {
                Ok(()) => reached += 1,
                Err(e) => {
                    warn!("Failed to DM reminder recipient {}: {e}", recipient.id);
                    failures += 1;
                }
            }
        }

        let mut fallback_used = false;
        if reached == 0 && record.audience.is_single_user() {
            let mentioned = record
                .audience
                .subject
                .map(UserId)
                .into_iter()
                .chain(std::iter::once(record.requested_by));
            let allowed = MentionAllowList::for_users(mentioned);

            match self
                .gateway
                .send_channel_message(record.origin_channel, &text, &allowed)
                .await
            {
                Ok(()) => fallback_used = true,
                Err(e) => error!("Failed to post reminder to original channel: {e}"),
            }
        }

        let outcome = classify(recipients.len(), reached, fallback_used);
        self.audit(record, recipients.len(), reached, failures, fallback_used)
            .await;
        outcome
    }

    /// Recipient expansion happens here, not at scheduling time, so the
    /// roster reflects membership at the moment the reminder fires.
    async fn expand_recipients(&self, record: &ReminderRecord) -> Vec<Recipient> {
        let audience = &record.audience;
        match audience.kind {
            AudienceKind::Requester | AudienceKind::User => {
                let Some(subject) = audience.subject else {
                    return Vec::new();
                };
                self.gateway
                    .fetch_member(UserId(subject))
                    .await
                    .into_iter()
                    .collect()
            }
            AudienceKind::Everyone => {
                let Some(guild) = audience.guild_id else {
                    return Vec::new();
                };
                self.gateway.guild_members(guild).await
            }
            AudienceKind::Role => {
                let (Some(guild), Some(role)) = (audience.guild_id, audience.subject) else {
                    return Vec::new();
                };
                self.gateway.role_members(guild, RoleId(role)).await
            }
        }
    }

    fn render_message(&self, record: &ReminderRecord) -> String {
        [
            format!("Reminder checkpoint for {}", record.audience.display_label),
            format!("Note: **{}**", record.note),
            format!("Scheduled for: {}", format_local(record.due_at, self.zone)),
            format!("Requested by: <@{}>", record.requested_by),
        ]
        .join("\n")
    }

    async fn audit(
        &self,
        record: &ReminderRecord,
        total: usize,
        reached: usize,
        failures: usize,
        fallback_used: bool,
    ) {
        let delivery_label = if fallback_used {
            "Channel fallback".to_string()
        } else if total > 0 && reached == total {
            format!("Direct Messages ({reached})")
        } else if reached > 0 {
            format!("Partial delivery ({reached}/{total})")
        } else if total > 0 {
            "Direct Messages failed".to_string()
        } else {
            "No recipients".to_string()
        };

        let mut lines = vec![
            format!("Reminder delivered to {}", record.audience.audit_label),
            format!("• Note: {}", record.note),
            format!("• Scheduled for: {}", format_local(record.due_at, self.zone)),
        ];
        if record.time_was_defaulted {
            lines.push("• Time detail: Defaulted to 09:00 (no explicit time provided)".to_string());
        }
        lines.push(format!("• Delivery: {delivery_label}"));
        if total > 0 {
            lines.push(format!("• Recipients reached: {reached}/{total}"));
        }
        if failures > 0 && total > 0 {
            lines.push(format!("• DM failures: {failures}"));
        }
        if fallback_used {
            lines.push("• Fallback: Posted in original channel".to_string());
        }
        lines.push(format!("• Requested by: <@{}>", record.requested_by));
        lines.push(format!("• Original channel: <#{}>", record.origin_channel));
        lines.push(format!("• Sent at: {}", format_local(Utc::now(), self.zone)));

        let mentioned = std::iter::once(record.requested_by).chain(
            record
                .audience
                .is_single_user()
                .then(|| record.audience.subject.map(UserId))
                .flatten(),
        );
        self.gateway
            .emit_audit_entry(&lines.join("\n"), &MentionAllowList::for_users(mentioned))
            .await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::audience::{Audience, AudienceKind};
    use crate::gateway::mock::MockGateway;
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use serenity::model::id::{ChannelId, GuildId};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 1, 10, 0, 0).unwrap()
    }

    fn record_for(audience: Audience) -> ReminderRecord {
        ReminderRecord {
            id: "1735725600000-1".to_string(),
            audience,
            note: "ship release".to_string(),
            origin_channel: ChannelId(900),
            requested_by: UserId(11),
            created_at: now(),
            due_at: now() + Duration::minutes(20),
            sent_at: None,
            outcome: None,
            time_was_defaulted: false,
        }
    }

    fn single_user(id: u64) -> Audience {
        Audience {
            kind: AudienceKind::User,
            subject: Some(id),
            guild_id: Some(GuildId(500)),
            display_label: format!("<@{id}>"),
            audit_label: format!("<@{id}>"),
        }
    }

    fn role_audience(role: u64) -> Audience {
        Audience {
            kind: AudienceKind::Role,
            subject: Some(role),
            guild_id: Some(GuildId(500)),
            display_label: "crew role".to_string(),
            audit_label: "crew role".to_string(),
        }
    }

    fn everyone_audience() -> Audience {
        Audience {
            kind: AudienceKind::Everyone,
            subject: Some(500),
            guild_id: Some(GuildId(500)),
            display_label: "everyone".to_string(),
            audit_label: "everyone".to_string(),
        }
    }

    fn engine(gateway: Arc<MockGateway>) -> DeliveryEngine {
        DeliveryEngine::new(gateway, chrono_tz::Asia::Kolkata)
    }

    #[test]
    fn test_classify() {
        assert_eq!(classify(3, 3, false), DeliveryOutcome::Delivered);
        assert_eq!(classify(3, 1, false), DeliveryOutcome::PartiallyDelivered);
        assert_eq!(classify(1, 0, true), DeliveryOutcome::ChannelFallback);
        assert_eq!(classify(1, 0, false), DeliveryOutcome::FailedDelivery);
        assert_eq!(classify(0, 0, false), DeliveryOutcome::FailedDelivery);
    }

    #[tokio::test]
    async fn test_single_user_direct_delivery() {
        let gateway = Arc::new(MockGateway::new().with_member(42, "nova#1"));
        let outcome = engine(gateway.clone())
            .deliver(&record_for(single_user(42)))
            .await;

        assert_eq!(outcome, DeliveryOutcome::Delivered);
        let dms = gateway.dms.lock().unwrap();
        assert_eq!(dms.len(), 1);
        assert_eq!(dms[0].0, UserId(42));
        assert!(dms[0].1.contains("ship release"));
    }

    #[tokio::test]
    async fn test_failed_dm_falls_back_to_origin_channel() {
        let gateway = Arc::new(MockGateway::new().with_member(42, "nova#1").failing_dm(42));
        let outcome = engine(gateway.clone())
            .deliver(&record_for(single_user(42)))
            .await;

        assert_eq!(outcome, DeliveryOutcome::ChannelFallback);
        let posts = gateway.channel_posts.lock().unwrap();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].0, ChannelId(900));
        // The fallback pings exactly the subject and the requester.
        assert!(posts[0].2.users.contains(&UserId(42)));
        assert!(posts[0].2.users.contains(&UserId(11)));
    }

    #[tokio::test]
    async fn test_fallback_failure_reports_failed_delivery() {
        let gateway = Arc::new(
            MockGateway::new()
                .with_member(42, "nova#1")
                .failing_dm(42)
                .failing_channel(900),
        );
        let outcome = engine(gateway.clone())
            .deliver(&record_for(single_user(42)))
            .await;
        assert_eq!(outcome, DeliveryOutcome::FailedDelivery);
    }

    #[tokio::test]
    async fn test_role_partial_delivery_has_no_fallback() {
        let gateway = Arc::new(
            MockGateway::new()
                .with_role_roster(500, 77, &[(1, "a#1"), (2, "b#2"), (3, "c#3")])
                .failing_dm(2),
        );
        let outcome = engine(gateway.clone())
            .deliver(&record_for(role_audience(77)))
            .await;

        assert_eq!(outcome, DeliveryOutcome::PartiallyDelivered);
        assert_eq!(gateway.dm_count(), 2);
        assert!(gateway.channel_posts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_role_total_failure_has_no_fallback() {
        let gateway = Arc::new(
            MockGateway::new()
                .with_role_roster(500, 77, &[(1, "a#1"), (2, "b#2")])
                .failing_dm(1)
                .failing_dm(2),
        );
        let outcome = engine(gateway.clone())
            .deliver(&record_for(role_audience(77)))
            .await;

        assert_eq!(outcome, DeliveryOutcome::FailedDelivery);
        assert!(gateway.channel_posts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_everyone_reaches_full_roster() {
        let gateway = Arc::new(
            MockGateway::new().with_guild_roster(500, &[(1, "a#1"), (2, "b#2"), (3, "c#3")]),
        );
        let outcome = engine(gateway.clone())
            .deliver(&record_for(everyone_audience()))
            .await;

        assert_eq!(outcome, DeliveryOutcome::Delivered);
        assert_eq!(gateway.dm_count(), 3);
    }

    #[tokio::test]
    async fn test_empty_roster_is_failed_delivery() {
        let gateway = Arc::new(MockGateway::new());
        let outcome = engine(gateway.clone())
            .deliver(&record_for(role_audience(77)))
            .await;
        assert_eq!(outcome, DeliveryOutcome::FailedDelivery);
    }

    #[tokio::test]
    async fn test_every_attempt_emits_one_audit_entry() {
        let gateway = Arc::new(MockGateway::new().with_member(42, "nova#1"));
        let eng = engine(gateway.clone());
        eng.deliver(&record_for(single_user(42))).await;
        eng.deliver(&record_for(single_user(42))).await;

        let entries = gateway.audit_entries.lock().unwrap();
        assert_eq!(entries.len(), 2);
        assert!(entries[0].contains("Reminder delivered to <@42>"));
        assert!(entries[0].contains("Recipients reached: 1/1"));
    }
}
