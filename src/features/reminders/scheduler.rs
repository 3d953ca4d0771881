//! Due-reminder sweep
//!
//! A fixed-interval tick walks the queue for records whose due time has
//! arrived, delivers each one to completion, and stamps it terminal - even
//! when delivery failed. One attempt per record, no retries.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.4.0

use chrono::{DateTime, Utc};
use log::{debug, info};
use std::sync::Arc;
use std::time::Duration;

use super::delivery::DeliveryEngine;
use super::store::ReminderStore;

/// Sweep cadence. Coarse on purpose: due times are minute-granular.
pub const SWEEP_INTERVAL: Duration = Duration::from_secs(30);

pub struct ReminderScheduler {
    store: Arc<ReminderStore>,
    engine: DeliveryEngine,
}

impl ReminderScheduler {
    pub fn new(store: Arc<ReminderStore>, engine: DeliveryEngine) -> Self {
        ReminderScheduler { store, engine }
    }

    /// Background loop. Ticks never overlap: the next tick is not taken
    /// until the previous sweep finished its synchronous work.
    pub async fn run(self) {
        let mut ticker = tokio::time::interval(SWEEP_INTERVAL);
        info!(
            "Reminder sweep started (interval: {}s)",
            SWEEP_INTERVAL.as_secs()
        );

        loop {
            ticker.tick().await;
            let delivered = self.sweep(Utc::now()).await;
            if delivered > 0 {
                debug!("Sweep delivered {delivered} reminder(s)");
            }
        }
    }

    /// One pass over the queue. Holds the store lock for the whole pass so
    /// cancellations serialize against it; each due record is processed in
    /// isolation and stamped immediately after its delivery attempt.
    pub async fn sweep(&self, now: DateTime<Utc>) -> usize {
        let mut records = self.store.lock().await;
        let mut delivered = 0;

        for index in 0..records.len() {
            if !records[index].is_pending() || records[index].due_at > now {
                continue;
            }

            let snapshot = records[index].clone();
            let outcome = self.engine.deliver(&snapshot).await;

            let record = &mut records[index];
            record.sent_at = Some(Utc::now());
            record.outcome = Some(outcome);
            delivered += 1;
        }

        delivered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::audience::{Audience, AudienceKind};
    use crate::features::reminders::delivery::DeliveryOutcome;
    use crate::gateway::mock::MockGateway;
    use chrono::{Duration as ChronoDuration, TimeZone};
    use serenity::model::id::{ChannelId, UserId};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 1, 10, 0, 0).unwrap()
    }

    fn user_audience(id: u64) -> Audience {
        Audience {
            kind: AudienceKind::User,
            subject: Some(id),
            guild_id: None,
            display_label: format!("<@{id}>"),
            audit_label: format!("<@{id}>"),
        }
    }

    async fn scheduler_with(
        gateway: Arc<MockGateway>,
        due_offsets_minutes: &[i64],
    ) -> (ReminderScheduler, Arc<ReminderStore>) {
        let store = Arc::new(ReminderStore::new());
        for (i, offset) in due_offsets_minutes.iter().enumerate() {
            store
                .enqueue(
                    user_audience(40 + i as u64),
                    format!("note {i}"),
                    now() + ChronoDuration::minutes(*offset),
                    ChannelId(900),
                    UserId(11),
                    false,
                    now() - ChronoDuration::hours(1),
                )
                .await;
        }
        let engine = DeliveryEngine::new(gateway, chrono_tz::Asia::Kolkata);
        (ReminderScheduler::new(store.clone(), engine), store)
    }

    #[tokio::test]
    async fn test_sweep_delivers_only_due_records() {
        let gateway = Arc::new(
            MockGateway::new()
                .with_member(40, "a#1")
                .with_member(41, "b#2"),
        );
        // One due 5 minutes ago, one due in an hour.
        let (scheduler, store) = scheduler_with(gateway.clone(), &[-5, 60]).await;

        let delivered = scheduler.sweep(now()).await;

        assert_eq!(delivered, 1);
        assert_eq!(gateway.dm_count(), 1);
        assert_eq!(store.pending_count().await, 1);
    }

    #[tokio::test]
    async fn test_sweep_is_at_most_once() {
        let gateway = Arc::new(MockGateway::new().with_member(40, "a#1"));
        let (scheduler, _store) = scheduler_with(gateway.clone(), &[-5]).await;

        assert_eq!(scheduler.sweep(now()).await, 1);
        // Repeated ticks never re-deliver a stamped record.
        assert_eq!(scheduler.sweep(now()).await, 0);
        assert_eq!(scheduler.sweep(now() + ChronoDuration::hours(2)).await, 0);
        assert_eq!(gateway.dm_count(), 1);
    }

    #[tokio::test]
    async fn test_failed_delivery_still_stamps_the_record() {
        // Unknown member and no roster: delivery fails outright.
        let gateway = Arc::new(MockGateway::new().failing_channel(900));
        let (scheduler, store) = scheduler_with(gateway.clone(), &[-5]).await;

        assert_eq!(scheduler.sweep(now()).await, 1);
        assert_eq!(store.pending_count().await, 0);

        let records = store.lock().await;
        assert_eq!(records[0].outcome, Some(DeliveryOutcome::FailedDelivery));
        assert!(records[0].sent_at.is_some());

        drop(records);
        // And it is never retried.
        assert_eq!(scheduler.sweep(now()).await, 0);
    }

    #[tokio::test]
    async fn test_one_failure_does_not_block_other_due_records() {
        let gateway = Arc::new(MockGateway::new().with_member(41, "b#2").failing_channel(900));
        // Record for user 40 has no directory entry and fails; user 41 works.
        let (scheduler, store) = scheduler_with(gateway.clone(), &[-10, -5]).await;

        assert_eq!(scheduler.sweep(now()).await, 2);
        assert_eq!(gateway.dm_count(), 1);

        let records = store.lock().await;
        assert_eq!(records[0].outcome, Some(DeliveryOutcome::FailedDelivery));
        assert_eq!(records[1].outcome, Some(DeliveryOutcome::Delivered));
    }
}
