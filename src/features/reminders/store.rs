//! In-memory reminder queue
//!
//! Records live in one mutex-guarded vector. The sweep holds the lock for a
//! whole tick, so a cancellation can never interleave with a record that is
//! mid-delivery.
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.1.0

use chrono::{DateTime, Utc};
use serenity::model::id::{ChannelId, UserId};
use tokio::sync::{Mutex, MutexGuard};

use super::delivery::DeliveryOutcome;
use crate::features::audience::Audience;

/// One queued notification. Pending until `sent_at` is stamped, after which
/// the record is terminal and never touched again.
#[derive(Debug, Clone)]
pub struct ReminderRecord {
    pub id: String,
    pub audience: Audience,
    pub note: String,
    pub origin_channel: ChannelId,
    pub requested_by: UserId,
    pub created_at: DateTime<Utc>,
    pub due_at: DateTime<Utc>,
    pub sent_at: Option<DateTime<Utc>>,
    pub outcome: Option<DeliveryOutcome>,
    pub time_was_defaulted: bool,
}

impl ReminderRecord {
    pub fn is_pending(&self) -> bool {
        self.sent_at.is_none()
    }
}

#[derive(Default)]
pub struct ReminderStore {
    records: Mutex<Vec<ReminderRecord>>,
}

impl ReminderStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a new reminder and return its id.
    #[allow(clippy::too_many_arguments)]
    pub async fn enqueue(
        &self,
        audience: Audience,
        note: String,
        due_at: DateTime<Utc>,
        origin_channel: ChannelId,
        requested_by: UserId,
        time_was_defaulted: bool,
        now: DateTime<Utc>,
    ) -> String {
        let id = format!(
            "{}-{}",
            now.timestamp_millis(),
            audience.subject.unwrap_or_default()
        );
        let record = ReminderRecord {
            id: id.clone(),
            audience,
            note,
            origin_channel,
            requested_by,
            created_at: now,
            due_at,
            sent_at: None,
            outcome: None,
            time_was_defaulted,
        };
        self.records.lock().await.push(record);
        id
    }

    /// Pending records sorted by due time, soonest first.
    pub async fn pending(&self) -> Vec<ReminderRecord> {
        let records = self.records.lock().await;
        let mut pending: Vec<ReminderRecord> = records
            .iter()
            .filter(|record| record.is_pending())
            .cloned()
            .collect();
        pending.sort_by_key(|record| record.due_at);
        pending
    }

    pub async fn pending_count(&self) -> usize {
        self.records
            .lock()
            .await
            .iter()
            .filter(|record| record.is_pending())
            .count()
    }

    /// Remove a pending record addressed either by its 1-based position in
    /// the due-sorted listing (optionally prefixed with `#`) or by its id.
    /// Returns the removed record, or `None` when nothing matched.
    pub async fn cancel(&self, token: &str) -> Option<ReminderRecord> {
        let mut records = self.records.lock().await;
        let stripped = token.strip_prefix('#').unwrap_or(token);

        let target_id = {
            let mut pending: Vec<&ReminderRecord> =
                records.iter().filter(|record| record.is_pending()).collect();
            pending.sort_by_key(|record| record.due_at);

            let by_index = if !stripped.is_empty()
                && stripped.chars().all(|c| c.is_ascii_digit())
            {
                stripped
                    .parse::<usize>()
                    .ok()
                    .filter(|index| *index >= 1)
                    .and_then(|index| pending.get(index - 1))
                    .map(|record| record.id.clone())
            } else {
                None
            };

            by_index.or_else(|| {
                pending
                    .iter()
                    .find(|record| record.id == token || record.id == stripped)
                    .map(|record| record.id.clone())
            })
        }?;

        let position = records
            .iter()
            .position(|record| record.id == target_id && record.is_pending())?;
        Some(records.remove(position))
    }

    /// Exclusive access for the sweep. Held across delivery on purpose: the
    /// queue must not change under a tick in flight.
    pub(crate) async fn lock(&self) -> MutexGuard<'_, Vec<ReminderRecord>> {
        self.records.lock().await
    }
}
