//! Weekly triggers and reports
//!
//! A weekly trigger fires when the local weekday and hour both match its
//! target. The poll runs every 15 minutes, so several ticks land inside the
//! qualifying hour; a debounce just under seven days keeps the trigger from
//! firing more than once per week while tolerating that granularity.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.5.0

use chrono::{DateTime, Datelike, Duration, Timelike, Utc, Weekday};
use chrono_tz::Tz;
use log::{error, info};
use serenity::model::id::ChannelId;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration as StdDuration;

use crate::core::format::{format_local, relative_time};
use crate::features::activity::ActivityLog;
use crate::features::tasks::{TaskBoard, TaskRecord};
use crate::gateway::{ChatGateway, MentionAllowList};

/// Poll cadence for both weekly triggers.
pub const REPORT_TICK_INTERVAL: StdDuration = StdDuration::from_secs(15 * 60);

/// Just under seven days, so next week's qualifying hour is always eligible.
const MIN_FIRE_INTERVAL_HOURS: i64 = 156;

/// Local-clock weekly firing rule with a debounce.
#[derive(Debug, Clone)]
pub struct WeeklyTrigger {
    target_weekday: Weekday,
    target_hour: u32,
    min_interval: Duration,
    last_fired_at: Option<DateTime<Utc>>,
}

impl WeeklyTrigger {
    pub fn new(target_weekday: Weekday, target_hour: u32) -> Self {
        WeeklyTrigger {
            target_weekday,
            target_hour,
            min_interval: Duration::hours(MIN_FIRE_INTERVAL_HOURS),
            last_fired_at: None,
        }
    }

    /// Whether a tick at `now_local` should fire. The hour-equality test plus
    /// the debounce makes every qualifying hour fire exactly once no matter
    /// how many ticks land inside it.
    pub fn is_due(&self, now_local: DateTime<Tz>) -> bool {
        if now_local.weekday() != self.target_weekday || now_local.hour() != self.target_hour {
            return false;
        }
        match self.last_fired_at {
            None => true,
            Some(last) => now_local.with_timezone(&Utc) - last >= self.min_interval,
        }
    }

    pub fn mark_fired(&mut self, now: DateTime<Utc>) {
        self.last_fired_at = Some(now);
    }
}

/// Runs both weekly reports on one shared poll.
pub struct WeeklyReports {
    gateway: Arc<dyn ChatGateway>,
    tasks: Arc<TaskBoard>,
    activity: Arc<ActivityLog>,
    zone: Tz,
    moderator_channel: Option<ChannelId>,
    digest: WeeklyTrigger,
    stats: WeeklyTrigger,
}

impl WeeklyReports {
    pub fn new(
        gateway: Arc<dyn ChatGateway>,
        tasks: Arc<TaskBoard>,
        activity: Arc<ActivityLog>,
        zone: Tz,
        moderator_channel: Option<ChannelId>,
    ) -> Self {
        WeeklyReports {
            gateway,
            tasks,
            activity,
            zone,
            moderator_channel,
            // Digest lands Sunday 14:00 local, stats report Sunday 18:00.
            digest: WeeklyTrigger::new(Weekday::Sun, 14),
            stats: WeeklyTrigger::new(Weekday::Sun, 18),
        }
    }

    /// Background loop driving both triggers.
    pub async fn run(mut self) {
        let mut ticker = tokio::time::interval(REPORT_TICK_INTERVAL);
        info!(
            "Weekly report poll started (interval: {}m)",
            REPORT_TICK_INTERVAL.as_secs() / 60
        );

        loop {
            ticker.tick().await;
            let now = Utc::now();
            self.maybe_send_task_digest(now).await;
            self.maybe_send_stats_report(now).await;
        }
    }

    async fn maybe_send_task_digest(&mut self, now: DateTime<Utc>) {
        let Some(channel) = self.moderator_channel else {
            return;
        };
        let open = self.tasks.open();
        if open.is_empty() {
            return;
        }
        if !self.digest.is_due(now.with_timezone(&self.zone)) {
            return;
        }

        let text = render_task_digest(&open, now, self.zone);
        let assignees = open.iter().map(|task| task.assignee);
        match self
            .gateway
            .send_channel_message(channel, &text, &MentionAllowList::for_users(assignees))
            .await
        {
            Ok(()) => {
                self.gateway
                    .emit_audit_entry(
                        &format!(
                            "Weekly task digest shared\n• Total tasks: {}\n\n{text}",
                            open.len()
                        ),
                        &MentionAllowList::none(),
                    )
                    .await;
                self.digest.mark_fired(now);
            }
            // Not stamped: the next qualifying tick retries.
            Err(e) => error!("Failed to send task digest: {e}"),
        }
    }

    async fn maybe_send_stats_report(&mut self, now: DateTime<Utc>) {
        if self.activity.is_empty() {
            return;
        }
        if !self.stats.is_due(now.with_timezone(&self.zone)) {
            return;
        }

        let text = render_stats_report(&self.activity, now, self.zone);
        self.gateway
            .emit_audit_entry(&text, &MentionAllowList::none())
            .await;
        self.stats.mark_fired(now);
    }
}

/// Open tasks grouped by assignee, mention-first so the digest pings them.
fn render_task_digest(open: &[TaskRecord], now: DateTime<Utc>, zone: Tz) -> String {
    let mut grouped: BTreeMap<u64, Vec<&TaskRecord>> = BTreeMap::new();
    for task in open {
        grouped.entry(task.assignee.0).or_default().push(task);
    }

    let mut lines = vec![
        format!("Weekly task digest ({})", format_local(now, zone)),
        String::new(),
    ];
    for (assignee, tasks) in grouped {
        lines.push(format!("<@{assignee}>"));
        for task in tasks {
            let due = task
                .due_text
                .as_deref()
                .map(|d| format!(", expected by {d}"))
                .unwrap_or_default();
            lines.push(format!(
                "  • **{}** (assigned {}{due})",
                task.details,
                relative_time(task.created_at, now)
            ));
        }
    }
    lines.join("\n")
}

fn render_stats_report(activity: &ActivityLog, now: DateTime<Utc>, zone: Tz) -> String {
    let top_channels = activity
        .top_channels(5)
        .into_iter()
        .enumerate()
        .map(|(index, (_, entry))| {
            format!(
                "{}. #{}: {} msgs (last spark {})",
                index + 1,
                entry.name,
                entry.count,
                relative_time(entry.updated_at, now)
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    [
        format!("Weekend pulse ({})", format_local(now, zone)),
        format!("• Total tracked messages: {}", activity.total_messages()),
        format!("• Channels watched: {}", activity.channel_count()),
        String::new(),
        if top_channels.is_empty() {
            "No channel activity captured yet.".to_string()
        } else {
            top_channels
        },
    ]
    .join("\n")
}
