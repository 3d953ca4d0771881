//! Server pulse command
//!
//! On-demand snapshot of tracked activity plus the operations queue: open
//! assignments, pending reminders, and whatever fires next.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.5.0

use anyhow::Result;
use chrono::{Duration, Utc};
use serenity::model::channel::Message;
use serenity::prelude::Context;

use super::admin::describe_audience;
use super::BotContext;
use crate::core::format::{format_local, relative_time};

/// Channels silent this long count as quiet spots.
const QUIET_THRESHOLD_DAYS: i64 = 3;

pub async fn handle(ctx: &BotContext, sctx: &Context, msg: &Message) -> Result<bool> {
    if ctx.activity.is_empty() {
        msg.reply(&sctx.http, "I'm still watching the room - no stats yet.")
            .await?;
        return Ok(true);
    }

    let now = Utc::now();
    let day = Duration::days(1);

    let total_messages = ctx.activity.total_messages();
    let channel_count = ctx.activity.channel_count();
    let recent_channels = ctx.activity.recent_channel_count(now, day);
    let avg_per_channel = if channel_count > 0 {
        (total_messages as f64 / channel_count as f64 * 10.0).round() / 10.0
    } else {
        0.0
    };

    let summary = [
        format!("Total tracked messages: **{total_messages}**"),
        format!(
            "Active contributors: **{}**",
            ctx.activity.contributor_count()
        ),
        format!("Channels active (24h): **{recent_channels}/{channel_count}**"),
        format!("Avg msgs per channel: **{avg_per_channel}**"),
        format!("Snapshot: {}", format_local(now, ctx.config.timezone)),
    ]
    .join("\n");

    let top_channels = ctx
        .activity
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
    let top_channels = if top_channels.is_empty() {
        "Not enough channel activity captured yet.".to_string()
    } else {
        top_channels
    };

    let top_members = ctx
        .activity
        .top_members(5)
        .into_iter()
        .enumerate()
        .map(|(index, (_, entry))| {
            let channel_label = ctx
                .activity
                .channel_name(entry.last_channel)
                .map(|name| format!("#{name}"))
                .unwrap_or_else(|| "unknown channel".to_string());
            format!(
                "{}. @{}: {} msgs (last seen {} in {})",
                index + 1,
                entry.tag,
                entry.count,
                relative_time(entry.updated_at, now),
                channel_label
            )
        })
        .collect::<Vec<_>>()
        .join("\n");
    let top_members = if top_members.is_empty() {
        "Not enough member activity captured yet.".to_string()
    } else {
        top_members
    };

    let quiet = ctx
        .activity
        .quiet_channels(now, Duration::days(QUIET_THRESHOLD_DAYS), 3)
        .into_iter()
        .map(|(_, entry)| {
            format!(
                "#{} – last spark {}",
                entry.name,
                relative_time(entry.updated_at, now)
            )
        })
        .collect::<Vec<_>>()
        .join("\n");
    let quiet = if quiet.is_empty() {
        "All tracked channels have recent activity.".to_string()
    } else {
        quiet
    };

    let pending = ctx.store.pending().await;
    let due_soon = pending
        .iter()
        .filter(|record| record.due_at - now <= day)
        .count();
    let next_label = pending
        .first()
        .map(|record| {
            format!(
                "{} for {}",
                format_local(record.due_at, ctx.config.timezone),
                describe_audience(&record.audience, &ctx.activity)
            )
        })
        .unwrap_or_else(|| "None queued".to_string());

    let operations = [
        format!("Open assignments: **{}**", ctx.tasks.open_count()),
        format!("Pending reminders (<24h): **{due_soon}**"),
        format!("Next reminder: {next_label}"),
    ]
    .join("\n");

    msg.channel_id
        .send_message(&sctx.http, |m| {
            m.reference_message(msg).embed(|e| {
                e.title("Server Pulse")
                    .color(0x00b894)
                    .description(summary)
                    .field("Top Channels", top_channels, false)
                    .field("Top Contributors", top_members, false)
                    .field("Quiet Spots", quiet, false)
                    .field("Operations Snapshot", operations, false)
            })
        })
        .await?;

    Ok(true)
}
