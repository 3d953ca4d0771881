//! Moderator reminder administration
//!
//! `<name> reminders` lists the first page of pending records in due order;
//! `<name> reminders delete <index|id>` cancels one. Both are moderator-only.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.4.0

use anyhow::Result;
use chrono::Utc;
use regex::Regex;
use serenity::model::channel::Message;
use serenity::model::id::UserId;
use serenity::prelude::Context;
use std::sync::OnceLock;

use super::router::has_moderator_privileges;
use super::BotContext;
use crate::core::format::{format_local, relative_time};
use crate::features::activity::ActivityLog;
use crate::features::audience::Audience;
use crate::features::reminders::ReminderRecord;
use crate::gateway::MentionAllowList;

/// Listing page size.
const LIST_LIMIT: usize = 10;

fn delete_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\breminders?\s+delete\s+(\S+)").expect("hard-coded pattern")
    })
}

/// Prefer the member's live tag over the raw mention where we have seen them
/// speak; group audiences keep their stored label.
pub(crate) fn describe_audience(audience: &Audience, activity: &ActivityLog) -> String {
    if audience.is_single_user() {
        if let Some(tag) = audience
            .subject
            .and_then(|id| activity.member_tag(UserId(id)))
        {
            return format!("@{tag}");
        }
    }
    audience.display_label.clone()
}

fn format_listing_line(
    record: &ReminderRecord,
    index: usize,
    ctx: &BotContext,
    now: chrono::DateTime<Utc>,
) -> String {
    let audience_label = describe_audience(&record.audience, &ctx.activity);
    let default_flag = if record.time_was_defaulted {
        " (default 09:00)"
    } else {
        ""
    };
    format!(
        "[#{}] {} → {} (Due {}{}, requested by <@{}>, queued {}, id {})",
        index + 1,
        audience_label,
        record.note,
        format_local(record.due_at, ctx.config.timezone),
        default_flag,
        record.requested_by,
        relative_time(record.created_at, now),
        record.id
    )
}

pub async fn handle(
    ctx: &BotContext,
    sctx: &Context,
    msg: &Message,
    raw: &str,
) -> Result<bool> {
    if !has_moderator_privileges(sctx, msg).await {
        msg.reply(&sctx.http, "Reminder admin commands are moderator-only.")
            .await?;
        return Ok(true);
    }

    let delete_token = delete_re()
        .captures(raw)
        .map(|caps| caps[1].trim().to_string());

    let Some(token) = delete_token else {
        let pending = ctx.store.pending().await;
        if pending.is_empty() {
            msg.reply(&sctx.http, "No pending reminders right now.").await?;
            return Ok(true);
        }

        let now = Utc::now();
        let mut lines: Vec<String> = pending
            .iter()
            .take(LIST_LIMIT)
            .enumerate()
            .map(|(index, record)| format_listing_line(record, index, ctx, now))
            .collect();
        if pending.len() > LIST_LIMIT {
            lines.push(format!(
                "…and {} more pending reminders.",
                pending.len() - LIST_LIMIT
            ));
        }

        msg.reply(&sctx.http, lines.join("\n")).await?;
        return Ok(true);
    };

    match ctx.store.cancel(&token).await {
        Some(removed) => {
            let audience_label = describe_audience(&removed.audience, &ctx.activity);
            msg.reply(
                &sctx.http,
                format!(
                    "Reminder cancelled: {} → {} (ID {}).",
                    audience_label, removed.note, removed.id
                ),
            )
            .await?;

            let mut audit_lines = vec![
                "Reminder cancelled".to_string(),
                format!("• Note: {}", removed.note),
                format!(
                    "• Due: {}",
                    format_local(removed.due_at, ctx.config.timezone)
                ),
            ];
            if removed.time_was_defaulted {
                audit_lines.push(
                    "• Time detail: Defaulted to 09:00 (no explicit time provided)".to_string(),
                );
            }
            audit_lines.push(format!("• Audience: {audience_label}"));
            audit_lines.push(format!(
                "• Originally requested by: <@{}>",
                removed.requested_by
            ));
            audit_lines.push(format!("• Cancelled by: <@{}>", msg.author.id));
            audit_lines.push(format!("• Channel: <#{}>", msg.channel_id));

            let mentioned = [msg.author.id, removed.requested_by];
            ctx.gateway
                .emit_audit_entry(
                    &audit_lines.join("\n"),
                    &MentionAllowList::for_users(mentioned),
                )
                .await;
        }
        None => {
            msg.reply(
                &sctx.http,
                format!(
                    "I couldn't find a pending reminder matching that token. Use `{} reminders` to see the current list.",
                    ctx.config.bot_name
                ),
            )
            .await?;
        }
    }

    Ok(true)
}
