//! Task assignment command
//!
//! `<name> assign @teammate [to] <details> [by <when>]` - moderator-only.
//! The assignee is DMed immediately, with the originating channel as the
//! fallback path, and the task joins the Sunday digest.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.5.0

use anyhow::Result;
use chrono::Utc;
use log::warn;
use regex::Regex;
use serenity::model::channel::Message;
use serenity::model::id::UserId;
use serenity::prelude::Context;
use std::sync::OnceLock;

use super::router::has_moderator_privileges;
use super::BotContext;
use crate::core::format::format_local;
use crate::features::tasks::split_due_text;
use crate::gateway::MentionAllowList;

fn assign_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\bassign\s+<@!?(\d+)>\s+(?:to\s+)?(.+)").expect("hard-coded pattern")
    })
}

pub async fn handle(
    ctx: &BotContext,
    sctx: &Context,
    msg: &Message,
    raw: &str,
) -> Result<bool> {
    let Some(caps) = assign_re().captures(raw) else {
        return Ok(false);
    };

    if !has_moderator_privileges(sctx, msg).await {
        msg.reply(&sctx.http, "Only moderators can assign tasks through me.")
            .await?;
        return Ok(true);
    }

    let Ok(assignee) = caps[1].parse::<u64>().map(UserId) else {
        return Ok(false);
    };
    let details_raw = caps[2].trim();
    if details_raw.is_empty() {
        msg.reply(
            &sctx.http,
            "I need a task description after the teammate mention.",
        )
        .await?;
        return Ok(true);
    }

    let (details, due_text) = split_due_text(details_raw);
    let record = ctx.tasks.assign(
        assignee,
        msg.author.id,
        details.clone(),
        due_text.clone(),
        msg.channel_id,
        Utc::now(),
    );

    let mut confirmation = format!("Task logged for <@{assignee}>: **{details}**.");
    if let Some(due) = &due_text {
        confirmation.push_str(&format!(" Expected by: {due}."));
    }
    confirmation.push_str(" I'll surface it in the weekly moderator digest.");
    msg.reply(&sctx.http, confirmation).await?;

    let mut dm_lines = vec![
        "New assignment for you".to_string(),
        format!("• Task: **{details}**"),
    ];
    if let Some(due) = &due_text {
        dm_lines.push(format!("• Expected by: {due}"));
    }
    dm_lines.push(format!("• Assigned by: <@{}>", msg.author.id));
    dm_lines.push(format!("• Channel: <#{}>", msg.channel_id));
    let dm_text = dm_lines.join("\n");

    let delivery_label = match ctx.gateway.send_direct_message(assignee, &dm_text).await {
        Ok(()) => "Direct Message",
        Err(e) => {
            warn!("Failed to DM assignee {assignee}, falling back to channel: {e}");
            let allowed = MentionAllowList::for_users([assignee]);
            match ctx
                .gateway
                .send_channel_message(
                    msg.channel_id,
                    &format!("<@{assignee}> {dm_text}"),
                    &allowed,
                )
                .await
            {
                Ok(()) => "Channel Fallback",
                Err(fallback_error) => {
                    warn!("Assignment fallback delivery failed: {fallback_error}");
                    "Failed"
                }
            }
        }
    };

    let mut audit_lines = vec![
        format!("Task assigned to <@{assignee}>"),
        format!("• Task: **{details}**"),
    ];
    if let Some(due) = &due_text {
        audit_lines.push(format!("• Expected by: {due}"));
    }
    audit_lines.push(format!("• Assigned by: <@{}>", msg.author.id));
    audit_lines.push(format!("• Channel: <#{}>", msg.channel_id));
    audit_lines.push(format!(
        "• Recorded at: {}",
        format_local(record.created_at, ctx.config.timezone)
    ));
    audit_lines.push(format!("• Delivery: {delivery_label}"));

    ctx.gateway
        .emit_audit_entry(
            &audit_lines.join("\n"),
            &MentionAllowList::for_users([assignee, msg.author.id]),
        )
        .await;

    Ok(true)
}
