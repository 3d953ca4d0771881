//! Reminder creation command
//!
//! `<name> remind me/@user/@role/@everyone [to] <note> <schedule>`
//!
//! Audience resolution and schedule parsing both happen up front; any error
//! is reported to the requester and nothing is queued.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.2.0

use anyhow::Result;
use chrono::Utc;
use log::info;
use regex::Regex;
use serenity::model::channel::Message;
use serenity::model::id::{RoleId, UserId};
use serenity::prelude::Context;
use std::sync::OnceLock;

use super::BotContext;
use crate::core::format::format_local;
use crate::features::audience::resolve_audience;
use crate::features::schedule::parse_schedule;
use crate::gateway::MentionAllowList;

fn remind_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\bremind\s+(me|@?everyone|<@!?(\d+)>|<@&(\d+)>)(?:\s+to)?\s+(.+)")
            .expect("hard-coded pattern")
    })
}

/// Returns false when the message does not shape up as a remind command at
/// all, so the router can keep looking.
pub async fn handle(
    ctx: &BotContext,
    sctx: &Context,
    msg: &Message,
    raw: &str,
) -> Result<bool> {
    let Some(caps) = remind_re().captures(raw) else {
        return Ok(false);
    };

    let token = caps[1].to_string();
    let user_mention = caps
        .get(2)
        .and_then(|m| m.as_str().parse::<u64>().ok())
        .map(UserId);
    let role_mention = caps
        .get(3)
        .and_then(|m| m.as_str().parse::<u64>().ok())
        .map(RoleId);
    let remainder = caps[4].trim().to_string();

    if remainder.is_empty() {
        msg.reply(
            &sctx.http,
            format!(
                "Give me what to remind you about - try `{} remind me to review PR in 30m`.",
                ctx.config.bot_name
            ),
        )
        .await?;
        return Ok(true);
    }

    let audience = match resolve_audience(
        ctx.gateway.as_ref(),
        &token,
        user_mention,
        role_mention,
        msg.author.id,
        msg.guild_id,
    )
    .await
    {
        Ok(audience) => audience,
        Err(e) => {
            msg.reply(&sctx.http, e.to_string()).await?;
            return Ok(true);
        }
    };

    let now = Utc::now().with_timezone(&ctx.config.timezone);
    let schedule = match parse_schedule(&remainder, now) {
        Ok(schedule) => schedule,
        Err(e) => {
            let name = &ctx.config.bot_name;
            msg.reply(
                &sctx.http,
                format!(
                    "{e} Examples:\n- {name} remind me to stretch in 20m\n- {name} remind @Nova ship notes at 16:30\n- {name} remind me update roadmap on 2025-12-15 at 09:00"
                ),
            )
            .await?;
            return Ok(true);
        }
    };

    let due_at = schedule.due_at.with_timezone(&Utc);
    let record_id = ctx
        .store
        .enqueue(
            audience.clone(),
            schedule.note.clone(),
            due_at,
            msg.channel_id,
            msg.author.id,
            schedule.time_was_defaulted,
            Utc::now(),
        )
        .await;

    info!(
        "Queued reminder {record_id} for {} due {}",
        audience.audit_label,
        format_local(due_at, ctx.config.timezone)
    );

    let default_hint = if schedule.time_was_defaulted {
        " I set that to 09:00 in the configured timezone - add a time if you need something different."
    } else {
        ""
    };
    msg.reply(
        &sctx.http,
        format!(
            "Reminder saved for {}: {}. I'll DM {} around {}.{default_hint}",
            audience.display_label,
            schedule.note,
            audience.noun(),
            format_local(due_at, ctx.config.timezone)
        ),
    )
    .await?;

    let mut audit_lines = vec![
        format!("Reminder scheduled for {}", audience.audit_label),
        format!("• Note: {}", schedule.note),
        format!("• Due: {}", format_local(due_at, ctx.config.timezone)),
    ];
    if schedule.time_was_defaulted {
        audit_lines
            .push("• Time detail: Defaulted to 09:00 (no explicit time provided)".to_string());
    }
    audit_lines.push(format!("• Requested by: <@{}>", msg.author.id));
    audit_lines.push(format!("• Channel: <#{}>", msg.channel_id));

    let mentioned = std::iter::once(msg.author.id).chain(
        audience
            .is_single_user()
            .then(|| audience.subject.map(UserId))
            .flatten(),
    );
    ctx.gateway
        .emit_audit_entry(
            &audit_lines.join("\n"),
            &MentionAllowList::for_users(mentioned),
        )
        .await;

    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remind_capture_shapes() {
        let caps = remind_re()
            .captures("tempo remind me to ship release in 20m")
            .unwrap();
        assert_eq!(&caps[1], "me");
        assert_eq!(&caps[4], "ship release in 20m");

        let caps = remind_re()
            .captures("tempo remind <@!42> review the deck at 17:00")
            .unwrap();
        assert_eq!(caps.get(2).unwrap().as_str(), "42");

        let caps = remind_re()
            .captures("tempo remind <@&77> standup tomorrow 9am")
            .unwrap();
        assert_eq!(caps.get(3).unwrap().as_str(), "77");

        let caps = remind_re()
            .captures("tempo remind @everyone prep release notes at 17:00")
            .unwrap();
        assert_eq!(&caps[1], "@everyone");
        assert_eq!(&caps[4], "prep release notes at 17:00");
    }

    #[test]
    fn test_remind_requires_target_and_body() {
        assert!(remind_re().captures("tempo remind").is_none());
        assert!(remind_re().captures("tempo reminders").is_none());
    }
}
