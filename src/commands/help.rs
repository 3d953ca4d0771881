//! Help command
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0

use anyhow::Result;
use serenity::builder::CreateEmbed;
use serenity::model::channel::Message;
use serenity::prelude::Context;

use super::BotContext;

fn command_field(command: &str, example: &str, description: &str) -> String {
    [
        format!("- Command: {command}"),
        format!("- Example: {example}"),
        format!("- What it does: {description}"),
    ]
    .join("\n")
}

/// Quick-assist embed listing every command family.
pub fn build_help_embed(bot_name: &str) -> CreateEmbed {
    let mut embed = CreateEmbed::default();
    embed
        .title("Quick Assist")
        .color(0x4f46e5)
        .description("Mention me with one of these prompts and I'll take it from there:")
        .field(
            "Set a Reminder",
            command_field(
                &format!("{bot_name} remind me/@user/@role/@everyone note <time>"),
                &format!("{bot_name} remind @everyone prep release notes at 17:00"),
                "Understands in 20m, tomorrow 5pm, or 17 Dec 09:00, then delivers the reminder directly at the right moment.",
            ),
            false,
        )
        .field(
            "Manage Reminders (mods)",
            command_field(
                &format!("{bot_name} reminders [delete <index|id>]"),
                &format!("{bot_name} reminders delete 2"),
                "Lists pending reminders in due order, or cancels one by its listing index or id.",
            ),
            false,
        )
        .field(
            "Assign Work (mods)",
            command_field(
                &format!("{bot_name} assign @teammate task details"),
                &format!("{bot_name} assign @Nova ship mobile polish by Friday"),
                "Logs the task, DMs the assignee (channel fallback if needed), and queues it for the Sunday moderator digest.",
            ),
            false,
        )
        .field(
            "Server Pulse",
            command_field(
                &format!("{bot_name} stats"),
                &format!("{bot_name} stats"),
                "Returns traffic totals, top channels, top contributors, quiet spots, and the ops snapshot.",
            ),
            false,
        )
        .field(
            "Automation Highlights",
            [
                "- Weekly digest lands Sundays 14:00 in the moderator channel.",
                "- Weekly pulse report lands Sundays 18:00 in the audit channel.",
                "- Daily progress ping nudges the configured role every evening.",
            ]
            .join("\n"),
            false,
        )
        .footer(|f| f.text("Need something custom? Say my name and describe it."));
    embed
}

pub async fn handle(ctx: &BotContext, sctx: &Context, msg: &Message) -> Result<()> {
    let embed = build_help_embed(&ctx.config.bot_name);
    msg.channel_id
        .send_message(&sctx.http, |m| m.reference_message(msg).set_embed(embed))
        .await?;
    Ok(())
}
