//! Message command router
//!
//! Watches every incoming message, tracks activity, answers greetings and
//! name pings, and hands name-addressed commands to the matching handler.
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.1.0

use anyhow::Result;
use chrono::Utc;
use log::{debug, info, warn};
use regex::Regex;
use serenity::model::channel::Message;
use serenity::prelude::Context;
use std::sync::{Arc, OnceLock};
use uuid::Uuid;

use super::{admin, assign, help, remind, stats, BotContext};

fn help_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\bhelp\b").expect("hard-coded pattern"))
}

fn reminders_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\breminders\b").expect("hard-coded pattern"))
}

fn assign_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\bassign\b").expect("hard-coded pattern"))
}

fn remind_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\bremind\b").expect("hard-coded pattern"))
}

fn stats_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b(stats|status|pulse)\b").expect("hard-coded pattern"))
}

fn name_noise_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"[!?.:,*/\\`'"()-]+"#).expect("hard-coded pattern"))
}

/// Lowercase, fold bot mentions into the bot name, and strip punctuation so
/// greeting detection sees bare words.
fn normalize_for_name_checks(content: &str, bot_id: Option<u64>, bot_name: &str) -> String {
    let mut working = content.trim().to_lowercase();
    if let Some(id) = bot_id {
        working = working
            .replace(&format!("<@!{id}>"), bot_name)
            .replace(&format!("<@{id}>"), bot_name);
    }
    let stripped = name_noise_re().replace_all(&working, " ");
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// "hi tempo", "hello", or just the name with noise - nothing else.
fn is_greeting(normalized: &str, bot_name: &str) -> bool {
    if normalized.is_empty() || !normalized.contains(bot_name) {
        return false;
    }

    let tokens: Vec<&str> = normalized.split_whitespace().collect();
    if !tokens.iter().any(|token| *token == bot_name) {
        return false;
    }

    let greeting_words = ["hi", "hello", "hey"];
    let alpha_tokens: Vec<&str> = tokens
        .iter()
        .copied()
        .filter(|token| {
            *token != bot_name && token.chars().all(|c| c.is_ascii_alphabetic())
        })
        .collect();
    if alpha_tokens.is_empty() {
        return true;
    }

    let has_greeting = alpha_tokens
        .iter()
        .any(|token| greeting_words.contains(token));
    if !has_greeting {
        return tokens.iter().all(|token| *token == bot_name);
    }

    alpha_tokens
        .iter()
        .all(|token| greeting_words.contains(token))
}

fn is_plain_name_ping(normalized: &str, bot_name: &str) -> bool {
    normalized == bot_name
}

pub struct CommandRouter {
    ctx: Arc<BotContext>,
}

impl CommandRouter {
    pub fn new(ctx: Arc<BotContext>) -> Self {
        CommandRouter { ctx }
    }

    pub async fn handle_message(&self, sctx: &Context, msg: &Message) -> Result<()> {
        let channel_name = msg.channel_id.name(&sctx.cache).await;
        self.ctx.activity.record_message(
            msg.channel_id,
            channel_name.as_deref(),
            msg.author.id,
            &msg.author.tag(),
            Utc::now(),
        );

        let raw = msg.content.trim();
        if raw.is_empty() {
            return Ok(());
        }

        let bot_name = self.ctx.config.bot_name.as_str();
        let bot_id = Some(sctx.cache.current_user_id().0);
        let normalized_name_check = normalize_for_name_checks(raw, bot_id, bot_name);
        let normalized = raw.to_lowercase();

        let name_mentioned = normalized.contains(bot_name)
            || msg
                .mentions
                .iter()
                .any(|user| user.id == sctx.cache.current_user_id());
        if !name_mentioned {
            return Ok(());
        }

        let request_id = Uuid::new_v4();
        info!(
            "[{request_id}] Command candidate from {} in {}: '{}'",
            msg.author.id,
            msg.channel_id,
            raw.chars().take(100).collect::<String>()
        );

        if is_greeting(&normalized_name_check, bot_name) {
            let intro = [
                format!("Hey there! I'm {bot_name} - your automation bot on call."),
                format!(
                    "Need backup? Say `{bot_name} help` for my command list or spell out the task with my name and I'll take it."
                ),
                "Reminders, task assignments, server stats - point me at it and I'll keep things moving.".to_string(),
            ]
            .join("\n");
            msg.reply(&sctx.http, intro).await?;
            return Ok(());
        }

        if is_plain_name_ping(&normalized_name_check, bot_name) {
            msg.reply(&sctx.http, "You mentioned my name - how can I help?")
                .await?;
            return Ok(());
        }

        if help_re().is_match(&normalized) {
            debug!("[{request_id}] Dispatching help");
            help::handle(&self.ctx, sctx, msg).await?;
            return Ok(());
        }

        // "reminders" must win over the "remind" prefix it contains.
        if reminders_re().is_match(&normalized)
            && admin::handle(&self.ctx, sctx, msg, raw).await?
        {
            debug!("[{request_id}] Dispatched reminder admin");
            return Ok(());
        }

        if assign_re().is_match(&normalized) && assign::handle(&self.ctx, sctx, msg, raw).await? {
            debug!("[{request_id}] Dispatched assign");
            return Ok(());
        }

        if remind_re().is_match(&normalized) && remind::handle(&self.ctx, sctx, msg, raw).await? {
            debug!("[{request_id}] Dispatched remind");
            return Ok(());
        }

        if stats_re().is_match(&normalized) && stats::handle(&self.ctx, sctx, msg).await? {
            debug!("[{request_id}] Dispatched stats");
            return Ok(());
        }

        debug!("[{request_id}] No command matched");
        Ok(())
    }
}

/// Anyone holding a role whose name contains "moderator" counts.
pub(crate) async fn has_moderator_privileges(sctx: &Context, msg: &Message) -> bool {
    let Some(guild_id) = msg.guild_id else {
        return false;
    };
    let Some(member) = &msg.member else {
        return false;
    };
    if member.roles.is_empty() {
        return false;
    }

    let roles = match sctx.cache.guild(guild_id) {
        Some(guild) => guild.roles,
        None => match sctx.http.get_guild_roles(guild_id.0).await {
            Ok(fetched) => fetched.into_iter().map(|role| (role.id, role)).collect(),
            Err(e) => {
                warn!("Unable to fetch roles for moderator check: {e}");
                return false;
            }
        },
    };

    member.roles.iter().any(|role_id| {
        roles
            .get(role_id)
            .map(|role| role.name.trim().to_lowercase().contains("moderator"))
            .unwrap_or(false)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_folds_mentions_and_noise() {
        let normalized = normalize_for_name_checks("  <@!42> HELLO!!  ", Some(42), "tempo");
        assert_eq!(normalized, "tempo hello");

        let plain = normalize_for_name_checks("Tempo, remind me...", Some(42), "tempo");
        assert_eq!(plain, "tempo remind me");
    }

    #[test]
    fn test_greeting_detection() {
        assert!(is_greeting("hi tempo", "tempo"));
        assert!(is_greeting("hey hey tempo", "tempo"));
        assert!(is_greeting("tempo", "tempo"));
        assert!(!is_greeting("tempo remind me", "tempo"));
        assert!(!is_greeting("hello world tempo", "tempo"));
        assert!(!is_greeting("hello", "tempo"));
    }

    #[test]
    fn test_plain_name_ping() {
        assert!(is_plain_name_ping("tempo", "tempo"));
        assert!(!is_plain_name_ping("tempo help", "tempo"));
    }

    #[test]
    fn test_dispatch_word_boundaries() {
        assert!(remind_re().is_match("tempo remind me to rest in 1 hour"));
        assert!(!reminders_re().is_match("tempo remind me to rest in 1 hour"));
        assert!(reminders_re().is_match("tempo reminders delete 2"));
        assert!(stats_re().is_match("tempo status"));
        assert!(!stats_re().is_match("tempo statistics"));
    }
}
