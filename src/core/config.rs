//! Environment-driven configuration
//!
//! All tunables come from the process environment (loaded from `.env` by the
//! binary). A single timezone identifier anchors every local-time computation
//! in the bot; individual features never consult the system zone.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0

use anyhow::{anyhow, Context, Result};
use chrono_tz::Tz;
use serenity::model::id::ChannelId;

/// Default IANA zone when `BOT_TIMEZONE` is unset.
const DEFAULT_TIMEZONE: &str = "Asia/Kolkata";

/// Runtime configuration resolved once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Discord bot token.
    pub discord_token: String,
    /// Name the bot answers to in plain-text commands.
    pub bot_name: String,
    /// Fixed zone for all schedule parsing and trigger math.
    pub timezone: Tz,
    /// Channel receiving the weekly task digest, if configured.
    pub moderator_channel_id: Option<ChannelId>,
    /// Channel receiving structured audit entries, if configured.
    pub audit_log_channel_id: Option<ChannelId>,
    /// Role name pinged by the daily progress reminder.
    pub daily_ping_role: String,
    /// Local hour of the daily ping.
    pub daily_ping_hour: u32,
    /// Local minute of the daily ping.
    pub daily_ping_minute: u32,
    /// Message body sent by the daily ping.
    pub daily_ping_message: String,
    /// Default log filter passed to env_logger.
    pub log_level: String,
}

impl Config {
    /// Build a configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        let discord_token = std::env::var("DISCORD_TOKEN")
            .map_err(|_| anyhow!("DISCORD_TOKEN is not set. Add it to your .env file."))?;

        let timezone = parse_zone(&env_or("BOT_TIMEZONE", DEFAULT_TIMEZONE))?;

        let daily_ping_hour = env_or("DAILY_PING_HOUR", "20")
            .parse::<u32>()
            .context("DAILY_PING_HOUR must be a number")?;
        let daily_ping_minute = env_or("DAILY_PING_MINUTE", "0")
            .parse::<u32>()
            .context("DAILY_PING_MINUTE must be a number")?;
        validate_clock(daily_ping_hour, daily_ping_minute)?;

        let mut bot_name = env_or("BOT_NAME", "tempo").trim().to_lowercase();
        if bot_name.is_empty() {
            bot_name = "tempo".to_string();
        }

        Ok(Config {
            discord_token,
            bot_name,
            timezone,
            moderator_channel_id: optional_channel("MODERATOR_CHANNEL_ID")?,
            audit_log_channel_id: optional_channel("AUDIT_LOG_CHANNEL_ID")?,
            daily_ping_role: env_or("DAILY_PING_ROLE", "bashers"),
            daily_ping_hour,
            daily_ping_minute,
            daily_ping_message: env_or(
                "DAILY_PING_MESSAGE",
                "Uploaded today's progress?! If not, do it now!!",
            ),
            log_level: env_or("LOG_LEVEL", "info"),
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse an IANA zone identifier like `Asia/Kolkata` or `Europe/Berlin`.
fn parse_zone(value: &str) -> Result<Tz> {
    value
        .trim()
        .parse::<Tz>()
        .map_err(|_| anyhow!("'{value}' is not a valid IANA timezone identifier"))
}

fn validate_clock(hour: u32, minute: u32) -> Result<()> {
    if hour > 23 {
        return Err(anyhow!("DAILY_PING_HOUR must be 0-23, got {hour}"));
    }
    if minute > 59 {
        return Err(anyhow!("DAILY_PING_MINUTE must be 0-59, got {minute}"));
    }
    Ok(())
}

/// Read an optional channel id; unset or empty means "feature disabled".
fn optional_channel(key: &str) -> Result<Option<ChannelId>> {
    match std::env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => {
            let id = raw
                .trim()
                .parse::<u64>()
                .with_context(|| format!("{key} must be a numeric channel id"))?;
            Ok(Some(ChannelId(id)))
        }
        _ => Ok(None),
    }
}
