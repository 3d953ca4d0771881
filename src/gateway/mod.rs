//! # Gateway Module
//!
//! Narrow seam between the scheduling core and the chat platform. Everything
//! the core needs from Discord goes through [`ChatGateway`], so delivery and
//! resolution logic can be exercised against an in-memory double.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.3.0
//! - **Toggleable**: false

use async_trait::async_trait;
use serenity::model::id::{ChannelId, GuildId, RoleId, UserId};

pub mod discord;

#[cfg(test)]
pub(crate) mod mock;

pub use discord::DiscordGateway;

/// A resolved directory member. Automated accounts are filtered out before
/// they reach the core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recipient {
    pub id: UserId,
    pub tag: String,
}

/// A resolved guild role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleHandle {
    pub id: RoleId,
    pub name: String,
}

/// Explicit mention allow-list attached to channel posts. Defaults to pinging
/// nobody; callers opt specific users or roles in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MentionAllowList {
    pub users: Vec<UserId>,
    pub roles: Vec<RoleId>,
}

impl MentionAllowList {
    /// Allow-list that suppresses every mention in the message body.
    pub fn none() -> Self {
        Self::default()
    }

    /// Allow-list covering the given users only. Duplicates are dropped.
    pub fn for_users(users: impl IntoIterator<Item = UserId>) -> Self {
        let mut seen = Vec::new();
        for user in users {
            if !seen.contains(&user) {
                seen.push(user);
            }
        }
        Self {
            users: seen,
            roles: Vec::new(),
        }
    }
}

/// Chat-platform capabilities consumed by the scheduling core.
///
/// Directory lookups degrade rather than fail: a roster that cannot be
/// fetched comes back empty and the caller works with what it got.
#[async_trait]
pub trait ChatGateway: Send + Sync {
    /// DM a single user. Errors bubble up so callers can count failures.
    async fn send_direct_message(&self, user: UserId, text: &str) -> anyhow::Result<()>;

    /// Post to a channel with an explicit mention allow-list.
    async fn send_channel_message(
        &self,
        channel: ChannelId,
        text: &str,
        mentions: &MentionAllowList,
    ) -> anyhow::Result<()>;

    /// Look up one member in the directory.
    async fn fetch_member(&self, user: UserId) -> Option<Recipient>;

    /// Look up a role by id, cache first.
    async fn fetch_role(&self, guild: GuildId, role: RoleId) -> Option<RoleHandle>;

    /// Current non-automated holders of a role. Refreshed from the directory
    /// on every call so membership churn is honored at delivery time.
    async fn role_members(&self, guild: GuildId, role: RoleId) -> Vec<Recipient>;

    /// Full non-automated membership of a guild.
    async fn guild_members(&self, guild: GuildId) -> Vec<Recipient>;

    /// Find roles matching a name (case-insensitive) across all known guilds.
    async fn roles_named(&self, name: &str) -> Vec<(GuildId, RoleHandle)>;

    /// Post a structured entry to the audit channel. Never fails upward.
    async fn emit_audit_entry(&self, text: &str, mentions: &MentionAllowList);
}
