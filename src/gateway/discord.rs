//! Serenity-backed gateway implementation
//!
//! Reads go through the shard cache first and fall back to REST; roster
//! enumeration always hits REST so delivery sees current membership.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.3.0

use async_trait::async_trait;
use log::{debug, error, warn};
use serenity::cache::Cache;
use serenity::http::Http;
use serenity::model::id::{ChannelId, GuildId, RoleId, UserId};
use std::sync::Arc;

use super::{ChatGateway, MentionAllowList, Recipient, RoleHandle};

/// Discord pages member lists at 1000 entries per request.
const MEMBER_PAGE_SIZE: u64 = 1000;

pub struct DiscordGateway {
    http: Arc<Http>,
    cache: Arc<Cache>,
    audit_channel: Option<ChannelId>,
}

impl DiscordGateway {
    pub fn new(http: Arc<Http>, cache: Arc<Cache>, audit_channel: Option<ChannelId>) -> Self {
        DiscordGateway {
            http,
            cache,
            audit_channel,
        }
    }

    /// Fetch every member of a guild, following pagination.
    async fn fetch_all_members(
        &self,
        guild: GuildId,
    ) -> anyhow::Result<Vec<serenity::model::guild::Member>> {
        let mut members = Vec::new();
        let mut after: Option<u64> = None;

        loop {
            let page = self
                .http
                .get_guild_members(guild.0, Some(MEMBER_PAGE_SIZE), after)
                .await?;
            let page_len = page.len() as u64;
            after = page.last().map(|member| member.user.id.0);
            members.extend(page);
            if page_len < MEMBER_PAGE_SIZE {
                break;
            }
        }

        Ok(members)
    }

    fn guild_roles_from_cache(&self, guild: GuildId) -> Option<Vec<RoleHandle>> {
        self.cache.guild(guild).map(|g| {
            g.roles
                .values()
                .map(|role| RoleHandle {
                    id: role.id,
                    name: role.name.clone(),
                })
                .collect()
        })
    }

    async fn guild_roles(&self, guild: GuildId) -> Vec<RoleHandle> {
        if let Some(roles) = self.guild_roles_from_cache(guild) {
            if !roles.is_empty() {
                return roles;
            }
        }

        match self.http.get_guild_roles(guild.0).await {
            Ok(roles) => roles
                .into_iter()
                .map(|role| RoleHandle {
                    id: role.id,
                    name: role.name,
                })
                .collect(),
            Err(e) => {
                warn!("Unable to fetch roles for guild {guild}: {e}");
                Vec::new()
            }
        }
    }
}

#[async_trait]
impl ChatGateway for DiscordGateway {
    async fn send_direct_message(&self, user: UserId, text: &str) -> anyhow::Result<()> {
        let dm = user.create_dm_channel(&*self.http).await?;
        dm.send_message(&*self.http, |m| m.content(text)).await?;
        Ok(())
    }

    async fn send_channel_message(
        &self,
        channel: ChannelId,
        text: &str,
        mentions: &MentionAllowList,
    ) -> anyhow::Result<()> {
        let users = mentions.users.clone();
        let roles = mentions.roles.clone();
        channel
            .send_message(&*self.http, |m| {
                m.content(text).allowed_mentions(|allowed| {
                    allowed.empty_parse().users(users).roles(roles)
                })
            })
            .await?;
        Ok(())
    }

    async fn fetch_member(&self, user: UserId) -> Option<Recipient> {
        if let Some(cached) = self.cache.user(user) {
            return Some(Recipient {
                id: cached.id,
                tag: cached.tag(),
            });
        }

        match self.http.get_user(user.0).await {
            Ok(fetched) => Some(Recipient {
                id: fetched.id,
                tag: fetched.tag(),
            }),
            Err(e) => {
                warn!("Failed to fetch user {user}: {e}");
                None
            }
        }
    }

    async fn fetch_role(&self, guild: GuildId, role: RoleId) -> Option<RoleHandle> {
        self.guild_roles(guild)
            .await
            .into_iter()
            .find(|handle| handle.id == role)
    }

    async fn role_members(&self, guild: GuildId, role: RoleId) -> Vec<Recipient> {
        match self.fetch_all_members(guild).await {
            Ok(members) => members
                .into_iter()
                .filter(|member| !member.user.bot && member.roles.contains(&role))
                .map(|member| Recipient {
                    id: member.user.id,
                    tag: member.user.tag(),
                })
                .collect(),
            Err(e) => {
                warn!("Unable to fetch member list for guild {guild}: {e}");
                Vec::new()
            }
        }
    }

    async fn guild_members(&self, guild: GuildId) -> Vec<Recipient> {
        match self.fetch_all_members(guild).await {
            Ok(members) => members
                .into_iter()
                .filter(|member| !member.user.bot)
                .map(|member| Recipient {
                    id: member.user.id,
                    tag: member.user.tag(),
                })
                .collect(),
            Err(e) => {
                warn!("Unable to fetch member list for guild {guild}: {e}");
                Vec::new()
            }
        }
    }

    async fn roles_named(&self, name: &str) -> Vec<(GuildId, RoleHandle)> {
        let wanted = name.trim().to_lowercase();
        let mut matches = Vec::new();

        for guild in self.cache.guilds() {
            let found = self
                .guild_roles(guild)
                .await
                .into_iter()
                .find(|role| role.name.trim().to_lowercase() == wanted);
            if let Some(role) = found {
                matches.push((guild, role));
            }
        }

        matches
    }

    async fn emit_audit_entry(&self, text: &str, mentions: &MentionAllowList) {
        let Some(channel) = self.audit_channel else {
            debug!("Audit channel not configured, dropping entry");
            return;
        };

        if let Err(e) = self.send_channel_message(channel, text, mentions).await {
            error!("Failed to post audit entry: {e}");
        }
    }
}
