//! In-memory gateway double for feature tests.

use async_trait::async_trait;
use serenity::model::id::{ChannelId, GuildId, RoleId, UserId};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use super::{ChatGateway, MentionAllowList, Recipient, RoleHandle};

#[derive(Default)]
pub struct MockGateway {
    members: Mutex<HashMap<UserId, Recipient>>,
    roles: Mutex<HashMap<(GuildId, RoleId), RoleHandle>>,
    role_rosters: Mutex<HashMap<(GuildId, RoleId), Vec<Recipient>>>,
    guild_rosters: Mutex<HashMap<GuildId, Vec<Recipient>>>,
    failing_dms: Mutex<HashSet<UserId>>,
    failing_channels: Mutex<HashSet<ChannelId>>,
    pub dms: Mutex<Vec<(UserId, String)>>,
    pub channel_posts: Mutex<Vec<(ChannelId, String, MentionAllowList)>>,
    pub audit_entries: Mutex<Vec<String>>,
}

impl MockGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_member(self, id: u64, tag: &str) -> Self {
        self.members.lock().unwrap().insert(
            UserId(id),
            Recipient {
                id: UserId(id),
                tag: tag.to_string(),
            },
        );
        self
    }

    pub fn with_role(self, guild: u64, role: u64, name: &str) -> Self {
        self.roles.lock().unwrap().insert(
            (GuildId(guild), RoleId(role)),
            RoleHandle {
                id: RoleId(role),
                name: name.to_string(),
            },
        );
        self
    }

    pub fn with_role_roster(self, guild: u64, role: u64, members: &[(u64, &str)]) -> Self {
        self.role_rosters.lock().unwrap().insert(
            (GuildId(guild), RoleId(role)),
            members
                .iter()
                .map(|(id, tag)| Recipient {
                    id: UserId(*id),
                    tag: (*tag).to_string(),
                })
                .collect(),
        );
        self
    }

    pub fn with_guild_roster(self, guild: u64, members: &[(u64, &str)]) -> Self {
        self.guild_rosters.lock().unwrap().insert(
            GuildId(guild),
            members
                .iter()
                .map(|(id, tag)| Recipient {
                    id: UserId(*id),
                    tag: (*tag).to_string(),
                })
                .collect(),
        );
        self
    }

    pub fn failing_dm(self, id: u64) -> Self {
        self.failing_dms.lock().unwrap().insert(UserId(id));
        self
    }

    pub fn failing_channel(self, id: u64) -> Self {
        self.failing_channels.lock().unwrap().insert(ChannelId(id));
        self
    }

    pub fn dm_count(&self) -> usize {
        self.dms.lock().unwrap().len()
    }
}

#[async_trait]
impl ChatGateway for MockGateway {
    async fn send_direct_message(&self, user: UserId, text: &str) -> anyhow::Result<()> {
        if self.failing_dms.lock().unwrap().contains(&user) {
            anyhow::bail!("cannot DM user {user}");
        }
        self.dms.lock().unwrap().push((user, text.to_string()));
        Ok(())
    }

    async fn send_channel_message(
        &self,
        channel: ChannelId,
        text: &str,
        mentions: &MentionAllowList,
    ) -> anyhow::Result<()> {
        if self.failing_channels.lock().unwrap().contains(&channel) {
            anyhow::bail!("cannot post to channel {channel}");
        }
        self.channel_posts
            .lock()
            .unwrap()
            .push((channel, text.to_string(), mentions.clone()));
        Ok(())
    }

    async fn fetch_member(&self, user: UserId) -> Option<Recipient> {
        self.members.lock().unwrap().get(&user).cloned()
    }

    async fn fetch_role(&self, guild: GuildId, role: RoleId) -> Option<RoleHandle> {
        self.roles.lock().unwrap().get(&(guild, role)).cloned()
    }

    async fn role_members(&self, guild: GuildId, role: RoleId) -> Vec<Recipient> {
        self.role_rosters
            .lock()
            .unwrap()
            .get(&(guild, role))
            .cloned()
            .unwrap_or_default()
    }

    async fn guild_members(&self, guild: GuildId) -> Vec<Recipient> {
        self.guild_rosters
            .lock()
            .unwrap()
            .get(&guild)
            .cloned()
            .unwrap_or_default()
    }

    async fn roles_named(&self, name: &str) -> Vec<(GuildId, RoleHandle)> {
        let wanted = name.trim().to_lowercase();
        self.roles
            .lock()
            .unwrap()
            .iter()
            .filter(|((_, _), handle)| handle.name.trim().to_lowercase() == wanted)
            .map(|((guild, _), handle)| (*guild, handle.clone()))
            .collect()
    }

    async fn emit_audit_entry(&self, text: &str, _mentions: &MentionAllowList) {
        self.audit_entries.lock().unwrap().push(text.to_string());
    }
}
