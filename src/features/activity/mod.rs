//! # Activity Feature
//!
//! Lightweight per-channel and per-member message counters. Feeds the
//! on-demand pulse command and the weekly stats report; everything lives in
//! memory and resets with the process.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.5.0
//! - **Toggleable**: true

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use serenity::model::id::{ChannelId, UserId};

#[derive(Debug, Clone)]
pub struct ChannelActivity {
    pub count: u64,
    pub name: String,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct MemberActivity {
    pub count: u64,
    pub tag: String,
    pub updated_at: DateTime<Utc>,
    pub last_channel: ChannelId,
}

#[derive(Default)]
pub struct ActivityLog {
    channels: DashMap<ChannelId, ChannelActivity>,
    members: DashMap<UserId, MemberActivity>,
}

impl ActivityLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_message(
        &self,
        channel: ChannelId,
        channel_name: Option<&str>,
        author: UserId,
        author_tag: &str,
        now: DateTime<Utc>,
    ) {
        let mut snapshot = self.channels.entry(channel).or_insert(ChannelActivity {
            count: 0,
            name: channel_name.unwrap_or("unknown").to_string(),
            updated_at: now,
        });
        snapshot.count += 1;
        if let Some(name) = channel_name {
            snapshot.name = name.to_string();
        }
        snapshot.updated_at = now;
        drop(snapshot);

        let mut member = self.members.entry(author).or_insert(MemberActivity {
            count: 0,
            tag: author_tag.to_string(),
            updated_at: now,
            last_channel: channel,
        });
        member.count += 1;
        member.tag = author_tag.to_string();
        member.updated_at = now;
        member.last_channel = channel;
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    pub fn contributor_count(&self) -> usize {
        self.members.len()
    }

    pub fn total_messages(&self) -> u64 {
        self.channels.iter().map(|entry| entry.count).sum()
    }

    /// Channels with a message inside the window.
    pub fn recent_channel_count(&self, now: DateTime<Utc>, within: Duration) -> usize {
        self.channels
            .iter()
            .filter(|entry| now - entry.updated_at <= within)
            .count()
    }

    /// Busiest channels, highest count first.
    pub fn top_channels(&self, limit: usize) -> Vec<(ChannelId, ChannelActivity)> {
        let mut entries: Vec<(ChannelId, ChannelActivity)> = self
            .channels
            .iter()
            .map(|entry| (*entry.key(), entry.value().clone()))
            .collect();
        entries.sort_by(|a, b| b.1.count.cmp(&a.1.count));
        entries.truncate(limit);
        entries
    }

    /// Most talkative members, highest count first.
    pub fn top_members(&self, limit: usize) -> Vec<(UserId, MemberActivity)> {
        let mut entries: Vec<(UserId, MemberActivity)> = self
            .members
            .iter()
            .map(|entry| (*entry.key(), entry.value().clone()))
            .collect();
        entries.sort_by(|a, b| b.1.count.cmp(&a.1.count));
        entries.truncate(limit);
        entries
    }

    /// Channels silent for longer than the threshold, quietest first.
    pub fn quiet_channels(
        &self,
        now: DateTime<Utc>,
        older_than: Duration,
        limit: usize,
    ) -> Vec<(ChannelId, ChannelActivity)> {
        let mut entries: Vec<(ChannelId, ChannelActivity)> = self
            .channels
            .iter()
            .filter(|entry| now - entry.updated_at > older_than)
            .map(|entry| (*entry.key(), entry.value().clone()))
            .collect();
        entries.sort_by_key(|entry| entry.1.updated_at);
        entries.truncate(limit);
        entries
    }

    /// Last known tag of a member, if they ever spoke.
    pub fn member_tag(&self, user: UserId) -> Option<String> {
        self.members.get(&user).map(|entry| entry.tag.clone())
    }

    /// Last known name of a channel.
    pub fn channel_name(&self, channel: ChannelId) -> Option<String> {
        self.channels.get(&channel).map(|entry| entry.name.clone())
    }
}
