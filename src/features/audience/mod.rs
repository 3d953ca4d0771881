//! # Audience Feature
//!
//! Resolves a recipient token ("me", a user mention, a role mention,
//! "@everyone") into a canonical audience at scheduling time. Who actually
//! receives the message is expanded later, at delivery time, so role and
//! membership changes between scheduling and firing are honored.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.2.0
//! - **Toggleable**: false

use serenity::model::id::{GuildId, RoleId, UserId};
use thiserror::Error;

use crate::gateway::ChatGateway;

/// What class of recipients a schedule targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudienceKind {
    /// The requester themselves ("me").
    Requester,
    /// A single mentioned user.
    User,
    /// Every current holder of a role.
    Role,
    /// Every non-automated member of the guild.
    Everyone,
}

/// Canonical audience, immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Audience {
    pub kind: AudienceKind,
    /// User id, role id, or guild id depending on `kind`.
    pub subject: Option<u64>,
    /// Required for `Role` and `Everyone`; present for the others only when
    /// the request originated inside a guild.
    pub guild_id: Option<GuildId>,
    /// Label shown in user-facing replies.
    pub display_label: String,
    /// Label used in audit entries.
    pub audit_label: String,
}

impl Audience {
    /// Single-recipient audiences are the only ones eligible for the
    /// origin-channel delivery fallback.
    pub fn is_single_user(&self) -> bool {
        matches!(self.kind, AudienceKind::Requester | AudienceKind::User)
    }

    /// Pronoun used in confirmation replies.
    pub fn noun(&self) -> &'static str {
        match self.kind {
            AudienceKind::Requester | AudienceKind::User => "them",
            AudienceKind::Everyone => "everyone",
            AudienceKind::Role => "that group",
        }
    }
}

/// Why a recipient token could not be resolved. Messages are user-facing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("Everyone reminders only work inside a server.")]
    BroadcastOutsideGuild,
    #[error("I can only resolve roles inside a server.")]
    RoleOutsideGuild,
    #[error("I couldn't find that role.")]
    RoleNotFound,
    #[error("I couldn't figure out who to remind.")]
    UnknownAudience,
}

/// Resolve a recipient token captured from a command.
///
/// `user_mention` / `role_mention` carry ids extracted from mention syntax;
/// `token` is the raw text that produced them.
pub async fn resolve_audience(
    gateway: &dyn ChatGateway,
    token: &str,
    user_mention: Option<UserId>,
    role_mention: Option<RoleId>,
    requester: UserId,
    guild: Option<GuildId>,
) -> Result<Audience, ResolveError> {
    let lowered = token.trim().to_lowercase();

    if lowered == "me" {
        let label = format!("<@{requester}>");
        return Ok(Audience {
            kind: AudienceKind::Requester,
            subject: Some(requester.0),
            guild_id: guild,
            display_label: label.clone(),
            audit_label: label,
        });
    }

    if lowered == "@everyone" || lowered == "everyone" {
        let guild = guild.ok_or(ResolveError::BroadcastOutsideGuild)?;
        return Ok(Audience {
            kind: AudienceKind::Everyone,
            subject: Some(guild.0),
            guild_id: Some(guild),
            display_label: "everyone".to_string(),
            audit_label: "everyone".to_string(),
        });
    }

    if let Some(user) = user_mention {
        let label = format!("<@{user}>");
        return Ok(Audience {
            kind: AudienceKind::User,
            subject: Some(user.0),
            guild_id: guild,
            display_label: label.clone(),
            audit_label: label,
        });
    }

    if let Some(role) = role_mention {
        let guild = guild.ok_or(ResolveError::RoleOutsideGuild)?;
        let handle = gateway
            .fetch_role(guild, role)
            .await
            .ok_or(ResolveError::RoleNotFound)?;
        let label = format!("{} role", handle.name);
        return Ok(Audience {
            kind: AudienceKind::Role,
            subject: Some(role.0),
            guild_id: Some(guild),
            display_label: label.clone(),
            audit_label: label,
        });
    }

    Err(ResolveError::UnknownAudience)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::mock::MockGateway;

    const REQUESTER: UserId = UserId(11);
    const GUILD: GuildId = GuildId(500);

    #[tokio::test]
    async fn test_me_binds_requester() {
        let gateway = MockGateway::new();
        let audience =
            resolve_audience(&gateway, "me", None, None, REQUESTER, Some(GUILD))
                .await
                .unwrap();

        assert_eq!(audience.kind, AudienceKind::Requester);
        assert_eq!(audience.subject, Some(11));
        assert_eq!(audience.display_label, "<@11>");
        assert!(audience.is_single_user());
    }

    #[tokio::test]
    async fn test_everyone_requires_guild() {
        let gateway = MockGateway::new();
        let outside =
            resolve_audience(&gateway, "@everyone", None, None, REQUESTER, None).await;
        assert_eq!(outside, Err(ResolveError::BroadcastOutsideGuild));

        let inside =
            resolve_audience(&gateway, "everyone", None, None, REQUESTER, Some(GUILD))
                .await
                .unwrap();
        assert_eq!(inside.kind, AudienceKind::Everyone);
        assert_eq!(inside.subject, Some(500));
        assert!(!inside.is_single_user());
    }

    #[tokio::test]
    async fn test_user_mention() {
        let gateway = MockGateway::new();
        let audience = resolve_audience(
            &gateway,
            "<@42>",
            Some(UserId(42)),
            None,
            REQUESTER,
            Some(GUILD),
        )
        .await
        .unwrap();

        assert_eq!(audience.kind, AudienceKind::User);
        assert_eq!(audience.subject, Some(42));
        assert_eq!(audience.display_label, "<@42>");
    }

    #[tokio::test]
    async fn test_role_mention_resolves_name() {
        let gateway = MockGateway::new().with_role(500, 77, "release-crew");
        let audience = resolve_audience(
            &gateway,
            "<@&77>",
            None,
            Some(RoleId(77)),
            REQUESTER,
            Some(GUILD),
        )
        .await
        .unwrap();

        assert_eq!(audience.kind, AudienceKind::Role);
        assert_eq!(audience.display_label, "release-crew role");
        assert_eq!(audience.guild_id, Some(GUILD));
    }

    #[tokio::test]
    async fn test_unknown_role_is_an_error() {
        let gateway = MockGateway::new();
        let missing = resolve_audience(
            &gateway,
            "<@&77>",
            None,
            Some(RoleId(77)),
            REQUESTER,
            Some(GUILD),
        )
        .await;
        assert_eq!(missing, Err(ResolveError::RoleNotFound));

        let outside =
            resolve_audience(&gateway, "<@&77>", None, Some(RoleId(77)), REQUESTER, None)
                .await;
        assert_eq!(outside, Err(ResolveError::RoleOutsideGuild));
    }

    #[tokio::test]
    async fn test_garbage_token_is_an_error() {
        let gateway = MockGateway::new();
        let result =
            resolve_audience(&gateway, "the whole team", None, None, REQUESTER, Some(GUILD))
                .await;
        assert_eq!(result, Err(ResolveError::UnknownAudience));
    }
}
