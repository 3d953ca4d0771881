//! # Commands Module
//!
//! Plain-text command surface. The bot is addressed by name or mention
//! ("tempo remind me ..."), and the router dispatches to one handler per
//! command family.
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 1.1.0: Moderator reminder administration
//! - 1.0.0: Initial router with remind/assign/stats/help

pub mod admin;
pub mod assign;
pub mod context;
pub mod help;
pub mod remind;
pub mod router;
pub mod stats;

pub use context::BotContext;
pub use router::CommandRouter;
