//! # Recurrence Feature
//!
//! Standing schedules decoupled from the reminder queue: two weekly triggers
//! (moderator task digest, activity stats report) that ride a coarse poll,
//! and a daily role ping that re-arms itself as an exact-time one-shot.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.5.0
//! - **Toggleable**: true

pub mod daily;
pub mod weekly;

pub use daily::DailyRolePing;
pub use weekly::{WeeklyReports, WeeklyTrigger};
