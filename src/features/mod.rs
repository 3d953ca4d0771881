//! # Features Module
//!
//! All feature modules: the scheduling core (schedule parsing, audience
//! resolution, the reminder queue and its sweep, recurrence triggers) plus
//! the activity and task trackers that feed the weekly reports.

pub mod activity;
pub mod audience;
pub mod recurrence;
pub mod reminders;
pub mod schedule;
pub mod tasks;

// Re-export feature items
pub use activity::ActivityLog;
pub use audience::{resolve_audience, Audience, AudienceKind, ResolveError};
pub use recurrence::{DailyRolePing, WeeklyReports, WeeklyTrigger};
pub use reminders::{
    DeliveryEngine, DeliveryOutcome, ReminderRecord, ReminderScheduler, ReminderStore,
};
pub use schedule::{parse_schedule, ParseError, Schedule};
pub use tasks::{TaskBoard, TaskRecord};
