// Core layer - configuration and shared helpers
pub mod core;

// Gateway layer - narrow seam over the chat platform
pub mod gateway;

// Features layer - scheduling core and trackers
pub mod features;

// Application layer - plain-text command routing
pub mod commands;

// Re-export core config for convenience
pub use core::Config;

// Re-export feature items
pub use features::{
    // Activity tracking
    ActivityLog,
    // Audience resolution
    resolve_audience, Audience, AudienceKind, ResolveError,
    // Recurrence triggers
    DailyRolePing, WeeklyReports, WeeklyTrigger,
    // Reminder queue
    DeliveryEngine, DeliveryOutcome, ReminderRecord, ReminderScheduler, ReminderStore,
    // Schedule parsing
    parse_schedule, ParseError, Schedule,
    // Task backlog
    TaskBoard, TaskRecord,
};

// Re-export gateway seam
pub use gateway::{ChatGateway, DiscordGateway, MentionAllowList, Recipient, RoleHandle};
