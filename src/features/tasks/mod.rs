//! # Tasks Feature
//!
//! Moderator-assigned task backlog. Assignments are DMed to the assignee
//! right away and collected into the Sunday moderator digest.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.5.0
//! - **Toggleable**: true

use chrono::{DateTime, Utc};
use serenity::model::id::{ChannelId, UserId};
use std::sync::Mutex;

#[derive(Debug, Clone)]
pub struct TaskRecord {
    pub id: String,
    pub assignee: UserId,
    pub assigned_by: UserId,
    pub details: String,
    /// Free-text deadline ("by friday"); informational only.
    pub due_text: Option<String>,
    pub channel: ChannelId,
    pub created_at: DateTime<Utc>,
}

#[derive(Default)]
pub struct TaskBoard {
    tasks: Mutex<Vec<TaskRecord>>,
}

impl TaskBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn assign(
        &self,
        assignee: UserId,
        assigned_by: UserId,
        details: String,
        due_text: Option<String>,
        channel: ChannelId,
        now: DateTime<Utc>,
    ) -> TaskRecord {
        let record = TaskRecord {
            id: format!("{}-{}", now.timestamp_millis(), assignee.0),
            assignee,
            assigned_by,
            details,
            due_text,
            channel,
            created_at: now,
        };
        self.tasks
            .lock()
            .expect("task board lock poisoned")
            .push(record.clone());
        record
    }

    pub fn open(&self) -> Vec<TaskRecord> {
        self.tasks
            .lock()
            .expect("task board lock poisoned")
            .clone()
    }

    pub fn open_count(&self) -> usize {
        self.tasks.lock().expect("task board lock poisoned").len()
    }
}

/// Pull a trailing "by <when>" deadline out of a task description. The
/// deadline stays human text; it is never parsed into an instant.
pub fn split_due_text(details: &str) -> (String, Option<String>) {
    let lowered = details.to_lowercase();
    let Some(position) = lowered.find(" by ").map(|p| p + 1).or_else(|| {
        lowered.starts_with("by ").then_some(0)
    }) else {
        return (details.trim().to_string(), None);
    };

    let due = details[position + 2..].trim();
    if due.is_empty() {
        return (details.trim().to_string(), None);
    }

    let head = details[..position].trim();
    if head.is_empty() {
        (details.trim().to_string(), None)
    } else {
        (head.to_string(), Some(due.to_string()))
    }
}
