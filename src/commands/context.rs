//! Shared context for command handlers
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0

use std::sync::Arc;

use crate::core::config::Config;
use crate::features::activity::ActivityLog;
use crate::features::reminders::ReminderStore;
use crate::features::tasks::TaskBoard;
use crate::gateway::ChatGateway;

/// Services every command handler can reach.
///
/// Built once the gateway session is ready and shared behind an `Arc`; the
/// stores inside carry their own synchronization.
pub struct BotContext {
    pub config: Config,
    pub gateway: Arc<dyn ChatGateway>,
    pub store: Arc<ReminderStore>,
    pub tasks: Arc<TaskBoard>,
    pub activity: Arc<ActivityLog>,
}

impl BotContext {
    pub fn new(
        config: Config,
        gateway: Arc<dyn ChatGateway>,
        store: Arc<ReminderStore>,
        tasks: Arc<TaskBoard>,
        activity: Arc<ActivityLog>,
    ) -> Self {
        BotContext {
            config,
            gateway,
            store,
            tasks,
            activity,
        }
    }
}
