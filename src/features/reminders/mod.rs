//! # Reminders Feature
//!
//! Volatile reminder queue with at-most-once delivery: an in-memory store of
//! pending records, a delivery engine that expands the audience at fire time,
//! and a fixed-interval sweep that drives it. Process restart drops the queue;
//! that trade-off is deliberate.
//!
//! - **Version**: 1.2.0
//! - **Since**: 0.1.0
//! - **Toggleable**: true
//!
//! ## Changelog
//! - 1.2.0: Partial-failure accounting and channel fallback in delivery
//! - 1.1.0: Moderator listing and cancellation
//! - 1.0.0: Initial queue and sweep

pub mod delivery;
pub mod scheduler;
pub mod store;

pub use delivery::{DeliveryEngine, DeliveryOutcome};
pub use scheduler::ReminderScheduler;
pub use store::{ReminderRecord, ReminderStore};
