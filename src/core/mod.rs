//! # Core Module
//!
//! Configuration and local-time formatting helpers shared by every feature.
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 1.1.0: Add format module with zone-aware timestamp rendering
//! - 1.0.0: Initial creation with config module

pub mod config;
pub mod format;

// Re-export commonly used items
pub use config::Config;
pub use format::{format_local, relative_time};
