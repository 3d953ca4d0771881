//! Zone-aware timestamp rendering
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.2.0

use chrono::{DateTime, Utc};
use chrono_tz::Tz;

/// Render an instant in the configured zone, e.g. `15 Dec 2025, 09:00 (IST)`.
pub fn format_local(instant: DateTime<Utc>, zone: Tz) -> String {
    instant
        .with_timezone(&zone)
        .format("%-d %b %Y, %H:%M (%Z)")
        .to_string()
}

/// Coarse "how long ago" label used in listings and reports.
pub fn relative_time(earlier: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let elapsed_ms = (now - earlier).num_milliseconds().max(0);

    if elapsed_ms < 60_000 {
        return "just now".to_string();
    }
    if elapsed_ms < 3_600_000 {
        let minutes = (elapsed_ms as f64 / 60_000.0).round() as i64;
        return format!("{minutes} min ago");
    }
    if elapsed_ms < 86_400_000 {
        let hours = (elapsed_ms as f64 / 3_600_000.0).round() as i64;
        return format!("{hours} hr ago");
    }
    let days = (elapsed_ms as f64 / 86_400_000.0).round() as i64;
    format!("{} day{} ago", days, if days == 1 { "" } else { "s" })
}
