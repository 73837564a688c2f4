//! Utility functions.

pub mod fillings;

use chrono::{DateTime, TimeDelta, Utc};

pub use fillings::render;

/// Longest timed restriction: 366 days. Longer ones are requested with a
/// duration of 0 (indefinite).
pub const MAX_DURATION_SECS: u64 = 366 * 24 * 3600;

/// `at` plus `secs` seconds, clamped to [`MAX_DURATION_SECS`]. Zero means
/// indefinite and yields `None`.
pub fn expiry(at: DateTime<Utc>, secs: u64) -> Option<DateTime<Utc>> {
    if secs == 0 {
        return None;
    }
    let secs = secs.min(MAX_DURATION_SECS) as i64;
    at.checked_add_signed(TimeDelta::seconds(secs))
}

/// Human readable duration, largest two units.
pub fn format_duration(secs: u64) -> String {
    if secs < 60 {
        format!("{} seconds", secs)
    } else if secs < 3600 {
        format!("{} minutes", secs / 60)
    } else if secs < 86400 {
        let hours = secs / 3600;
        let mins = (secs % 3600) / 60;
        if mins > 0 {
            format!("{} hours {} minutes", hours, mins)
        } else {
            format!("{} hours", hours)
        }
    } else {
        let days = secs / 86400;
        let hours = (secs % 86400) / 3600;
        if hours > 0 {
            format!("{} days {} hours", days, hours)
        } else {
            format!("{} days", days)
        }
    }
}
