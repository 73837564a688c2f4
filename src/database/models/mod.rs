//! Database models.

pub mod antiflood;
pub mod group_config;
pub mod user;

pub use antiflood::FloodPenalty;
pub use group_config::{ConfigError, FilterRule, GroupConfig};
pub use user::{HistoryEntry, UserRecord};
