//! Per-message moderation stages.
//!
//! - `antiflood` - per (group, user) message rate limiting
//! - `filters` - keyword auto-replies
//! - `history` - name history of every user seen

pub mod antiflood;
pub mod filters;
pub mod history;

pub use antiflood::{FloodGuard, FloodState, FloodVerdict};
pub use filters::FilterEngine;
pub use history::HistoryTracker;
