//! User record model.
//!
//! Holds the global-admin flag and the bounded name history observed for a
//! user across all groups.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A timestamped snapshot of a user's display name and username.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// First and last name joined by a space.
    pub display_name: String,
    /// Username without @, preserving case.
    pub username: Option<String>,
    pub observed_at: DateTime<Utc>,
}

impl HistoryEntry {
    /// Whether this entry already describes the given name pair.
    pub fn describes(&self, display_name: &str, username: Option<&str>) -> bool {
        self.display_name == display_name && self.username.as_deref() == username
    }

    /// Render as `Name (@username)` for history listings.
    pub fn label(&self) -> String {
        match &self.username {
            Some(u) => format!("{} (@{})", self.display_name, u),
            None => format!("{} (no username)", self.display_name),
        }
    }
}

/// Persisted per-user state.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub user_id: u64,

    /// Global admins pass every permission check in every group.
    #[serde(default)]
    pub global_admin: bool,

    /// Name history, oldest first.
    #[serde(default)]
    pub history: VecDeque<HistoryEntry>,
}

impl UserRecord {
    pub fn new(user_id: u64) -> Self {
        Self {
            user_id,
            global_admin: false,
            history: VecDeque::new(),
        }
    }

    /// Most recent history entry, if any.
    pub fn latest(&self) -> Option<&HistoryEntry> {
        self.history.back()
    }

    /// Whether any recorded username matches (case-insensitive).
    pub fn has_used_username(&self, username: &str) -> bool {
        let wanted = username.trim_start_matches('@');
        self.history
            .iter()
            .filter_map(|e| e.username.as_deref())
            .any(|u| u.eq_ignore_ascii_case(wanted))
    }

    /// Append an entry, evicting from the front to stay within `limit`.
    pub fn push_bounded(&mut self, entry: HistoryEntry, limit: usize) {
        self.history.push_back(entry);
        while self.history.len() > limit {
            self.history.pop_front();
        }
    }
}
