//! Per-group moderation configuration.
//!
//! One document per group. Created lazily with defaults the first time a
//! group is seen and never hard-deleted; features are switched off instead.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::antiflood::FloodPenalty;

/// Template used when welcome is enabled but no text was set.
pub const DEFAULT_WELCOME: &str = "Welcome, {first}!";

/// Template used when goodbye is enabled but no text was set.
pub const DEFAULT_GOODBYE: &str = "Goodbye, {first}!";

/// Messages per flood window before the guard trips.
pub const DEFAULT_FLOOD_THRESHOLD: u32 = 5;

/// Rejected mutations. The config is left untouched when one is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("a filter for '{0}' already exists")]
    DuplicateFilter(String),
    #[error("no filter found for '{0}'")]
    FilterNotFound(String),
    #[error("filter keyword and reply must not be empty")]
    EmptyFilter,
}

/// A keyword-to-response rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterRule {
    /// Normalized keyword (trimmed, lowercase)
    pub keyword: String,
    /// Reply text, stored verbatim
    pub response: String,
}

/// Moderation configuration for a single group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupConfig {
    /// Chat/group ID
    pub chat_id: i64,

    #[serde(default)]
    pub welcome_enabled: bool,

    #[serde(default)]
    pub welcome_text: Option<String>,

    #[serde(default)]
    pub goodbye_enabled: bool,

    #[serde(default)]
    pub goodbye_text: Option<String>,

    /// Messages allowed per flood window (0 = antiflood disabled)
    #[serde(default = "default_flood_threshold")]
    pub flood_threshold: u32,

    /// Penalty applied when the flood guard trips
    #[serde(default)]
    pub flood_penalty: FloodPenalty,

    /// Penalty duration for mute/ban in seconds (0 = indefinite)
    #[serde(default)]
    pub flood_penalty_secs: u64,

    /// Filters in insertion order (matching order)
    #[serde(default)]
    pub filters: Vec<FilterRule>,

    /// Chat receiving moderation logs
    #[serde(default)]
    pub log_channel: Option<i64>,

    /// Users banned from this group
    #[serde(default)]
    pub blacklist: BTreeSet<u64>,
}

fn default_flood_threshold() -> u32 {
    DEFAULT_FLOOD_THRESHOLD
}

impl GroupConfig {
    /// Create new group config with defaults.
    pub fn new(chat_id: i64) -> Self {
        Self {
            chat_id,
            welcome_enabled: false,
            welcome_text: None,
            goodbye_enabled: false,
            goodbye_text: None,
            flood_threshold: DEFAULT_FLOOD_THRESHOLD,
            flood_penalty: FloodPenalty::default(),
            flood_penalty_secs: 0,
            filters: Vec::new(),
            log_channel: None,
            blacklist: BTreeSet::new(),
        }
    }

    /// Normalize a filter keyword for storage and lookup.
    pub fn normalize_keyword(keyword: &str) -> String {
        keyword.trim().to_lowercase()
    }

    pub fn welcome_template(&self) -> &str {
        self.welcome_text.as_deref().unwrap_or(DEFAULT_WELCOME)
    }

    pub fn goodbye_template(&self) -> &str {
        self.goodbye_text.as_deref().unwrap_or(DEFAULT_GOODBYE)
    }

    /// Get a filter by keyword (case-insensitive).
    pub fn get_filter(&self, keyword: &str) -> Option<&FilterRule> {
        let key = Self::normalize_keyword(keyword);
        self.filters.iter().find(|f| f.keyword == key)
    }

    /// Add a new filter at the end of the matching order.
    ///
    /// Fails if a filter with the same normalized keyword already exists.
    pub fn add_filter(&mut self, keyword: &str, response: &str) -> Result<&FilterRule, ConfigError> {
        let key = Self::normalize_keyword(keyword);
        if key.is_empty() || response.trim().is_empty() {
            return Err(ConfigError::EmptyFilter);
        }
        if self.get_filter(&key).is_some() {
            return Err(ConfigError::DuplicateFilter(key));
        }

        self.filters.push(FilterRule {
            keyword: key,
            response: response.to_string(),
        });
        Ok(&self.filters[self.filters.len() - 1])
    }

    /// Remove a filter by keyword, returning it.
    pub fn remove_filter(&mut self, keyword: &str) -> Result<FilterRule, ConfigError> {
        let key = Self::normalize_keyword(keyword);
        match self.filters.iter().position(|f| f.keyword == key) {
            Some(pos) => Ok(self.filters.remove(pos)),
            None => Err(ConfigError::FilterNotFound(key)),
        }
    }

    /// Filters sorted by keyword, for listing.
    pub fn sorted_filters(&self) -> Vec<&FilterRule> {
        let mut filters: Vec<&FilterRule> = self.filters.iter().collect();
        filters.sort_by(|a, b| a.keyword.cmp(&b.keyword));
        filters
    }

    pub fn is_blacklisted(&self, user_id: u64) -> bool {
        self.blacklist.contains(&user_id)
    }

    /// Add a user to the blacklist. Returns false if already present.
    pub fn blacklist_user(&mut self, user_id: u64) -> bool {
        self.blacklist.insert(user_id)
    }

    /// Remove a user from the blacklist. Returns false if absent.
    pub fn unblacklist_user(&mut self, user_id: u64) -> bool {
        self.blacklist.remove(&user_id)
    }
}
