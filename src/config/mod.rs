//! Configuration module for modguard.
//!
//! Loads configuration from environment variables (and `.env`).

use std::env;
use std::time::Duration;

use thiserror::Error;

use crate::events::antiflood::DEFAULT_FLOOD_WINDOW_SECS;
use crate::events::history::DEFAULT_HISTORY_LIMIT;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SettingsError {
    #[error("{name} is not a valid {expected}: {value:?}")]
    Invalid {
        name: &'static str,
        expected: &'static str,
        value: String,
    },
}

/// Engine tunables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Antiflood counting window.
    pub flood_window: Duration,
    /// Name history entries kept per user.
    pub history_limit: usize,
    /// Users that are global admins from their first event on.
    pub owner_ids: Vec<u64>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            flood_window: Duration::from_secs(DEFAULT_FLOOD_WINDOW_SECS),
            history_limit: DEFAULT_HISTORY_LIMIT,
            owner_ids: Vec::new(),
        }
    }
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// MongoDB connection string. Unset means in-memory storage.
    pub mongodb_uri: Option<String>,
    pub mongodb_database: String,

    /// Static `(group, user)` admin pairs for the admin lookup.
    pub group_admins: Vec<(i64, u64)>,

    pub settings: Settings,
}

impl Config {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, SettingsError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration from any variable source.
    pub fn from_lookup<F>(var: F) -> Result<Self, SettingsError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mongodb_uri = var("MONGODB_URI").filter(|s| !s.trim().is_empty());
        let mongodb_database = var("MONGODB_DATABASE")
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| "modguard".to_string());

        let owner_ids = match var("OWNER_IDS") {
            Some(raw) => parse_list(&raw, "OWNER_IDS", "comma-separated user ID list", |s| {
                s.parse::<u64>().ok().filter(|id| *id != 0)
            })?,
            None => Vec::new(),
        };

        let group_admins = match var("GROUP_ADMINS") {
            Some(raw) => parse_list(&raw, "GROUP_ADMINS", "list of group:user pairs", parse_pair)?,
            None => Vec::new(),
        };

        let flood_window = match var("FLOOD_WINDOW_SECS") {
            Some(raw) => Duration::from_secs(parse_positive(&raw, "FLOOD_WINDOW_SECS")?),
            None => Duration::from_secs(DEFAULT_FLOOD_WINDOW_SECS),
        };

        let history_limit = match var("HISTORY_LIMIT") {
            Some(raw) => parse_positive(&raw, "HISTORY_LIMIT")? as usize,
            None => DEFAULT_HISTORY_LIMIT,
        };

        Ok(Self {
            mongodb_uri,
            mongodb_database,
            group_admins,
            settings: Settings {
                flood_window,
                history_limit,
                owner_ids,
            },
        })
    }
}

fn parse_positive(raw: &str, name: &'static str) -> Result<u64, SettingsError> {
    raw.trim()
        .parse::<u64>()
        .ok()
        .filter(|n| *n > 0)
        .ok_or_else(|| SettingsError::Invalid {
            name,
            expected: "positive integer",
            value: raw.to_string(),
        })
}

fn parse_pair(item: &str) -> Option<(i64, u64)> {
    let (group, user) = item.split_once(':')?;
    let group = group.trim().parse::<i64>().ok().filter(|g| *g != 0)?;
    let user = user.trim().parse::<u64>().ok().filter(|u| *u != 0)?;
    Some((group, user))
}

fn parse_list<T>(
    raw: &str,
    name: &'static str,
    expected: &'static str,
    parse: impl Fn(&str) -> Option<T>,
) -> Result<Vec<T>, SettingsError> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|item| {
            parse(item).ok_or_else(|| SettingsError::Invalid {
                name,
                expected,
                value: item.to_string(),
            })
        })
        .collect()
}
