//! Cache configuration.

use std::time::Duration;

/// Configuration for a cache instance.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Maximum number of entries in the cache.
    pub max_capacity: u64,

    /// Time-to-live for cache entries.
    pub ttl: Option<Duration>,

    /// Time-to-idle for cache entries.
    /// Entries are evicted if not accessed within this duration.
    pub tti: Option<Duration>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_capacity: 10_000,
            ttl: None,
            tti: Some(Duration::from_secs(1800)),
        }
    }
}

impl CacheConfig {
    /// Group configuration slots.
    ///
    /// Idle-only expiry. Slots still held by an in-flight event are never
    /// evicted, whatever their age.
    pub fn group_configs() -> Self {
        Self {
            max_capacity: 10_000,
            ttl: None,
            tti: Some(Duration::from_secs(3600)), // 1 hour idle
        }
    }

    /// User record slots. Many more users than groups, shorter idle window.
    pub fn user_records() -> Self {
        Self {
            max_capacity: 100_000,
            ttl: None,
            tti: Some(Duration::from_secs(1800)), // 30 minutes idle
        }
    }

    /// Compiled filter matchers, keyed by normalized keyword.
    pub fn filter_matchers() -> Self {
        Self {
            max_capacity: 20_000,
            ttl: None,
            tti: Some(Duration::from_secs(600)), // 10 minutes idle
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_presets_never_use_ttl() {
        assert!(CacheConfig::group_configs().ttl.is_none());
        assert!(CacheConfig::user_records().ttl.is_none());
    }

    #[test]
    fn test_user_slots_outnumber_group_slots() {
        assert!(CacheConfig::user_records().max_capacity > CacheConfig::group_configs().max_capacity);
    }
}
