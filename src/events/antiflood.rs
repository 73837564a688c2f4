//! Antiflood guard.
//!
//! Fixed-window message counter per (group, user). O(1) memory per active
//! user; bursts straddling a window boundary are tolerated. State is
//! in-memory only and starts over on restart.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use tracing::debug;

use crate::database::GroupConfig;

/// Default flood window, matching the `/setflood` help text.
pub const DEFAULT_FLOOD_WINDOW_SECS: u64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FloodVerdict {
    Ok,
    Triggered,
}

/// Counter for one (group, user) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FloodState {
    pub window_start: DateTime<Utc>,
    pub count: u32,
}

/// Flood tracker shared by all event tasks.
///
/// Each (group, user) entry is updated under its dashmap shard lock, so the
/// reset/increment/compare sequence is atomic per pair while other pairs
/// proceed in parallel.
#[derive(Clone)]
pub struct FloodGuard {
    window: Duration,
    data: Arc<DashMap<(i64, u64), FloodState>>,
}

impl FloodGuard {
    pub fn new(window: std::time::Duration) -> Self {
        let window = Duration::from_std(window)
            .unwrap_or_else(|_| Duration::seconds(DEFAULT_FLOOD_WINDOW_SECS as i64));

        Self {
            window,
            data: Arc::new(DashMap::new()),
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Count one message from `user_id` and decide whether it is flooding.
    ///
    /// A trip resets the window, so the next message starts a fresh count
    /// instead of tripping again. The count cannot be taken back, so callers
    /// only check once the message's other effects are committed.
    pub fn check(&self, config: &GroupConfig, user_id: u64, now: DateTime<Utc>) -> FloodVerdict {
        if config.flood_threshold == 0 {
            return FloodVerdict::Ok;
        }

        let mut state = self
            .data
            .entry((config.chat_id, user_id))
            .or_insert(FloodState {
                window_start: now,
                count: 0,
            });

        if now - state.window_start > self.window {
            state.window_start = now;
            state.count = 0;
        }

        state.count += 1;

        if state.count > config.flood_threshold {
            debug!(
                "User {} tripped flood guard in chat {} ({} > {})",
                user_id, config.chat_id, state.count, config.flood_threshold
            );
            state.window_start = now;
            state.count = 0;
            return FloodVerdict::Triggered;
        }

        FloodVerdict::Ok
    }

    /// Forget a user's counter in one group.
    pub fn reset(&self, chat_id: i64, user_id: u64) {
        self.data.remove(&(chat_id, user_id));
    }

    /// Drop every counter whose window had expired by `now`, measured in
    /// event time. Returns how many were removed.
    pub fn prune(&self, now: DateTime<Utc>) -> usize {
        let before = self.data.len();
        self.data.retain(|_, state| now - state.window_start <= self.window);
        before.saturating_sub(self.data.len())
    }

    /// Current counter for a pair, if tracked.
    pub fn state(&self, chat_id: i64, user_id: u64) -> Option<FloodState> {
        self.data.get(&(chat_id, user_id)).map(|s| *s)
    }

}

impl Default for FloodGuard {
    fn default() -> Self {
        Self::new(std::time::Duration::from_secs(DEFAULT_FLOOD_WINDOW_SECS))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    fn config(threshold: u32) -> GroupConfig {
        let mut config = GroupConfig::new(-1);
        config.flood_threshold = threshold;
        config
    }

    #[test]
    fn test_threshold_then_trigger_once_then_fresh_window() {
        let guard = FloodGuard::default();
        let config = config(3);

        for i in 0..3 {
            assert_eq!(guard.check(&config, 7, at(i)), FloodVerdict::Ok);
        }
        assert_eq!(guard.check(&config, 7, at(3)), FloodVerdict::Triggered);

        // The next message starts a new window at count 1, not 5.
        assert_eq!(guard.check(&config, 7, at(4)), FloodVerdict::Ok);
        assert_eq!(guard.state(-1, 7).unwrap().count, 1);
    }

    #[test]
    fn test_disabled_when_threshold_zero() {
        let guard = FloodGuard::default();
        let config = config(0);

        for _ in 0..100 {
            assert_eq!(guard.check(&config, 7, at(0)), FloodVerdict::Ok);
        }
        assert!(guard.state(-1, 7).is_none());
    }

    #[test]
    fn test_window_expiry_resets_count() {
        let guard = FloodGuard::default();
        let config = config(2);

        assert_eq!(guard.check(&config, 7, at(0)), FloodVerdict::Ok);
        assert_eq!(guard.check(&config, 7, at(1)), FloodVerdict::Ok);
        // 11s later the old window is gone.
        assert_eq!(guard.check(&config, 7, at(12)), FloodVerdict::Ok);
        assert_eq!(guard.state(-1, 7).unwrap().count, 1);
    }

    #[test]
    fn test_users_and_groups_are_independent() {
        let guard = FloodGuard::default();
        let a = config(1);
        let mut b = config(1);
        b.chat_id = -2;

        assert_eq!(guard.check(&a, 1, at(0)), FloodVerdict::Ok);
        assert_eq!(guard.check(&a, 2, at(0)), FloodVerdict::Ok);
        assert_eq!(guard.check(&b, 1, at(0)), FloodVerdict::Ok);
        assert_eq!(guard.check(&a, 1, at(0)), FloodVerdict::Triggered);
    }

    #[test]
    fn test_prune_drops_expired() {
        let guard = FloodGuard::default();
        let config = config(5);
        guard.check(&config, 1, at(0));
        guard.check(&config, 2, at(8));

        assert_eq!(guard.prune(at(15)), 1);
        assert!(guard.state(-1, 1).is_none());
        assert!(guard.state(-1, 2).is_some());
    }

    #[test]
    fn test_concurrent_same_pair_counts_every_message() {
        let guard = FloodGuard::new(std::time::Duration::from_secs(3600));
        let config = config(1_000_000);

        std::thread::scope(|s| {
            for _ in 0..8 {
                s.spawn(|| {
                    for _ in 0..500 {
                        guard.check(&config, 9, at(0));
                    }
                });
            }
        });

        assert_eq!(guard.state(-1, 9).unwrap().count, 4000);
    }
}
