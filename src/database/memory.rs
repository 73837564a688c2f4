//! In-memory config store.
//!
//! Used when no MongoDB URI is configured, and as the store in tests.
//! Contents are lost on restart.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use tracing::debug;

use super::models::{GroupConfig, UserRecord};
use super::store::{ConfigStore, StoreError};

#[derive(Debug, Default)]
pub struct MemoryStore {
    groups: DashMap<i64, GroupConfig>,
    users: DashMap<u64, UserRecord>,
    offline: AtomicBool,
    writes: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate an outage: every call fails with `StoreError::Unavailable`.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Number of successful writes so far.
    pub fn write_count(&self) -> u64 {
        self.writes.load(Ordering::SeqCst)
    }

    fn ensure_online(&self) -> Result<(), StoreError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("memory store is offline".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl ConfigStore for MemoryStore {
    async fn get_group_config(&self, chat_id: i64) -> Result<Option<GroupConfig>, StoreError> {
        self.ensure_online()?;
        Ok(self.groups.get(&chat_id).map(|c| c.clone()))
    }

    async fn put_group_config(&self, config: &GroupConfig) -> Result<(), StoreError> {
        self.ensure_online()?;
        self.groups.insert(config.chat_id, config.clone());
        self.writes.fetch_add(1, Ordering::SeqCst);
        debug!("Stored group config for {}", config.chat_id);
        Ok(())
    }

    async fn get_user_record(&self, user_id: u64) -> Result<Option<UserRecord>, StoreError> {
        self.ensure_online()?;
        Ok(self.users.get(&user_id).map(|r| r.clone()))
    }

    async fn put_user_record(&self, record: &UserRecord) -> Result<(), StoreError> {
        self.ensure_online()?;
        self.users.insert(record.user_id, record.clone());
        self.writes.fetch_add(1, Ordering::SeqCst);
        debug!("Stored user record for {}", record.user_id);
        Ok(())
    }

    async fn find_user_by_username(
        &self,
        username: &str,
    ) -> Result<Option<UserRecord>, StoreError> {
        self.ensure_online()?;
        Ok(self
            .users
            .iter()
            .find(|r| r.value().has_used_username(username))
            .map(|r| r.value().clone()))
    }
}
