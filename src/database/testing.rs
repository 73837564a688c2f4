//! Store wrapper for exercising concurrent and cancelled writes in tests.

use std::ops::Deref;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;

use super::memory::MemoryStore;
use super::models::{GroupConfig, UserRecord};
use super::store::{ConfigStore, StoreError};

/// [`MemoryStore`] whose writes can be made to yield or to never finish.
#[derive(Debug, Default)]
pub(crate) struct GatedStore {
    inner: MemoryStore,
    yield_writes: AtomicBool,
    stall_writes: AtomicBool,
}

impl GatedStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Yield to the scheduler before every write so concurrent commits interleave.
    pub(crate) fn set_yield_writes(&self, enabled: bool) {
        self.yield_writes.store(enabled, Ordering::SeqCst);
    }

    /// Park every write forever, until the caller gives up on it.
    pub(crate) fn set_stall_writes(&self, enabled: bool) {
        self.stall_writes.store(enabled, Ordering::SeqCst);
    }

    async fn gate(&self) {
        if self.stall_writes.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        if self.yield_writes.load(Ordering::SeqCst) {
            tokio::task::yield_now().await;
        }
    }
}

impl Deref for GatedStore {
    type Target = MemoryStore;

    fn deref(&self) -> &MemoryStore {
        &self.inner
    }
}

#[async_trait]
impl ConfigStore for GatedStore {
    async fn get_group_config(&self, chat_id: i64) -> Result<Option<GroupConfig>, StoreError> {
        self.inner.get_group_config(chat_id).await
    }

    async fn put_group_config(&self, config: &GroupConfig) -> Result<(), StoreError> {
        self.gate().await;
        self.inner.put_group_config(config).await
    }

    async fn get_user_record(&self, user_id: u64) -> Result<Option<UserRecord>, StoreError> {
        self.inner.get_user_record(user_id).await
    }

    async fn put_user_record(&self, record: &UserRecord) -> Result<(), StoreError> {
        self.gate().await;
        self.inner.put_user_record(record).await
    }

    async fn find_user_by_username(
        &self,
        username: &str,
    ) -> Result<Option<UserRecord>, StoreError> {
        self.inner.find_user_by_username(username).await
    }
}
