//! Per-key versioned state for group configs and user records.
//!
//! Each key owns a [`Slot`]: the current value plus a revision counter
//! behind a short-lived mutex. The mutex is only taken to clone or swap the
//! value, never across store I/O. Writers follow
//! snapshot → mutate a clone → persist → install-if-unchanged, and retry on
//! the fresh value when another writer got there first. Different keys never
//! contend with each other.
//!
//! Every holder of a key must share the same slot, so slots live in a plain
//! `DashMap` and are only evicted once nothing outside the map holds them.

use std::fmt::Display;
use std::hash::Hash;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use parking_lot::Mutex;
use thiserror::Error;
use tracing::{debug, warn};

use crate::cache::CacheConfig;
use crate::database::{ConfigStore, GroupConfig, StoreError, UserRecord};

/// Attempts before a commit gives up with [`CommitError::Contention`].
pub const MAX_COMMIT_ATTEMPTS: usize = 8;

#[derive(Debug, Error)]
pub enum CommitError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("too many concurrent updates to {kind} {key}")]
    Contention { kind: &'static str, key: String },
}

/// A value that is loaded from and persisted to the config store.
#[async_trait]
pub trait Record: Clone + PartialEq + Send + Sync + 'static {
    type Key: Copy + Hash + Eq + Display + Send + Sync + 'static;

    /// Short name used in logs and errors.
    const KIND: &'static str;

    async fn fetch(store: &dyn ConfigStore, key: Self::Key) -> Result<Option<Self>, StoreError>;

    async fn persist(&self, store: &dyn ConfigStore) -> Result<(), StoreError>;
}

#[async_trait]
impl Record for GroupConfig {
    type Key = i64;
    const KIND: &'static str = "group";

    async fn fetch(store: &dyn ConfigStore, key: i64) -> Result<Option<Self>, StoreError> {
        store.get_group_config(key).await
    }

    async fn persist(&self, store: &dyn ConfigStore) -> Result<(), StoreError> {
        store.put_group_config(self).await
    }
}

#[async_trait]
impl Record for UserRecord {
    type Key = u64;
    const KIND: &'static str = "user";

    async fn fetch(store: &dyn ConfigStore, key: u64) -> Result<Option<Self>, StoreError> {
        store.get_user_record(key).await
    }

    async fn persist(&self, store: &dyn ConfigStore) -> Result<(), StoreError> {
        store.put_user_record(self).await
    }
}

struct Versioned<T> {
    value: T,
    revision: u64,
    touched: Instant,
}

/// Shared handle to one key's current value.
pub struct Slot<T>(Arc<Mutex<Versioned<T>>>);

impl<T> Clone for Slot<T> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<T: Clone> Slot<T> {
    fn new(value: T) -> Self {
        Self(Arc::new(Mutex::new(Versioned {
            value,
            revision: 0,
            touched: Instant::now(),
        })))
    }

    /// Copy of the current value. Never observes a half-applied update.
    pub fn snapshot(&self) -> T {
        self.0.lock().value.clone()
    }

    fn versioned(&self) -> (T, u64) {
        let guard = self.0.lock();
        (guard.value.clone(), guard.revision)
    }

    /// Swap in `value` if nobody committed since `revision` was read.
    fn install(&self, revision: u64, value: T) -> bool {
        let mut guard = self.0.lock();
        if guard.revision != revision {
            return false;
        }
        guard.value = value;
        guard.revision += 1;
        true
    }

    fn touch(&self) {
        self.0.lock().touched = Instant::now();
    }

    fn idle_for(&self) -> Duration {
        self.0.lock().touched.elapsed()
    }

    /// Whether anything besides the owning map holds this slot.
    fn in_use(&self) -> bool {
        Arc::strong_count(&self.0) > 1
    }

    #[cfg(test)]
    fn same_as(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

/// Keyed collection of slots backed by the config store.
pub struct KeyedState<T: Record> {
    name: Arc<str>,
    slots: DashMap<T::Key, Slot<T>>,
    store: Arc<dyn ConfigStore>,
    max_capacity: usize,
    idle: Option<Duration>,
    /// Bumped before every eviction pass; a load that started under an older
    /// value may be stale and is redone.
    evictions: AtomicU64,
}

impl<T: Record> KeyedState<T> {
    pub fn new(name: &str, config: CacheConfig, store: Arc<dyn ConfigStore>) -> Self {
        Self {
            name: name.into(),
            slots: DashMap::new(),
            store,
            max_capacity: usize::try_from(config.max_capacity).unwrap_or(usize::MAX),
            idle: config.tti,
            evictions: AtomicU64::new(0),
        }
    }

    pub fn store(&self) -> &Arc<dyn ConfigStore> {
        &self.store
    }

    /// Get the slot for `key`, loading it from the store on first use.
    ///
    /// A key unknown to the store gets `seed()` as its initial value; it is
    /// only written back once a commit changes it.
    pub async fn resolve<F>(&self, key: T::Key, seed: F) -> Result<Slot<T>, StoreError>
    where
        F: Fn() -> T + Send,
    {
        loop {
            if let Some(slot) = self.slots.get(&key) {
                slot.touch();
                return Ok(slot.clone());
            }

            let epoch = self.evictions.load(Ordering::SeqCst);
            let value = match T::fetch(self.store.as_ref(), key).await? {
                Some(value) => value,
                None => {
                    debug!("No stored {} {}, starting from defaults", T::KIND, key);
                    seed()
                }
            };

            match self.slots.entry(key) {
                Entry::Occupied(entry) => return Ok(entry.get().clone()),
                Entry::Vacant(entry) if self.evictions.load(Ordering::SeqCst) == epoch => {
                    return Ok(entry.insert(Slot::new(value)).clone());
                }
                Entry::Vacant(_) => {
                    debug!("Eviction overlapped load of {} {}, reloading", T::KIND, key);
                }
            }
        }
    }

    /// Drop slots nobody is using.
    ///
    /// Slots idle for longer than the configured idle time go first. If the
    /// map is still over capacity, every unused slot goes. A slot that is
    /// still held is never dropped, so all holders of a key keep sharing one
    /// slot. Returns how many slots were dropped.
    pub fn evict_idle(&self) -> usize {
        self.evictions.fetch_add(1, Ordering::SeqCst);
        let before = self.slots.len();

        if let Some(idle) = self.idle {
            self.slots.retain(|_, slot| slot.in_use() || slot.idle_for() < idle);
        }
        if self.slots.len() > self.max_capacity {
            self.slots.retain(|_, slot| slot.in_use());
        }

        let evicted = before.saturating_sub(self.slots.len());
        if evicted > 0 {
            debug!("Evicted {} unused slots from {}", evicted, self.name);
        }
        evicted
    }

    /// Apply `mutate` to the slot's value and persist the result.
    ///
    /// `mutate` runs on a private copy and may run more than once if other
    /// writers race on the same key, so it must be free of side effects.
    /// An `Err` from `mutate` is returned as-is with nothing written. The
    /// slot only changes after the store accepted the new value.
    pub async fn commit<R, E, F>(
        &self,
        key: T::Key,
        slot: &Slot<T>,
        mut mutate: F,
    ) -> Result<Result<R, E>, CommitError>
    where
        F: FnMut(&mut T) -> Result<R, E> + Send,
        R: Send,
        E: Send,
    {
        for attempt in 1..=MAX_COMMIT_ATTEMPTS {
            let (current, revision) = slot.versioned();
            let mut next = current.clone();

            let outcome = match mutate(&mut next) {
                Ok(outcome) => outcome,
                Err(e) => return Ok(Err(e)),
            };

            if next == current {
                return Ok(Ok(outcome));
            }

            next.persist(self.store.as_ref()).await?;

            if slot.install(revision, next) {
                return Ok(Ok(outcome));
            }

            debug!(
                "Commit to {} {} raced with another writer (attempt {})",
                T::KIND,
                key,
                attempt
            );
        }

        warn!("Giving up on {} {} after {} attempts", T::KIND, key, MAX_COMMIT_ATTEMPTS);
        Err(CommitError::Contention {
            kind: T::KIND,
            key: key.to_string(),
        })
    }
}
