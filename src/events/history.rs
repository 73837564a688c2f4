//! Name history tracking.
//!
//! Every observed user gets a bounded, append-only log of the display
//! names and usernames they were seen with. A new entry is written only when
//! the name pair differs from the newest entry.

use std::convert::Infallible;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::bot::Actor;
use crate::cache::CacheConfig;
use crate::database::{ConfigStore, HistoryEntry, StoreError, UserRecord};
use crate::state::{CommitError, KeyedState, Slot};

/// Default number of history entries kept per user.
pub const DEFAULT_HISTORY_LIMIT: usize = 20;

/// Owns the user records: history, global-admin flags.
pub struct HistoryTracker {
    users: KeyedState<UserRecord>,
    limit: usize,
    owner_ids: Vec<u64>,
}

impl HistoryTracker {
    /// `owner_ids` are flagged global admin when their record is first created.
    pub fn new(store: Arc<dyn ConfigStore>, limit: usize, owner_ids: Vec<u64>) -> Self {
        Self {
            users: KeyedState::new("user_records", CacheConfig::user_records(), store),
            limit: limit.max(1),
            owner_ids,
        }
    }

    /// Get or create the record slot for a user.
    pub async fn resolve(&self, user_id: u64) -> Result<Slot<UserRecord>, StoreError> {
        let is_owner = self.owner_ids.contains(&user_id);
        self.users
            .resolve(user_id, move || {
                let mut record = UserRecord::new(user_id);
                record.global_admin = is_owner;
                record
            })
            .await
    }

    /// Append a history entry if the observed names differ from the newest one.
    ///
    /// Returns whether an entry was appended.
    pub fn record_if_changed(
        &self,
        record: &mut UserRecord,
        display_name: &str,
        username: Option<&str>,
        now: DateTime<Utc>,
    ) -> bool {
        if let Some(latest) = record.latest()
            && latest.describes(display_name, username)
        {
            return false;
        }

        record.push_bounded(
            HistoryEntry {
                display_name: display_name.to_string(),
                username: username.map(str::to_string),
                observed_at: now,
            },
            self.limit,
        );
        true
    }

    /// Record the actor's current names, persisting only on change.
    pub async fn observe(
        &self,
        slot: &Slot<UserRecord>,
        actor: &Actor,
        now: DateTime<Utc>,
    ) -> Result<bool, CommitError> {
        let display_name = actor.full_name();
        let username = actor.username.as_deref();

        let Ok(changed) = self
            .users
            .commit(actor.user_id, slot, |record| {
                Ok::<_, Infallible>(self.record_if_changed(record, &display_name, username, now))
            })
            .await?;

        if changed {
            debug!("Recorded new name for user {}: {}", actor.user_id, display_name);
        }
        Ok(changed)
    }

    /// Name history for a user, oldest first.
    pub async fn query_history(&self, user_id: u64) -> Result<Vec<HistoryEntry>, StoreError> {
        let slot = self.resolve(user_id).await?;
        Ok(slot.snapshot().history.into_iter().collect())
    }

    /// Look a user up by any username in their history.
    ///
    /// Returns the user ID and history, preferring the in-process copy over
    /// the stored one.
    pub async fn find_by_username(
        &self,
        username: &str,
    ) -> Result<Option<(u64, Vec<HistoryEntry>)>, StoreError> {
        let found = self.users.store().find_user_by_username(username).await?;
        match found {
            Some(record) => {
                let history = self.query_history(record.user_id).await?;
                Ok(Some((record.user_id, history)))
            }
            None => Ok(None),
        }
    }

    /// Release cached user records that no event is using.
    pub fn evict_idle(&self) -> usize {
        self.users.evict_idle()
    }

    /// Grant or revoke global admin. Returns whether the flag changed.
    pub async fn set_global_admin(&self, user_id: u64, enabled: bool) -> Result<bool, CommitError> {
        let slot = self.resolve(user_id).await?;
        let Ok(changed) = self
            .users
            .commit(user_id, &slot, |record| {
                let changed = record.global_admin != enabled;
                record.global_admin = enabled;
                Ok::<_, Infallible>(changed)
            })
            .await?;

        if changed {
            info!("Global admin for user {} set to {}", user_id, enabled);
        }
        Ok(changed)
    }
}
