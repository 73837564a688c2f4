//! Config store contract.
//!
//! The engine only depends on this trait; MongoDB and in-memory backends
//! implement it. Implementations must give a single caller
//! read-your-writes consistency and handle their own retries.

use async_trait::async_trait;
use thiserror::Error;

use super::models::{GroupConfig, UserRecord};

/// Store failures. All of them leave the event safe to retry.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] mongodb::error::Error),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait ConfigStore: Send + Sync {
    async fn get_group_config(&self, chat_id: i64) -> Result<Option<GroupConfig>, StoreError>;

    /// Upsert the whole config document.
    async fn put_group_config(&self, config: &GroupConfig) -> Result<(), StoreError>;

    async fn get_user_record(&self, user_id: u64) -> Result<Option<UserRecord>, StoreError>;

    /// Upsert the whole user record.
    async fn put_user_record(&self, record: &UserRecord) -> Result<(), StoreError>;

    /// Find a user by any username recorded in their history (case-insensitive).
    async fn find_user_by_username(&self, username: &str)
        -> Result<Option<UserRecord>, StoreError>;
}
