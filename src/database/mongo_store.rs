//! MongoDB-backed config store.
//!
//! Group configs live in `group_configs` keyed by `chat_id`, user records in
//! `users` keyed by `user_id`. Writes are whole-document upserts.

use async_trait::async_trait;
use mongodb::bson::doc;
use mongodb::options::ReplaceOptions;
use mongodb::Collection;
use tracing::debug;

use super::models::{GroupConfig, UserRecord};
use super::store::{ConfigStore, StoreError};
use super::Database;

pub struct MongoStore {
    groups: Collection<GroupConfig>,
    users: Collection<UserRecord>,
}

impl MongoStore {
    pub fn new(db: &Database) -> Self {
        Self {
            groups: db.collection("group_configs"),
            users: db.collection("users"),
        }
    }

    fn upsert() -> ReplaceOptions {
        ReplaceOptions::builder().upsert(true).build()
    }
}

#[async_trait]
impl ConfigStore for MongoStore {
    async fn get_group_config(&self, chat_id: i64) -> Result<Option<GroupConfig>, StoreError> {
        let filter = doc! { "chat_id": chat_id };
        let result = self.groups.find_one(filter).await?;
        debug!("DB get group config for {}: {:?}", chat_id, result.is_some());
        Ok(result)
    }

    async fn put_group_config(&self, config: &GroupConfig) -> Result<(), StoreError> {
        let filter = doc! { "chat_id": config.chat_id };
        self.groups
            .replace_one(filter, config)
            .with_options(Self::upsert())
            .await?;

        debug!("Saved group config for {}", config.chat_id);
        Ok(())
    }

    async fn get_user_record(&self, user_id: u64) -> Result<Option<UserRecord>, StoreError> {
        let filter = doc! { "user_id": user_id as i64 };
        Ok(self.users.find_one(filter).await?)
    }

    async fn put_user_record(&self, record: &UserRecord) -> Result<(), StoreError> {
        let filter = doc! { "user_id": record.user_id as i64 };
        self.users
            .replace_one(filter, record)
            .with_options(Self::upsert())
            .await?;

        debug!("Saved user record for {}", record.user_id);
        Ok(())
    }

    async fn find_user_by_username(
        &self,
        username: &str,
    ) -> Result<Option<UserRecord>, StoreError> {
        let pattern = format!("^{}$", regex::escape(username.trim_start_matches('@')));
        let filter = doc! {
            "history.username": { "$regex": pattern, "$options": "i" }
        };
        Ok(self.users.find_one(filter).await?)
    }
}
