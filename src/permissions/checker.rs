//! Permission gate.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::database::UserRecord;

/// Who may run an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionLevel {
    Anyone,
    GroupAdmin,
    GlobalAdmin,
}

/// The transport could not tell whether a user is a group admin.
#[derive(Debug, Clone, Error)]
#[error("admin lookup failed for user {user_id} in chat {chat_id}: {reason}")]
pub struct LookupError {
    pub chat_id: i64,
    pub user_id: u64,
    pub reason: String,
}

/// Group admin lists are owned by the chat platform; the transport layer
/// answers this on the engine's behalf.
#[async_trait]
pub trait AdminLookup: Send + Sync {
    async fn is_group_admin(&self, chat_id: i64, user_id: u64) -> Result<bool, LookupError>;
}

/// Fixed set of (chat, user) admin pairs.
#[derive(Debug, Clone, Default)]
pub struct StaticAdminLookup {
    admins: HashSet<(i64, u64)>,
}

impl StaticAdminLookup {
    pub fn new(admins: impl IntoIterator<Item = (i64, u64)>) -> Self {
        Self {
            admins: admins.into_iter().collect(),
        }
    }
}

#[async_trait]
impl AdminLookup for StaticAdminLookup {
    async fn is_group_admin(&self, chat_id: i64, user_id: u64) -> Result<bool, LookupError> {
        Ok(self.admins.contains(&(chat_id, user_id)))
    }
}

/// Decides whether an actor may run an action in a group.
///
/// Nothing is cached: admin lists can change on the platform at any time.
/// A failed lookup is returned as an error and never treated as allowed.
#[derive(Clone)]
pub struct PermissionGate {
    lookup: Arc<dyn AdminLookup>,
}

impl PermissionGate {
    pub fn new(lookup: Arc<dyn AdminLookup>) -> Self {
        Self { lookup }
    }

    pub async fn authorize(
        &self,
        actor: &UserRecord,
        chat_id: i64,
        required: PermissionLevel,
    ) -> Result<bool, LookupError> {
        if actor.global_admin {
            debug!("User {} is global admin, granting {:?}", actor.user_id, required);
            return Ok(true);
        }

        match required {
            PermissionLevel::Anyone => Ok(true),
            PermissionLevel::GlobalAdmin => Ok(false),
            PermissionLevel::GroupAdmin => self
                .lookup
                .is_group_admin(chat_id, actor.user_id)
                .await
                .inspect_err(|e| warn!("Denying by default: {}", e)),
        }
    }
}
