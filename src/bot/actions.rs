//! Actions the engine asks the transport to carry out.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    Reply {
        chat_id: i64,
        text: String,
    },
    Mute {
        chat_id: i64,
        user_id: u64,
        /// `None` mutes until an admin unmutes.
        until: Option<DateTime<Utc>>,
    },
    Unmute {
        chat_id: i64,
        user_id: u64,
    },
    Kick {
        chat_id: i64,
        user_id: u64,
    },
    Ban {
        chat_id: i64,
        user_id: u64,
        until: Option<DateTime<Utc>>,
    },
    Unban {
        chat_id: i64,
        user_id: u64,
    },
    Log {
        channel: i64,
        text: String,
    },
    /// A group config edit that has already been persisted.
    ConfigChanged {
        chat_id: i64,
        change: String,
    },
}

impl Action {
    /// Mute, unmute, kick, ban or unban.
    pub fn is_moderation(&self) -> bool {
        matches!(
            self,
            Action::Mute { .. }
                | Action::Unmute { .. }
                | Action::Kick { .. }
                | Action::Ban { .. }
                | Action::Unban { .. }
        )
    }
}

/// Ordered action list for one event.
///
/// With a log channel set, every moderation action is immediately followed
/// by its log line.
#[derive(Debug, Default)]
pub struct ActionList {
    log_channel: Option<i64>,
    actions: Vec<Action>,
}

impl ActionList {
    pub fn new(log_channel: Option<i64>) -> Self {
        Self {
            log_channel,
            actions: Vec::new(),
        }
    }

    pub fn reply(&mut self, chat_id: i64, text: impl Into<String>) {
        self.actions.push(Action::Reply {
            chat_id,
            text: text.into(),
        });
    }

    pub fn config_changed(&mut self, chat_id: i64, change: impl Into<String>) {
        self.actions.push(Action::ConfigChanged {
            chat_id,
            change: change.into(),
        });
    }

    /// Push a moderation action and, if logging is on, its log line.
    pub fn moderate(&mut self, action: Action, log_text: impl Into<String>) {
        debug_assert!(action.is_moderation());
        self.actions.push(action);
        if let Some(channel) = self.log_channel {
            self.actions.push(Action::Log {
                channel,
                text: log_text.into(),
            });
        }
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn into_vec(self) -> Vec<Action> {
        self.actions
    }
}
