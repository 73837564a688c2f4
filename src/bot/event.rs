//! Incoming events.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::plugins::Command;

/// An event that cannot be processed as given.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("malformed event: {0}")]
    Malformed(String),
    #[error("event has no group id")]
    MissingChat,
    #[error("event has no actor id")]
    MissingActor,
    #[error("user {user_id} has an empty first name")]
    EmptyName { user_id: u64 },
    #[error("/{command} is missing its {field}")]
    MissingPayload {
        command: &'static str,
        field: &'static str,
    },
    #[error("/{command} {field} must be at most {max}")]
    OutOfRange {
        command: &'static str,
        field: &'static str,
        max: u64,
    },
}

/// The user an event or command is about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub user_id: u64,
    pub first_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

impl Actor {
    pub fn new(user_id: u64, first_name: &str) -> Self {
        Self {
            user_id,
            first_name: first_name.to_string(),
            last_name: None,
            username: None,
        }
    }

    pub fn with_last_name(mut self, last_name: &str) -> Self {
        self.last_name = Some(last_name.to_string());
        self
    }

    pub fn with_username(mut self, username: &str) -> Self {
        self.username = Some(username.trim_start_matches('@').to_string());
        self
    }

    /// First and last name joined by a space.
    pub fn full_name(&self) -> String {
        match &self.last_name {
            Some(last) if !last.is_empty() => format!("{} {}", self.first_name, last),
            _ => self.first_name.clone(),
        }
    }

    /// Name used in replies and log lines, e.g. `Ann (@ann)`.
    pub fn label(&self) -> String {
        match &self.username {
            Some(username) => format!("{} (@{})", self.full_name(), username),
            None => format!("{} [{}]", self.full_name(), self.user_id),
        }
    }

    pub(crate) fn validate(&self) -> Result<(), ValidationError> {
        if self.user_id == 0 {
            return Err(ValidationError::MissingActor);
        }
        if self.first_name.trim().is_empty() {
            return Err(ValidationError::EmptyName {
                user_id: self.user_id,
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EventKind {
    Message { text: String },
    MemberJoined,
    MemberLeft,
    Command { command: Command },
}

/// One unit of work for the dispatcher.
///
/// For `member_joined` and `member_left` the actor is the member who joined
/// or left.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModerationEvent {
    pub chat_id: i64,
    pub actor: Actor,
    pub at: DateTime<Utc>,
    #[serde(flatten)]
    pub kind: EventKind,
}

impl ModerationEvent {
    pub fn new(chat_id: i64, actor: Actor, at: DateTime<Utc>, kind: EventKind) -> Self {
        Self {
            chat_id,
            actor,
            at,
            kind,
        }
    }

    pub fn message(chat_id: i64, actor: Actor, at: DateTime<Utc>, text: &str) -> Self {
        Self::new(
            chat_id,
            actor,
            at,
            EventKind::Message {
                text: text.to_string(),
            },
        )
    }

    pub fn command(chat_id: i64, actor: Actor, at: DateTime<Utc>, command: Command) -> Self {
        Self::new(chat_id, actor, at, EventKind::Command { command })
    }

    /// Parse one event from its JSON form.
    pub fn from_json(line: &str) -> Result<Self, ValidationError> {
        serde_json::from_str(line).map_err(|e| ValidationError::Malformed(e.to_string()))
    }

    /// Reject events missing something the pipeline needs.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.chat_id == 0 {
            return Err(ValidationError::MissingChat);
        }
        self.actor.validate()?;

        if let EventKind::Command { command } = &self.kind {
            command.validate()?;
        }
        Ok(())
    }
}
