//! Command handlers.
//!
//! Add new commands by:
//! 1. Adding a variant to [`Command`] with its payload
//! 2. Giving it a name, a permission level and payload checks
//! 3. Routing it to a handler module in [`execute`]
//!
//! Handlers only run after the permission gate allowed the actor. Group
//! config edits go through [`CommandContext::edit`], which persists before
//! the in-process copy changes.

pub mod admin;
pub mod antiflood;
pub mod ban;
pub mod filters;
pub mod history;
pub mod logchannel;
pub mod mute;
pub mod start;
pub mod welcome;

use serde::{Deserialize, Serialize};

use crate::bot::{ActionList, Actor, Dispatcher, EngineError, ModerationEvent, ValidationError};
use crate::database::{FloodPenalty, GroupConfig};
use crate::permissions::PermissionLevel;
use crate::state::Slot;
use crate::utils::MAX_DURATION_SECS;

use welcome::Greeting;

/// Parsed command with its payload. Parsing command text is up to the
/// transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "name", rename_all = "lowercase")]
pub enum Command {
    Start,
    Help,
    About,

    // Welcome / goodbye
    Welcome { enabled: bool },
    Goodbye { enabled: bool },
    SetWelcome { text: String },
    SetGoodbye { text: String },

    // Antiflood
    SetFlood { threshold: u32 },
    SetFloodPenalty {
        penalty: FloodPenalty,
        /// 0 is indefinite. Ignored for kick.
        #[serde(default)]
        duration_secs: u64,
    },

    // Filters
    AddFilter { keyword: String, response: String },
    DelFilter { keyword: String },
    Filters,

    // Log channel
    SetLog { channel: i64 },
    UnsetLog,
    LogStatus,

    // Moderation
    Ban { target: Actor },
    Unban { target: Actor },
    Kick { target: Actor },
    Mute {
        target: Actor,
        #[serde(default)]
        duration_secs: Option<u64>,
    },
    Unmute { target: Actor },

    /// Own history, or that of whoever used `username`.
    History {
        #[serde(default)]
        username: Option<String>,
    },

    // Global admin management
    Promote { target: Actor },
    Demote { target: Actor },
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::Start => "start",
            Command::Help => "help",
            Command::About => "about",
            Command::Welcome { .. } => "welcome",
            Command::Goodbye { .. } => "goodbye",
            Command::SetWelcome { .. } => "setwelcome",
            Command::SetGoodbye { .. } => "setgoodbye",
            Command::SetFlood { .. } => "setflood",
            Command::SetFloodPenalty { .. } => "setfloodpenalty",
            Command::AddFilter { .. } => "addfilter",
            Command::DelFilter { .. } => "delfilter",
            Command::Filters => "filters",
            Command::SetLog { .. } => "setlog",
            Command::UnsetLog => "unsetlog",
            Command::LogStatus => "logstatus",
            Command::Ban { .. } => "ban",
            Command::Unban { .. } => "unban",
            Command::Kick { .. } => "kick",
            Command::Mute { .. } => "mute",
            Command::Unmute { .. } => "unmute",
            Command::History { .. } => "history",
            Command::Promote { .. } => "promote",
            Command::Demote { .. } => "demote",
        }
    }

    /// Level the actor needs to run this command.
    pub fn required_level(&self) -> PermissionLevel {
        match self {
            Command::Start
            | Command::Help
            | Command::About
            | Command::Filters
            | Command::LogStatus
            | Command::History { .. } => PermissionLevel::Anyone,
            Command::Promote { .. } | Command::Demote { .. } => PermissionLevel::GlobalAdmin,
            _ => PermissionLevel::GroupAdmin,
        }
    }

    /// Check the payload carries everything the handler needs.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let missing = |field| ValidationError::MissingPayload {
            command: self.name(),
            field,
        };
        let too_long = || ValidationError::OutOfRange {
            command: self.name(),
            field: "duration_secs",
            max: MAX_DURATION_SECS,
        };

        match self {
            Command::SetWelcome { text } | Command::SetGoodbye { text } if text.trim().is_empty() => {
                Err(missing("text"))
            }
            Command::AddFilter { keyword, .. } | Command::DelFilter { keyword }
                if keyword.trim().is_empty() =>
            {
                Err(missing("keyword"))
            }
            Command::AddFilter { response, .. } if response.trim().is_empty() => {
                Err(missing("response"))
            }
            Command::SetLog { channel: 0 } => Err(missing("channel")),
            Command::SetFloodPenalty { duration_secs, .. } if *duration_secs > MAX_DURATION_SECS => {
                Err(too_long())
            }
            Command::Mute {
                duration_secs: Some(secs),
                ..
            } if *secs > MAX_DURATION_SECS => Err(too_long()),
            Command::History {
                username: Some(username),
            } if username.trim().trim_start_matches('@').is_empty() => Err(missing("username")),
            Command::Ban { target }
            | Command::Unban { target }
            | Command::Kick { target }
            | Command::Mute { target, .. }
            | Command::Unmute { target }
            | Command::Promote { target }
            | Command::Demote { target } => target.validate().map_err(|_| missing("target")),
            _ => Ok(()),
        }
    }
}

/// Everything a handler needs for one command invocation.
pub struct CommandContext<'a> {
    pub state: &'a Dispatcher,
    pub event: &'a ModerationEvent,
    pub group: &'a Slot<GroupConfig>,
}

impl CommandContext<'_> {
    pub fn chat_id(&self) -> i64 {
        self.event.chat_id
    }

    pub fn actor(&self) -> &Actor {
        &self.event.actor
    }

    /// Apply `mutate` to this group's config and persist it.
    ///
    /// The inner `Err` is a rejected edit; nothing was written.
    pub async fn edit<R, E, F>(&self, mutate: F) -> Result<Result<R, E>, EngineError>
    where
        F: FnMut(&mut GroupConfig) -> Result<R, E> + Send,
        R: Send,
        E: Send,
    {
        Ok(self.state.groups.commit(self.chat_id(), self.group, mutate).await?)
    }
}

/// Set `field` to `value`, returning whether it changed.
pub(crate) fn replace<T: PartialEq>(field: &mut T, value: T) -> bool {
    if *field == value {
        return false;
    }
    *field = value;
    true
}

/// Run an authorized command.
pub async fn execute(ctx: &CommandContext<'_>, command: &Command) -> Result<ActionList, EngineError> {
    let config = ctx.group.snapshot();
    let mut out = ActionList::new(config.log_channel);

    match command {
        Command::Start => start::start(ctx, &mut out),
        Command::Help => start::help(ctx, &mut out),
        Command::About => start::about(ctx, &mut out),

        Command::Welcome { enabled } => {
            welcome::toggle(ctx, Greeting::Welcome, *enabled, &mut out).await?
        }
        Command::Goodbye { enabled } => {
            welcome::toggle(ctx, Greeting::Goodbye, *enabled, &mut out).await?
        }
        Command::SetWelcome { text } => {
            welcome::set_template(ctx, Greeting::Welcome, text, &mut out).await?
        }
        Command::SetGoodbye { text } => {
            welcome::set_template(ctx, Greeting::Goodbye, text, &mut out).await?
        }

        Command::SetFlood { threshold } => antiflood::set_flood(ctx, *threshold, &mut out).await?,
        Command::SetFloodPenalty {
            penalty,
            duration_secs,
        } => antiflood::set_penalty(ctx, *penalty, *duration_secs, &mut out).await?,

        Command::AddFilter { keyword, response } => {
            filters::add(ctx, keyword, response, &mut out).await?
        }
        Command::DelFilter { keyword } => filters::remove(ctx, keyword, &mut out).await?,
        Command::Filters => filters::list(ctx, &config, &mut out),

        Command::SetLog { channel } => logchannel::set(ctx, *channel, &mut out).await?,
        Command::UnsetLog => logchannel::unset(ctx, &mut out).await?,
        Command::LogStatus => logchannel::status(ctx, &config, &mut out),

        Command::Ban { target } => ban::ban(ctx, target, &mut out).await?,
        Command::Unban { target } => ban::unban(ctx, target, &mut out).await?,
        Command::Kick { target } => ban::kick(ctx, target, &mut out),
        Command::Mute {
            target,
            duration_secs,
        } => mute::mute(ctx, target, *duration_secs, &mut out),
        Command::Unmute { target } => mute::unmute(ctx, target, &mut out),

        Command::History { username } => history::show(ctx, username.as_deref(), &mut out).await?,

        Command::Promote { target } => admin::promote(ctx, target, &mut out).await?,
        Command::Demote { target } => admin::demote(ctx, target, &mut out).await?,
    }

    Ok(out)
}
