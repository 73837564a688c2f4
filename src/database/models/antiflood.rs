//! Antiflood penalty model.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Penalty applied when a member trips the flood guard.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum FloodPenalty {
    /// Restrict the member from sending messages
    #[default]
    Mute,
    /// Remove the member (can rejoin)
    Kick,
    /// Ban the member
    Ban,
}

impl fmt::Display for FloodPenalty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Mute => "mute",
            Self::Kick => "kick",
            Self::Ban => "ban",
        };
        f.write_str(name)
    }
}
