//! Welcome and goodbye command handlers.

use std::convert::Infallible;

use tracing::info;

use super::{CommandContext, replace};
use crate::bot::{ActionList, EngineError};
use crate::database::GroupConfig;
use crate::i18n::get_text;

/// Which greeting a command targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Greeting {
    Welcome,
    Goodbye,
}

impl Greeting {
    fn key(self) -> &'static str {
        match self {
            Greeting::Welcome => "welcome",
            Greeting::Goodbye => "goodbye",
        }
    }

    fn enabled(self, config: &mut GroupConfig) -> &mut bool {
        match self {
            Greeting::Welcome => &mut config.welcome_enabled,
            Greeting::Goodbye => &mut config.goodbye_enabled,
        }
    }

    fn text(self, config: &mut GroupConfig) -> &mut Option<String> {
        match self {
            Greeting::Welcome => &mut config.welcome_text,
            Greeting::Goodbye => &mut config.goodbye_text,
        }
    }
}

/// Handle /welcome on|off and /goodbye on|off.
pub async fn toggle(
    ctx: &CommandContext<'_>,
    greeting: Greeting,
    enabled: bool,
    out: &mut ActionList,
) -> Result<(), EngineError> {
    let Ok(changed) = ctx
        .edit(|c| Ok::<_, Infallible>(replace(greeting.enabled(c), enabled)))
        .await?;

    let status = if enabled { "enabled" } else { "disabled" };
    out.reply(ctx.chat_id(), get_text(&format!("{}.{}", greeting.key(), status)));

    if changed {
        info!("{} messages {} in chat {}", greeting.key(), status, ctx.chat_id());
        out.config_changed(ctx.chat_id(), format!("{} {}", greeting.key(), status));
    }
    Ok(())
}

/// Handle /setwelcome and /setgoodbye.
pub async fn set_template(
    ctx: &CommandContext<'_>,
    greeting: Greeting,
    text: &str,
    out: &mut ActionList,
) -> Result<(), EngineError> {
    let text = text.trim();
    let Ok(changed) = ctx
        .edit(|c| Ok::<_, Infallible>(replace(greeting.text(c), Some(text.to_string()))))
        .await?;

    out.reply(
        ctx.chat_id(),
        get_text(&format!("{}.set", greeting.key())).replace("{text}", text),
    );

    if changed {
        info!("{} text updated in chat {}", greeting.key(), ctx.chat_id());
        out.config_changed(ctx.chat_id(), format!("{} text updated", greeting.key()));
    }
    Ok(())
}
