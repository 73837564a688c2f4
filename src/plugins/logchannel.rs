//! Log channel commands.

use std::convert::Infallible;

use tracing::info;

use super::{CommandContext, replace};
use crate::bot::{ActionList, EngineError};
use crate::database::GroupConfig;
use crate::i18n::get_text;

/// Handle /setlog.
pub async fn set(
    ctx: &CommandContext<'_>,
    channel: i64,
    out: &mut ActionList,
) -> Result<(), EngineError> {
    let Ok(changed) = ctx
        .edit(|c| Ok::<_, Infallible>(replace(&mut c.log_channel, Some(channel))))
        .await?;

    out.reply(
        ctx.chat_id(),
        get_text("log.set").replace("{channel}", &channel.to_string()),
    );

    if changed {
        info!("Log channel for chat {} set to {}", ctx.chat_id(), channel);
        out.config_changed(ctx.chat_id(), format!("log channel {}", channel));
    }
    Ok(())
}

/// Handle /unsetlog.
pub async fn unset(ctx: &CommandContext<'_>, out: &mut ActionList) -> Result<(), EngineError> {
    let Ok(previous) = ctx
        .edit(|c| Ok::<_, Infallible>(c.log_channel.take()))
        .await?;

    match previous {
        Some(channel) => {
            info!("Log channel {} removed from chat {}", channel, ctx.chat_id());
            out.reply(ctx.chat_id(), get_text("log.removed"));
            out.config_changed(ctx.chat_id(), "log channel removed");
        }
        None => out.reply(ctx.chat_id(), get_text("log.not_set")),
    }
    Ok(())
}

/// Handle /logstatus.
pub fn status(ctx: &CommandContext<'_>, config: &GroupConfig, out: &mut ActionList) {
    let text = match config.log_channel {
        Some(channel) => get_text("log.status").replace("{channel}", &channel.to_string()),
        None => get_text("log.status_none"),
    };
    out.reply(ctx.chat_id(), text);
}
