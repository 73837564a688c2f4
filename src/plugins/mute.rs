//! Mute management commands.

use tracing::info;

use super::CommandContext;
use super::ban::moderation_log;
use crate::bot::{Action, ActionList, Actor};
use crate::i18n::get_text;
use crate::utils::{expiry, format_duration};

/// Handle /mute, optionally for a limited time.
/// /mute = mute until unmuted
/// /mute 2h = mute for 2 hours
pub fn mute(
    ctx: &CommandContext<'_>,
    target: &Actor,
    duration_secs: Option<u64>,
    out: &mut ActionList,
) {
    let secs = duration_secs.unwrap_or(0);
    let until = expiry(ctx.event.at, secs);

    info!(
        "User {} muted in chat {} by {} until {:?}",
        target.user_id,
        ctx.chat_id(),
        ctx.actor().user_id,
        until
    );

    out.moderate(
        Action::Mute {
            chat_id: ctx.chat_id(),
            user_id: target.user_id,
            until,
        },
        moderation_log("mute.log_muted", target, ctx.actor()),
    );

    let text = match until {
        Some(_) => get_text("mute.muted_for")
            .replace("{user}", &target.label())
            .replace("{duration}", &format_duration(secs)),
        None => get_text("mute.muted").replace("{user}", &target.label()),
    };
    out.reply(ctx.chat_id(), text);
}

/// Handle /unmute. The user's flood counter starts over.
pub fn unmute(ctx: &CommandContext<'_>, target: &Actor, out: &mut ActionList) {
    info!("User {} unmuted in chat {} by {}", target.user_id, ctx.chat_id(), ctx.actor().user_id);

    ctx.state.flood.reset(ctx.chat_id(), target.user_id);

    out.moderate(
        Action::Unmute {
            chat_id: ctx.chat_id(),
            user_id: target.user_id,
        },
        moderation_log("mute.log_unmuted", target, ctx.actor()),
    );
    out.reply(ctx.chat_id(), get_text("mute.unmuted").replace("{user}", &target.label()));
}
