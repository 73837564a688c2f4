//! Ban management commands.
//!
//! Bans go on the group blacklist so a banned user's later messages are
//! blocked too; unbans take them off it. Kicks leave the blacklist alone.

use std::convert::Infallible;

use tracing::info;

use super::CommandContext;
use crate::bot::{Action, ActionList, Actor, EngineError};
use crate::i18n::get_text;

/// Handle /ban.
pub async fn ban(
    ctx: &CommandContext<'_>,
    target: &Actor,
    out: &mut ActionList,
) -> Result<(), EngineError> {
    let Ok(added) = ctx
        .edit(|c| Ok::<_, Infallible>(c.blacklist_user(target.user_id)))
        .await?;

    info!("User {} banned from chat {} by {}", target.user_id, ctx.chat_id(), ctx.actor().user_id);

    out.moderate(
        Action::Ban {
            chat_id: ctx.chat_id(),
            user_id: target.user_id,
            until: None,
        },
        moderation_log("ban.log_banned", target, ctx.actor()),
    );
    out.reply(ctx.chat_id(), get_text("ban.banned").replace("{user}", &target.label()));

    if added {
        out.config_changed(ctx.chat_id(), format!("user {} blacklisted", target.user_id));
    }
    Ok(())
}

/// Handle /unban.
pub async fn unban(
    ctx: &CommandContext<'_>,
    target: &Actor,
    out: &mut ActionList,
) -> Result<(), EngineError> {
    let Ok(removed) = ctx
        .edit(|c| Ok::<_, Infallible>(c.unblacklist_user(target.user_id)))
        .await?;

    info!("User {} unbanned in chat {} by {}", target.user_id, ctx.chat_id(), ctx.actor().user_id);

    out.moderate(
        Action::Unban {
            chat_id: ctx.chat_id(),
            user_id: target.user_id,
        },
        moderation_log("ban.log_unbanned", target, ctx.actor()),
    );
    out.reply(ctx.chat_id(), get_text("ban.unbanned").replace("{user}", &target.label()));

    if removed {
        out.config_changed(ctx.chat_id(), format!("user {} removed from blacklist", target.user_id));
    }
    Ok(())
}

/// Handle /kick.
pub fn kick(ctx: &CommandContext<'_>, target: &Actor, out: &mut ActionList) {
    info!("User {} kicked from chat {} by {}", target.user_id, ctx.chat_id(), ctx.actor().user_id);

    out.moderate(
        Action::Kick {
            chat_id: ctx.chat_id(),
            user_id: target.user_id,
        },
        moderation_log("ban.log_kicked", target, ctx.actor()),
    );
    out.reply(ctx.chat_id(), get_text("ban.kicked").replace("{user}", &target.label()));
}

/// Log line naming the target and the admin who acted.
pub(crate) fn moderation_log(key: &str, target: &Actor, admin: &Actor) -> String {
    get_text(key)
        .replace("{user}", &target.label())
        .replace("{admin}", &admin.label())
}
