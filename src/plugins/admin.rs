//! Global admin management.
//!
//! Global admins pass every permission check in every group.

use tracing::info;

use super::CommandContext;
use crate::bot::{ActionList, Actor, EngineError};
use crate::i18n::get_text;

/// Handle /promote.
pub async fn promote(
    ctx: &CommandContext<'_>,
    target: &Actor,
    out: &mut ActionList,
) -> Result<(), EngineError> {
    let changed = ctx.state.history.set_global_admin(target.user_id, true).await?;

    let key = if changed {
        info!("User {} promoted to global admin by {}", target.user_id, ctx.actor().user_id);
        "admin.promoted"
    } else {
        "admin.already_admin"
    };
    out.reply(ctx.chat_id(), get_text(key).replace("{user}", &target.label()));
    Ok(())
}

/// Handle /demote.
pub async fn demote(
    ctx: &CommandContext<'_>,
    target: &Actor,
    out: &mut ActionList,
) -> Result<(), EngineError> {
    let changed = ctx.state.history.set_global_admin(target.user_id, false).await?;

    let key = if changed {
        info!("User {} demoted from global admin by {}", target.user_id, ctx.actor().user_id);
        "admin.demoted"
    } else {
        "admin.not_admin"
    };
    out.reply(ctx.chat_id(), get_text(key).replace("{user}", &target.label()));
    Ok(())
}
