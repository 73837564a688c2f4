//! Antiflood command handlers and the flood penalty.

use std::convert::Infallible;

use chrono::{DateTime, Utc};
use tracing::info;

use super::{CommandContext, replace};
use crate::bot::{Action, ActionList, Actor, EngineError};
use crate::database::{FloodPenalty, GroupConfig};
use crate::i18n::get_text;
use crate::utils::{expiry, format_duration};

/// Handle /setflood. 0 turns antiflood off.
pub async fn set_flood(
    ctx: &CommandContext<'_>,
    threshold: u32,
    out: &mut ActionList,
) -> Result<(), EngineError> {
    let Ok(changed) = ctx
        .edit(|c| Ok::<_, Infallible>(replace(&mut c.flood_threshold, threshold)))
        .await?;

    let text = if threshold == 0 {
        get_text("antiflood.disabled")
    } else {
        get_text("antiflood.limit_set")
            .replace("{count}", &threshold.to_string())
            .replace("{seconds}", &ctx.state.flood.window().num_seconds().to_string())
    };
    out.reply(ctx.chat_id(), text);

    if changed {
        info!("Flood threshold set to {} in chat {}", threshold, ctx.chat_id());
        out.config_changed(ctx.chat_id(), format!("flood threshold {}", threshold));
    }
    Ok(())
}

/// Handle /setfloodpenalty.
pub async fn set_penalty(
    ctx: &CommandContext<'_>,
    penalty: FloodPenalty,
    duration_secs: u64,
    out: &mut ActionList,
) -> Result<(), EngineError> {
    // Kicks have no duration.
    let duration_secs = match penalty {
        FloodPenalty::Kick => 0,
        _ => duration_secs,
    };

    let Ok(changed) = ctx
        .edit(|c| {
            let penalty_changed = replace(&mut c.flood_penalty, penalty);
            let duration_changed = replace(&mut c.flood_penalty_secs, duration_secs);
            Ok::<_, Infallible>(penalty_changed || duration_changed)
        })
        .await?;

    let text = if duration_secs > 0 {
        get_text("antiflood.penalty_set_for")
            .replace("{penalty}", &penalty.to_string())
            .replace("{duration}", &format_duration(duration_secs))
    } else {
        get_text("antiflood.penalty_set").replace("{penalty}", &penalty.to_string())
    };
    out.reply(ctx.chat_id(), text);

    if changed {
        info!(
            "Flood penalty set to {} ({}s) in chat {}",
            penalty,
            duration_secs,
            ctx.chat_id()
        );
        out.config_changed(
            ctx.chat_id(),
            format!("flood penalty {} {}s", penalty, duration_secs),
        );
    }
    Ok(())
}

/// Punish `actor` for tripping the flood guard: the configured penalty, its
/// log line and a notice in the group.
pub fn apply_penalty(
    config: &GroupConfig,
    actor: &Actor,
    at: DateTime<Utc>,
    window_secs: i64,
    out: &mut ActionList,
) {
    let chat_id = config.chat_id;
    let user_id = actor.user_id;
    let until = expiry(at, config.flood_penalty_secs);

    let action = match config.flood_penalty {
        FloodPenalty::Mute => Action::Mute {
            chat_id,
            user_id,
            until,
        },
        FloodPenalty::Kick => Action::Kick { chat_id, user_id },
        FloodPenalty::Ban => Action::Ban {
            chat_id,
            user_id,
            until,
        },
    };

    let penalty = get_text(&format!("antiflood.penalty.{}", config.flood_penalty));
    let user = actor.label();

    info!("User {} flooding in chat {}, applying {}", user_id, chat_id, config.flood_penalty);

    out.moderate(
        action,
        get_text("antiflood.log")
            .replace("{user}", &user)
            .replace("{penalty}", &penalty)
            .replace("{count}", &config.flood_threshold.to_string())
            .replace("{seconds}", &window_secs.to_string()),
    );
    out.reply(
        chat_id,
        get_text("antiflood.notice")
            .replace("{user}", &user)
            .replace("{penalty}", &penalty),
    );
}
