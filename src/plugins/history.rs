//! /history: past display names and usernames.

use super::CommandContext;
use crate::bot::{ActionList, EngineError};
use crate::database::HistoryEntry;
use crate::i18n::get_text;

/// Handle /history [@username].
pub async fn show(
    ctx: &CommandContext<'_>,
    username: Option<&str>,
    out: &mut ActionList,
) -> Result<(), EngineError> {
    let history = &ctx.state.history;

    let text = match username {
        Some(username) => {
            let username = username.trim().trim_start_matches('@');
            match history.find_by_username(username).await? {
                Some((_, entries)) => format!(
                    "{}\n{}",
                    get_text("history.user_header").replace("{username}", username),
                    format_entries(&entries)
                ),
                None => get_text("history.not_found"),
            }
        }
        None => {
            let entries = history.query_history(ctx.actor().user_id).await?;
            if entries.is_empty() {
                get_text("history.none")
            } else {
                format!("{}\n{}", get_text("history.own_header"), format_entries(&entries))
            }
        }
    };

    out.reply(ctx.chat_id(), text);
    Ok(())
}

fn format_entries(entries: &[HistoryEntry]) -> String {
    if entries.is_empty() {
        return get_text("history.none");
    }

    entries
        .iter()
        .map(|e| format!("• {} ({})", e.label(), e.observed_at.format("%Y-%m-%d")))
        .collect::<Vec<_>>()
        .join("\n")
}
