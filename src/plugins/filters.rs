//! Filter command handlers.

use tracing::{debug, info};

use super::CommandContext;
use crate::bot::{ActionList, EngineError};
use crate::database::{ConfigError, GroupConfig};
use crate::i18n::get_text;

/// Reply text for a rejected filter edit.
pub fn describe_error(e: &ConfigError) -> String {
    match e {
        ConfigError::DuplicateFilter(keyword) => {
            get_text("filters.duplicate").replace("{keyword}", keyword)
        }
        ConfigError::FilterNotFound(keyword) => {
            get_text("filters.not_found").replace("{keyword}", keyword)
        }
        ConfigError::EmptyFilter => get_text("filters.empty_keyword"),
    }
}

/// Handle /addfilter.
pub async fn add(
    ctx: &CommandContext<'_>,
    keyword: &str,
    response: &str,
    out: &mut ActionList,
) -> Result<(), EngineError> {
    let added = ctx
        .edit(|c| c.add_filter(keyword, response).map(|rule| rule.keyword.clone()))
        .await?;

    match added {
        Ok(keyword) => {
            info!("Filter '{}' added in chat {}", keyword, ctx.chat_id());
            out.reply(ctx.chat_id(), get_text("filters.added").replace("{keyword}", &keyword));
            out.config_changed(ctx.chat_id(), format!("filter '{}' added", keyword));
        }
        Err(e) => {
            debug!("Rejected filter edit in chat {}: {}", ctx.chat_id(), e);
            out.reply(ctx.chat_id(), describe_error(&e));
        }
    }
    Ok(())
}

/// Handle /delfilter.
pub async fn remove(
    ctx: &CommandContext<'_>,
    keyword: &str,
    out: &mut ActionList,
) -> Result<(), EngineError> {
    let removed = ctx.edit(|c| c.remove_filter(keyword)).await?;

    match removed {
        Ok(rule) => {
            info!("Filter '{}' removed in chat {}", rule.keyword, ctx.chat_id());
            out.reply(
                ctx.chat_id(),
                get_text("filters.removed").replace("{keyword}", &rule.keyword),
            );
            out.config_changed(ctx.chat_id(), format!("filter '{}' removed", rule.keyword));
        }
        Err(e) => out.reply(ctx.chat_id(), describe_error(&e)),
    }
    Ok(())
}

/// Handle /filters, sorted by keyword.
pub fn list(ctx: &CommandContext<'_>, config: &GroupConfig, out: &mut ActionList) {
    let filters = config.sorted_filters();
    if filters.is_empty() {
        out.reply(ctx.chat_id(), get_text("filters.none"));
        return;
    }

    let mut text = get_text("filters.list_header");
    for rule in filters {
        text.push_str(&format!("\n• {} → {}", rule.keyword, rule.response));
    }
    out.reply(ctx.chat_id(), text);
}
