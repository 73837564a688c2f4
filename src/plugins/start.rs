//! /start, /help and /about.

use super::CommandContext;
use crate::bot::ActionList;
use crate::i18n::get_text;

pub fn start(ctx: &CommandContext<'_>, out: &mut ActionList) {
    out.reply(ctx.chat_id(), get_text("start.active"));
}

pub fn help(ctx: &CommandContext<'_>, out: &mut ActionList) {
    out.reply(ctx.chat_id(), get_text("start.help"));
}

pub fn about(ctx: &CommandContext<'_>, out: &mut ActionList) {
    out.reply(ctx.chat_id(), get_text("start.about"));
}
