//! Welcome/goodbye template fillings.
//!
//! Supported placeholders:
//! - `{first}` - given name
//! - `{last}` - family name, empty if absent
//! - `{fullname}` - given and family name
//! - `{username}` - `@handle`, empty if absent
//! - `{id}` - numeric user ID
//!
//! Anything else in braces is copied through unchanged, so templates saved
//! before a placeholder existed keep rendering. Substituted values are never
//! re-scanned.

use crate::bot::Actor;

/// Expand placeholders in `template` for `actor`.
pub fn render(template: &str, actor: &Actor) -> String {
    let mut out = String::with_capacity(template.len() + 16);
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];

        let filled = after
            .find('}')
            .and_then(|close| filling(&after[..close], actor).map(|value| (close, value)));

        match filled {
            Some((close, value)) => {
                out.push_str(&value);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }

    out.push_str(rest);
    out
}

fn filling(name: &str, actor: &Actor) -> Option<String> {
    let value = match name {
        "first" => actor.first_name.clone(),
        "last" => actor.last_name.clone().unwrap_or_default(),
        "fullname" => actor.full_name(),
        "username" => actor
            .username
            .as_deref()
            .map(|u| format!("@{}", u))
            .unwrap_or_default(),
        "id" => actor.user_id.to_string(),
        _ => return None,
    };
    Some(value)
}
