//! Reply and log message texts.
//!
//! Messages are embedded from `en.json` at build time and looked up with
//! dot-separated keys, e.g. `"filters.added"`. Placeholders like `{user}`
//! are filled in by the caller with `str::replace`.

use std::sync::OnceLock;

use serde_json::Value;
use tracing::error;

static MESSAGES: OnceLock<Value> = OnceLock::new();

fn messages() -> &'static Value {
    MESSAGES.get_or_init(|| {
        serde_json::from_str(include_str!("en.json")).unwrap_or_else(|e| {
            error!("Embedded messages are not valid JSON: {}", e);
            Value::Null
        })
    })
}

/// Get the text for `key`. Unknown keys come back as the key itself.
pub fn get_text(key: &str) -> String {
    resolve_key(messages(), key).unwrap_or_else(|| key.to_string())
}

fn resolve_key(val: &Value, key: &str) -> Option<String> {
    let mut current = val;
    for part in key.split('.') {
        current = current.get(part)?;
    }
    current.as_str().map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nested_lookup() {
        assert_eq!(get_text("antiflood.penalty.kick"), "kicked");
        assert_eq!(get_text("filters.none"), "No filters in this chat.");
    }

    #[test]
    fn test_missing_key_falls_back() {
        assert_eq!(get_text("nope.not.here"), "nope.not.here");
        // Non-leaf keys are not messages.
        assert_eq!(get_text("antiflood.penalty"), "antiflood.penalty");
    }

    #[test]
    fn test_embedded_messages_parse() {
        assert!(messages().is_object());
    }
}
