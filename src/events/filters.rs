//! Filter matching.
//!
//! Keywords match as whole words, case-insensitively. The first filter in
//! the group's insertion order that matches wins.

use regex::Regex;
use tracing::{debug, warn};

use crate::cache::{CacheConfig, TypedCache};
use crate::database::{FilterRule, GroupConfig};

/// Matches message text against a group's filters.
///
/// Compiled matchers are shared across groups, keyed by normalized keyword.
#[derive(Clone)]
pub struct FilterEngine {
    matchers: TypedCache<String, Regex>,
}

impl FilterEngine {
    pub fn new() -> Self {
        Self {
            matchers: TypedCache::new("filter_matchers", CacheConfig::filter_matchers()),
        }
    }

    /// Return the first filter whose keyword occurs in `text` as a whole word.
    pub fn find<'a>(&self, config: &'a GroupConfig, text: &str) -> Option<&'a FilterRule> {
        if text.is_empty() {
            return None;
        }

        let found = config.filters.iter().find(|rule| match self.matcher(&rule.keyword) {
            Some(re) => re.is_match(text),
            None => false,
        });

        if let Some(rule) = found {
            debug!("Filter '{}' matched in chat {}", rule.keyword, config.chat_id);
        }
        found
    }

    /// Response of the first matching filter.
    pub fn response(&self, config: &GroupConfig, text: &str) -> Option<String> {
        self.find(config, text).map(|rule| rule.response.clone())
    }

    fn matcher(&self, keyword: &str) -> Option<Regex> {
        if let Some(re) = self.matchers.get(&keyword.to_string()) {
            return Some(re);
        }

        match build_matcher(keyword) {
            Ok(re) => {
                self.matchers.insert(keyword.to_string(), re.clone());
                Some(re)
            }
            Err(e) => {
                warn!("Could not compile matcher for filter '{}': {}", keyword, e);
                None
            }
        }
    }
}

impl Default for FilterEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Build a case-insensitive matcher for `keyword` delimited by non-word
/// characters or the ends of the text.
fn build_matcher(keyword: &str) -> Result<Regex, regex::Error> {
    let pattern = format!(r"(?i)(?:^|\W){}(?:\W|$)", regex::escape(keyword));
    Regex::new(&pattern)
}
