//! Cache module - typed in-process caches built on Moka.
//!
//! Holds the compiled filter matchers. The [`CacheConfig`] presets also
//! size and age the per-key state slots in `state`. Each cache is created
//! with a named preset:
//!
//! ```rust,ignore
//! let matchers: TypedCache<String, Regex> =
//!     TypedCache::new("filter_matchers", CacheConfig::filter_matchers());
//! ```

mod config;
mod typed;

pub use config::CacheConfig;
pub use typed::TypedCache;
