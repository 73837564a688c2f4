//! Modguard - moderation decision engine for group chats.
//!
//! Takes chat events (messages, joins, leaves, commands) from many groups
//! and decides which moderation actions to take, based on each group's
//! configuration.
//!
//! ## Architecture
//!
//! - `config` - Environment configuration
//! - `database` - Config store trait with MongoDB and in-memory backends
//! - `cache` - Typed Moka caches
//! - `state` - Per-key versioned records with optimistic commits
//! - `permissions` - Permission gate and admin lookup
//! - `events` - Antiflood, filters and name history
//! - `plugins` - Command handlers
//! - `bot` - Event model, actions and the dispatcher
//! - `i18n` - Reply and log texts
//! - `utils` - Template fillings and duration helpers

pub mod bot;
pub mod cache;
pub mod config;
pub mod database;
pub mod events;
pub mod i18n;
pub mod permissions;
pub mod plugins;
pub mod state;
pub mod utils;

pub use bot::{Action, Actor, Dispatcher, EngineError, EventKind, ModerationEvent};
pub use config::{Config, Settings};
