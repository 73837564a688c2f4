//! Bot module - event model, actions and the dispatcher.

pub mod actions;
pub mod dispatcher;
mod error;
pub mod event;

pub use actions::{Action, ActionList};
pub use dispatcher::Dispatcher;
pub use error::EngineError;
pub use event::{Actor, EventKind, ModerationEvent, ValidationError};
