//! Permission system for checking who may run an action.
//!
//! Three levels: anyone, group admin, global admin. Global admins are
//! flagged on their user record; group admin status comes from the
//! transport through an [`AdminLookup`].
//!
//! ## Usage
//!
//! ```rust,ignore
//! let gate = PermissionGate::new(Arc::new(StaticAdminLookup::new([(chat_id, user_id)])));
//!
//! if gate.authorize(&record, chat_id, PermissionLevel::GroupAdmin).await? {
//!     // ...
//! }
//! ```

mod checker;

pub use checker::{AdminLookup, LookupError, PermissionGate, PermissionLevel, StaticAdminLookup};
