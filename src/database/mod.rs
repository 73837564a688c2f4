//! Database module exports.

mod memory;
pub mod models;
mod mongo;
mod mongo_store;
mod store;
#[cfg(test)]
pub(crate) mod testing;

pub use memory::MemoryStore;
pub use models::*;
pub use mongo::Database;
pub use mongo_store::MongoStore;
pub use store::{ConfigStore, StoreError};
