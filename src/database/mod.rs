//! Database module exports.

mod error;
mod memory;
mod models;
mod mongo;
pub mod sheets;
mod store;

pub use error::{StoreError, StoreResult};
pub use memory::MemoryStore;
pub use models::*;
pub use mongo::{Database, MongoStore};
pub use store::{NewUserDefaults, RecordStore, SharedStore};
