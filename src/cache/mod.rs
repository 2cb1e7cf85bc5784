//! Cache module - typed caches backed by Moka.
//!
//! ```rust
//! let rows = TypedCache::<u64, usize>::new("sheet_row_index", CacheConfig::default());
//! rows.insert(user_id, 12);
//! let row = rows.get(&user_id);
//! ```

mod config;
mod typed;

pub use config::CacheConfig;
pub use typed::TypedCache;
