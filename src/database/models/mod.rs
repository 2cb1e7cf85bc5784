//! Database model exports.

pub mod history;
pub mod user;

pub use history::HistoryRecord;
pub use user::UserRecord;
