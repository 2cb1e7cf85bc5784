//! Permission system for admin-only commands.
//!
//! Admins are a static allow-list of Telegram user ids loaded from
//! `ADMIN_IDS`. There are no chat roles involved.
//!
//! ```rust
//! let admins = AdminList::new(vec![42]);
//! if admins.is_admin(user_id) {
//!     // ...
//! }
//! ```

mod checker;

pub use checker::AdminList;
