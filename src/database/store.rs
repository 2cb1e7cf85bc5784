//! Record store abstraction.
//!
//! Handlers talk to user rows and translation history only through
//! [`RecordStore`]; the concrete backend is picked at startup.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;

use super::error::StoreResult;
use super::models::{HistoryRecord, UserRecord};

/// Defaults applied when a user row is created lazily.
#[derive(Debug, Clone, Copy)]
pub struct NewUserDefaults {
    pub daily_quota: u32,
    pub trial_days: u32,
}

impl Default for NewUserDefaults {
    fn default() -> Self {
        Self {
            daily_quota: 3,
            trial_days: 3,
        }
    }
}

/// Storage backend for user rows and translation history.
///
/// Implementations must be thread-safe (`Send + Sync`) as they are shared
/// by every handler through `AppState`.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Short backend name for logs and stats.
    fn name(&self) -> &'static str;

    /// Fetch a user row.
    async fn get(&self, user_id: u64) -> StoreResult<Option<UserRecord>>;

    /// Insert or overwrite a full user row.
    async fn save(&self, record: &UserRecord) -> StoreResult<()>;

    /// Set the remaining quota and stamp it with `today`.
    ///
    /// Returns `false` if the user does not exist.
    async fn set_quota(&self, user_id: u64, quota: u32, today: NaiveDate) -> StoreResult<bool>;

    /// Consume one unit of quota.
    ///
    /// Returns the new remaining value, or `None` if the quota was already
    /// zero (or the user is unknown). Never goes below zero.
    async fn decrement_quota(&self, user_id: u64) -> StoreResult<Option<u32>>;

    /// All known user rows.
    async fn list_users(&self) -> StoreResult<Vec<UserRecord>>;

    /// Append a translation to the history log.
    async fn append_history(&self, entry: &HistoryRecord) -> StoreResult<()>;

    /// Most recent history entries for a user, newest first.
    async fn recent_history(&self, user_id: u64, limit: usize) -> StoreResult<Vec<HistoryRecord>>;

    /// Fetch a user row, creating it with defaults if absent.
    async fn get_or_create(
        &self,
        user_id: u64,
        display_name: &str,
        today: NaiveDate,
        defaults: NewUserDefaults,
    ) -> StoreResult<UserRecord> {
        if let Some(record) = self.get(user_id).await? {
            return Ok(record);
        }

        let record = UserRecord::new(
            user_id,
            display_name,
            defaults.daily_quota,
            defaults.trial_days,
            today,
        );
        self.save(&record).await?;
        Ok(record)
    }
}

/// Shared handle to the configured store.
pub type SharedStore = Arc<dyn RecordStore>;
