//! In-memory record store.
//!
//! Used when no persistent backend is configured, and by tests.

use async_trait::async_trait;
use chrono::NaiveDate;
use dashmap::DashMap;
use parking_lot::Mutex;

use super::error::StoreResult;
use super::models::{HistoryRecord, UserRecord};
use super::store::RecordStore;

/// Process-local store. Contents are lost on restart.
#[derive(Debug, Default)]
pub struct MemoryStore {
    users: DashMap<u64, UserRecord>,
    history: Mutex<Vec<HistoryRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn get(&self, user_id: u64) -> StoreResult<Option<UserRecord>> {
        Ok(self.users.get(&user_id).map(|r| r.clone()))
    }

    async fn save(&self, record: &UserRecord) -> StoreResult<()> {
        self.users.insert(record.user_id, record.clone());
        Ok(())
    }

    async fn set_quota(&self, user_id: u64, quota: u32, today: NaiveDate) -> StoreResult<bool> {
        match self.users.get_mut(&user_id) {
            Some(mut record) => {
                record.daily_quota_remaining = quota;
                record.quota_date = Some(today);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn decrement_quota(&self, user_id: u64) -> StoreResult<Option<u32>> {
        let Some(mut record) = self.users.get_mut(&user_id) else {
            return Ok(None);
        };
        if record.daily_quota_remaining == 0 {
            return Ok(None);
        }
        record.daily_quota_remaining -= 1;
        Ok(Some(record.daily_quota_remaining))
    }

    async fn list_users(&self) -> StoreResult<Vec<UserRecord>> {
        let mut users: Vec<UserRecord> = self.users.iter().map(|r| r.value().clone()).collect();
        users.sort_by_key(|u| u.user_id);
        Ok(users)
    }

    async fn append_history(&self, entry: &HistoryRecord) -> StoreResult<()> {
        self.history.lock().push(entry.clone());
        Ok(())
    }

    async fn recent_history(&self, user_id: u64, limit: usize) -> StoreResult<Vec<HistoryRecord>> {
        let history = self.history.lock();
        Ok(history
            .iter()
            .rev()
            .filter(|h| h.user_id == user_id)
            .take(limit)
            .cloned()
            .collect())
    }
}
