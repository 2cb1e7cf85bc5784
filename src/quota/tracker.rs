//! In-memory per-day quota tracking.
//!
//! Holds today's translation counts and the per-user locks that serialize
//! check-then-decrement sequences. Nothing here is persisted; the daily reset
//! job clears it without touching stored quotas.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

#[derive(Clone, Default)]
pub struct QuotaTracker {
    usage: Arc<DashMap<u64, u32>>,
    locks: Arc<DashMap<u64, Arc<Mutex<()>>>>,
}

/// Today's totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UsageSummary {
    pub active_users: usize,
    pub translations: u32,
}

impl QuotaTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Exclusive access to one user's quota until the guard is dropped.
    pub async fn lock_user(&self, user_id: u64) -> OwnedMutexGuard<()> {
        let lock = self
            .locks
            .entry(user_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        lock.lock_owned().await
    }

    /// Count one successful translation.
    pub fn record_translation(&self, user_id: u64) {
        *self.usage.entry(user_id).or_insert(0) += 1;
    }

    pub fn translations_for(&self, user_id: u64) -> u32 {
        self.usage.get(&user_id).map(|n| *n).unwrap_or(0)
    }

    pub fn summary(&self) -> UsageSummary {
        UsageSummary {
            active_users: self.usage.len(),
            translations: self.usage.iter().map(|n| *n.value()).sum(),
        }
    }

    /// Drop all tracking entries. Locks currently held stay alive.
    pub fn reset(&self) {
        self.usage.clear();
        self.locks.retain(|_, lock| Arc::strong_count(lock) > 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reset_clears_usage() {
        let tracker = QuotaTracker::new();
        tracker.record_translation(1);
        tracker.record_translation(1);
        tracker.record_translation(2);

        assert_eq!(
            tracker.summary(),
            UsageSummary {
                active_users: 2,
                translations: 3
            }
        );

        tracker.reset();
        assert_eq!(tracker.summary().translations, 0);
        assert_eq!(tracker.translations_for(1), 0);
    }

    #[tokio::test]
    async fn test_user_lock_is_exclusive_per_user() {
        let tracker = QuotaTracker::new();
        let guard = tracker.lock_user(1).await;

        // Another user is not blocked.
        let _other = tracker.lock_user(2).await;

        let clone = tracker.clone();
        let waiter = tokio::spawn(async move {
            let _g = clone.lock_user(1).await;
        });
        tokio::task::yield_now().await;
        assert!(!waiter.is_finished());

        drop(guard);
        waiter.await.unwrap();
    }

    #[tokio::test]
    async fn test_reset_keeps_held_locks() {
        let tracker = QuotaTracker::new();
        let guard = tracker.lock_user(1).await;
        tracker.reset();

        let clone = tracker.clone();
        let waiter = tokio::spawn(async move {
            let _g = clone.lock_user(1).await;
        });
        tokio::task::yield_now().await;
        assert!(!waiter.is_finished());

        drop(guard);
        waiter.await.unwrap();
    }
}
