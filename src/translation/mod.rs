//! Translation service.
//!
//! Owns the quota contract: a request is only sent to the model when the
//! user has quota left, and quota is consumed only after a successful
//! translation. The per-user lock is held from the quota read to the
//! decrement, so two messages from the same user cannot both spend the
//! last unit.

use tracing::{error, info, warn};

use crate::ai::prompt::{self, Translation};
use crate::ai::{AiError, SharedGenerator};
use crate::database::{HistoryRecord, NewUserDefaults, SharedStore, StoreResult, UserRecord};
use crate::quota::{QuotaClock, QuotaTracker};
use crate::utils::char_len;

/// Result of one translation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranslateOutcome {
    /// Nothing to translate.
    Empty,
    /// Longer than the per-request limit. No quota consumed.
    TooLong { max_chars: usize },
    /// No quota left today.
    QuotaExhausted,
    /// No AI credentials configured.
    Unavailable,
    /// Store or model failure. No translation delivered.
    Failed,
    Translated {
        translation: Translation,
        remaining: u32,
    },
}

pub struct TranslationService {
    store: SharedStore,
    generator: SharedGenerator,
    tracker: QuotaTracker,
    clock: QuotaClock,
    defaults: NewUserDefaults,
    max_chars: usize,
}

impl TranslationService {
    pub fn new(
        store: SharedStore,
        generator: SharedGenerator,
        tracker: QuotaTracker,
        clock: QuotaClock,
        defaults: NewUserDefaults,
        max_chars: usize,
    ) -> Self {
        Self {
            store,
            generator,
            tracker,
            clock,
            defaults,
            max_chars,
        }
    }

    pub fn max_chars(&self) -> usize {
        self.max_chars
    }

    /// Load the user's row, creating it on first contact and rolling it
    /// over to the current quota day.
    pub async fn load_user(&self, user_id: u64, display_name: &str) -> StoreResult<UserRecord> {
        let _guard = self.tracker.lock_user(user_id).await;
        self.load_user_locked(user_id, display_name).await
    }

    /// Overwrite today's remaining quota for an existing user.
    ///
    /// Returns `false` if the user does not exist.
    pub async fn set_quota(&self, user_id: u64, quota: u32) -> StoreResult<bool> {
        let _guard = self.tracker.lock_user(user_id).await;
        self.store.set_quota(user_id, quota, self.clock.today()).await
    }

    /// Caller must hold the user's lock.
    async fn load_user_locked(&self, user_id: u64, display_name: &str) -> StoreResult<UserRecord> {
        let today = self.clock.today();
        let mut record = self
            .store
            .get_or_create(user_id, display_name, today, self.defaults)
            .await?;

        if record.refresh_for_day(today, self.defaults.daily_quota) {
            info!(
                "Refreshed quota for user {} to {} ({} trial days left)",
                user_id, record.daily_quota_remaining, record.remaining_trial_days
            );
            self.store.save(&record).await?;
        }

        Ok(record)
    }

    pub async fn translate(&self, user_id: u64, display_name: &str, text: &str) -> TranslateOutcome {
        let text = text.trim();
        if text.is_empty() {
            return TranslateOutcome::Empty;
        }
        if char_len(text) > self.max_chars {
            return TranslateOutcome::TooLong {
                max_chars: self.max_chars,
            };
        }

        let _guard = self.tracker.lock_user(user_id).await;

        let record = match self.load_user_locked(user_id, display_name).await {
            Ok(record) => record,
            Err(e) => {
                error!("Failed to load user {}: {}", user_id, e);
                return TranslateOutcome::Failed;
            }
        };

        if record.daily_quota_remaining == 0 {
            return TranslateOutcome::QuotaExhausted;
        }

        let raw = match self.generator.generate(&prompt::translation_prompt(text)).await {
            Ok(raw) => raw,
            Err(AiError::NotConfigured) => return TranslateOutcome::Unavailable,
            Err(e) => {
                warn!("Translation for user {} failed: {}", user_id, e);
                return TranslateOutcome::Failed;
            }
        };
        let translation = prompt::parse_translation(&raw);

        // The translation is only delivered once its unit is stored as spent.
        let remaining = match self.store.decrement_quota(user_id).await {
            Ok(Some(remaining)) => remaining,
            Ok(None) => return TranslateOutcome::QuotaExhausted,
            Err(e) => {
                error!("Failed to decrement quota for user {}: {}", user_id, e);
                return TranslateOutcome::Failed;
            }
        };
        self.tracker.record_translation(user_id);

        let entry = HistoryRecord::new(user_id, text, translation.lao.clone());
        if let Err(e) = self.store.append_history(&entry).await {
            warn!("Failed to append history for user {}: {}", user_id, e);
        }

        TranslateOutcome::Translated {
            translation,
            remaining,
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use std::sync::atomic::AtomicBool;

    use async_trait::async_trait;
    use chrono::{Duration, NaiveDate, NaiveTime};

    use super::*;
    use crate::ai::TextGenerator;
    use crate::database::{MemoryStore, RecordStore, StoreError};

    /// Generator that returns a canned reply, or fails when `fail` is set.
    pub(crate) struct StubGenerator {
        pub reply: String,
        pub fail: bool,
        pub calls: AtomicUsize,
    }

    impl StubGenerator {
        pub(crate) fn replying(reply: &str) -> Self {
            Self {
                reply: reply.to_string(),
                fail: false,
                calls: AtomicUsize::new(0),
            }
        }

        pub(crate) fn failing() -> Self {
            Self {
                fail: true,
                ..Self::replying("")
            }
        }
    }

    #[async_trait]
    impl TextGenerator for StubGenerator {
        async fn generate(&self, _prompt: &str) -> Result<String, AiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(AiError::EmptyResponse)
            } else {
                Ok(self.reply.clone())
            }
        }
    }

    const REPLY: &str = r#"{"lao":"ສະບາຍດີ","romanization":"sabaidee"}"#;

    fn service(store: Arc<MemoryStore>, generator: Arc<StubGenerator>) -> TranslationService {
        TranslationService::new(
            store,
            generator,
            QuotaTracker::new(),
            QuotaClock::new(7, NaiveTime::MIN),
            NewUserDefaults::default(),
            20,
        )
    }

    #[tokio::test]
    async fn test_successful_translation_consumes_one_unit() {
        let store = Arc::new(MemoryStore::new());
        let svc = service(store.clone(), Arc::new(StubGenerator::replying(REPLY)));

        let outcome = svc.translate(1, "Ana", "你好").await;
        match outcome {
            TranslateOutcome::Translated { translation, remaining } => {
                assert_eq!(translation.lao, "ສະບາຍດີ");
                assert_eq!(remaining, 2);
            }
            other => panic!("unexpected outcome: {:?}", other),
        }

        assert_eq!(store.get(1).await.unwrap().unwrap().daily_quota_remaining, 2);
        assert_eq!(store.recent_history(1, 10).await.unwrap().len(), 1);
        assert_eq!(svc.tracker.translations_for(1), 1);
    }

    #[tokio::test]
    async fn test_too_long_rejected_without_consuming_quota() {
        let store = Arc::new(MemoryStore::new());
        let generator = Arc::new(StubGenerator::replying(REPLY));
        let svc = service(store.clone(), generator.clone());

        let long = "一".repeat(21);
        assert_eq!(
            svc.translate(1, "Ana", &long).await,
            TranslateOutcome::TooLong { max_chars: 20 }
        );
        assert_eq!(generator.calls.load(Ordering::SeqCst), 0);
        assert!(store.get(1).await.unwrap().is_none());

        // Exactly at the limit is accepted.
        let exact = "一".repeat(20);
        assert!(matches!(
            svc.translate(1, "Ana", &exact).await,
            TranslateOutcome::Translated { .. }
        ));
    }

    #[tokio::test]
    async fn test_quota_exhaustion_never_goes_negative() {
        let store = Arc::new(MemoryStore::new());
        let generator = Arc::new(StubGenerator::replying(REPLY));
        let svc = service(store.clone(), generator.clone());

        let mut remaining = Vec::new();
        for _ in 0..3 {
            if let TranslateOutcome::Translated { remaining: r, .. } =
                svc.translate(1, "Ana", "你好").await
            {
                remaining.push(r);
            }
        }
        assert_eq!(remaining, vec![2, 1, 0]);

        for _ in 0..2 {
            assert_eq!(
                svc.translate(1, "Ana", "你好").await,
                TranslateOutcome::QuotaExhausted
            );
        }
        assert_eq!(generator.calls.load(Ordering::SeqCst), 3);
        assert_eq!(store.get(1).await.unwrap().unwrap().daily_quota_remaining, 0);
    }

    #[tokio::test]
    async fn test_concurrent_requests_do_not_overdraw() {
        let store = Arc::new(MemoryStore::new());
        let generator = Arc::new(StubGenerator::replying(REPLY));
        let svc = Arc::new(service(store.clone(), generator.clone()));

        let tasks: Vec<_> = (0..6)
            .map(|_| {
                let svc = svc.clone();
                tokio::spawn(async move { svc.translate(1, "Ana", "你好").await })
            })
            .collect();

        let mut translated = 0;
        for task in tasks {
            if matches!(task.await.unwrap(), TranslateOutcome::Translated { .. }) {
                translated += 1;
            }
        }
        assert_eq!(translated, 3);
        assert_eq!(generator.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_model_failure_keeps_quota() {
        let store = Arc::new(MemoryStore::new());
        let svc = service(store.clone(), Arc::new(StubGenerator::failing()));

        assert_eq!(svc.translate(1, "Ana", "你好").await, TranslateOutcome::Failed);
        assert_eq!(store.get(1).await.unwrap().unwrap().daily_quota_remaining, 3);
        assert!(store.recent_history(1, 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_new_quota_day_restores_stored_quota() {
        let store = Arc::new(MemoryStore::new());
        let svc = service(store.clone(), Arc::new(StubGenerator::replying(REPLY)));
        let today = svc.clock.today();

        let mut record = UserRecord::new(1, "Ana", 0, 3, today - Duration::days(2));
        record.quota_date = Some(today - Duration::days(1));
        store.save(&record).await.unwrap();

        let outcome = svc.translate(1, "Ana", "你好").await;
        assert!(matches!(outcome, TranslateOutcome::Translated { remaining: 2, .. }));

        let stored = store.get(1).await.unwrap().unwrap();
        assert_eq!(stored.remaining_trial_days, 2);
        assert_eq!(stored.quota_date, Some(today));
    }

    #[tokio::test]
    async fn test_blank_text_is_ignored() {
        let store = Arc::new(MemoryStore::new());
        let svc = service(store.clone(), Arc::new(StubGenerator::replying(REPLY)));

        assert_eq!(svc.translate(1, "Ana", "   ").await, TranslateOutcome::Empty);
        assert!(store.get(1).await.unwrap().is_none());
    }

    /// Memory store whose first `save` is slow and whose decrement can fail.
    #[derive(Default)]
    struct FlakyStore {
        inner: MemoryStore,
        slow_first_save: bool,
        fail_decrement: bool,
        saved_once: AtomicBool,
    }

    #[async_trait]
    impl RecordStore for FlakyStore {
        fn name(&self) -> &'static str {
            "flaky"
        }

        async fn get(&self, user_id: u64) -> StoreResult<Option<UserRecord>> {
            self.inner.get(user_id).await
        }

        async fn save(&self, record: &UserRecord) -> StoreResult<()> {
            if self.slow_first_save && !self.saved_once.swap(true, Ordering::SeqCst) {
                tokio::time::sleep(std::time::Duration::from_millis(200)).await;
            }
            self.inner.save(record).await
        }

        async fn set_quota(&self, user_id: u64, quota: u32, today: NaiveDate) -> StoreResult<bool> {
            self.inner.set_quota(user_id, quota, today).await
        }

        async fn decrement_quota(&self, user_id: u64) -> StoreResult<Option<u32>> {
            if self.fail_decrement {
                return Err(StoreError::Malformed("write rejected".into()));
            }
            self.inner.decrement_quota(user_id).await
        }

        async fn list_users(&self) -> StoreResult<Vec<UserRecord>> {
            self.inner.list_users().await
        }

        async fn append_history(&self, entry: &HistoryRecord) -> StoreResult<()> {
            self.inner.append_history(entry).await
        }

        async fn recent_history(&self, user_id: u64, limit: usize) -> StoreResult<Vec<HistoryRecord>> {
            self.inner.recent_history(user_id, limit).await
        }
    }

    fn flaky_service(store: Arc<FlakyStore>) -> TranslationService {
        TranslationService::new(
            store,
            Arc::new(StubGenerator::replying(REPLY)),
            QuotaTracker::new(),
            QuotaClock::new(7, NaiveTime::MIN),
            NewUserDefaults::default(),
            20,
        )
    }

    /// Row from yesterday with nothing left, stored without touching the slow save.
    async fn seed_exhausted_yesterday(store: &FlakyStore, clock: &QuotaClock) {
        let today = clock.today();
        let mut record = UserRecord::new(1, "Ana", 0, 3, today - Duration::days(2));
        record.quota_date = Some(today - Duration::days(1));
        store.inner.save(&record).await.unwrap();
    }

    #[tokio::test]
    async fn test_rollover_from_profile_does_not_undo_a_decrement() {
        let store = Arc::new(FlakyStore {
            slow_first_save: true,
            ..Default::default()
        });
        let svc = flaky_service(store.clone());
        seed_exhausted_yesterday(&store, &svc.clock).await;

        let (loaded, outcome) = tokio::join!(svc.load_user(1, "Ana"), svc.translate(1, "Ana", "你好"));

        assert!(loaded.is_ok());
        assert!(matches!(outcome, TranslateOutcome::Translated { remaining: 2, .. }));
        assert_eq!(store.get(1).await.unwrap().unwrap().daily_quota_remaining, 2);
    }

    #[tokio::test]
    async fn test_rollover_does_not_overwrite_admin_override() {
        let store = Arc::new(FlakyStore {
            slow_first_save: true,
            ..Default::default()
        });
        let svc = flaky_service(store.clone());
        seed_exhausted_yesterday(&store, &svc.clock).await;

        let (loaded, updated) = tokio::join!(svc.load_user(1, "Ana"), svc.set_quota(1, 10));

        assert!(loaded.is_ok());
        assert!(updated.unwrap());
        assert_eq!(store.get(1).await.unwrap().unwrap().daily_quota_remaining, 10);
    }

    #[tokio::test]
    async fn test_failed_decrement_withholds_translation() {
        let store = Arc::new(FlakyStore {
            fail_decrement: true,
            ..Default::default()
        });
        let svc = flaky_service(store.clone());

        for _ in 0..5 {
            assert_eq!(svc.translate(1, "Ana", "你好").await, TranslateOutcome::Failed);
        }
        assert_eq!(store.get(1).await.unwrap().unwrap().daily_quota_remaining, 3);
        assert!(store.recent_history(1, 10).await.unwrap().is_empty());
        assert_eq!(svc.tracker.translations_for(1), 0);
    }
}
