//! Message dispatcher setup.
//!
//! Builds the dispatcher with the command handler and the text router.

use std::sync::Arc;

use teloxide::adaptors::Throttle;
use teloxide::dispatching::UpdateHandler;
use teloxide::prelude::*;

use crate::ai::SharedGenerator;
use crate::config::Config;
use crate::database::{NewUserDefaults, SharedStore};
use crate::jobs::VocabularyMemory;
use crate::permissions::AdminList;
use crate::plugins;
use crate::quota::{QuotaClock, QuotaTracker};
use crate::session::SessionStore;
use crate::translation::TranslationService;

/// Bot type with Throttle adaptor for automatic rate limiting.
pub type ThrottledBot = Throttle<Bot>;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// User rows and translation history.
    pub store: SharedStore,

    /// Quota-checked translation flow.
    pub translator: Arc<TranslationService>,

    /// Model client (also used for vocabulary digests).
    pub generator: SharedGenerator,

    /// Per-user toggles and pending inputs.
    pub sessions: SessionStore,

    /// Today's in-memory usage counters.
    pub tracker: QuotaTracker,

    pub clock: QuotaClock,

    pub admins: AdminList,

    /// Recently broadcast vocabulary.
    pub vocabulary: VocabularyMemory,

    /// Group that also receives broadcasts.
    pub group_chat_id: Option<ChatId>,

    /// Daily quota granted on each new quota day.
    pub daily_quota: u32,
}

impl AppState {
    /// Create a new application state.
    pub fn new(store: SharedStore, generator: SharedGenerator, config: &Config) -> Self {
        let tracker = QuotaTracker::new();
        let clock = QuotaClock::new(config.quota.utc_offset_hours, config.quota.reset_time);
        let defaults = NewUserDefaults {
            daily_quota: config.quota.daily_quota,
            trial_days: config.quota.trial_days,
        };

        let translator = Arc::new(TranslationService::new(
            store.clone(),
            generator.clone(),
            tracker.clone(),
            clock,
            defaults,
            config.quota.max_chars,
        ));

        Self {
            store,
            translator,
            generator,
            sessions: SessionStore::new(),
            tracker,
            clock,
            admins: AdminList::new(config.admin_ids.iter().copied()),
            vocabulary: VocabularyMemory::default(),
            group_chat_id: config.group_chat_id.map(ChatId),
            daily_quota: config.quota.daily_quota,
        }
    }

    /// Check if a user is on the admin allow-list.
    pub fn is_admin(&self, user_id: u64) -> bool {
        self.admins.is_admin(user_id)
    }
}

/// Build the dispatcher with all handlers.
pub fn build_dispatcher(
    bot: ThrottledBot,
    state: AppState,
) -> Dispatcher<ThrottledBot, anyhow::Error, teloxide::dispatching::DefaultKey> {
    Dispatcher::builder(bot, schema())
        .dependencies(dptree::deps![state])
        .enable_ctrlc_handler()
        .build()
}

/// Build the handler schema.
fn schema() -> UpdateHandler<anyhow::Error> {
    use teloxide::dispatching::UpdateFilterExt;

    // Private chats only: commands first, then menu buttons, pending input and translation.
    Update::filter_message()
        .filter(|msg: Message| msg.chat.is_private())
        .branch(plugins::command_handler())
        .branch(plugins::text_handler())
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::ai::TextGenerator;
    use crate::database::MemoryStore;

    /// State over an in-memory store with the given admins and group.
    pub(crate) fn test_state(
        store: Arc<MemoryStore>,
        generator: Arc<dyn TextGenerator>,
        admin_ids: &str,
        group: Option<&str>,
    ) -> AppState {
        let admin_ids = admin_ids.to_string();
        let group = group.map(str::to_string);
        let config = Config::from_lookup(|key| match key {
            "BOT_TOKEN" => Some("123:test".to_string()),
            "ADMIN_IDS" => Some(admin_ids.clone()),
            "GROUP_CHAT_ID" => group.clone(),
            _ => None,
        })
        .unwrap();
        AppState::new(store, generator, &config)
    }

    #[test]
    fn test_state_wires_admins_and_group() {
        let store = Arc::new(MemoryStore::new());
        let generator = Arc::new(crate::translation::tests::StubGenerator::replying("x"));
        let state = test_state(store, generator, "5,6", Some("-100"));

        assert!(state.is_admin(5));
        assert!(!state.is_admin(7));
        assert_eq!(state.group_chat_id, Some(ChatId(-100)));
        assert_eq!(state.daily_quota, 3);
    }
}
