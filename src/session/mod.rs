//! Per-user conversational state.
//!
//! Replaces loose global flags with one concurrent map keyed by user id,
//! handed to every handler through `AppState`. State is process-local and
//! lost on restart.

use std::sync::Arc;

use dashmap::DashMap;

/// One-shot input the bot is waiting for from a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingInput {
    Feedback,
    AdminLimit,
    AdminBroadcast,
}

#[derive(Debug, Clone, Default)]
struct Session {
    translation_enabled: bool,
    pending: Option<PendingInput>,
}

#[derive(Clone, Default)]
pub struct SessionStore {
    sessions: Arc<DashMap<u64, Session>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_translation_enabled(&self, user_id: u64) -> bool {
        self.sessions
            .get(&user_id)
            .map(|s| s.translation_enabled)
            .unwrap_or(false)
    }

    /// Flip the translation switch and return the new state.
    pub fn toggle_translation(&self, user_id: u64) -> bool {
        let mut session = self.sessions.entry(user_id).or_default();
        session.translation_enabled = !session.translation_enabled;
        session.translation_enabled
    }

    /// Arm a one-shot input, replacing any previous one.
    pub fn expect_input(&self, user_id: u64, pending: PendingInput) {
        self.sessions.entry(user_id).or_default().pending = Some(pending);
    }

    /// Consume the pending input, if any.
    pub fn take_pending(&self, user_id: u64) -> Option<PendingInput> {
        self.sessions
            .get_mut(&user_id)
            .and_then(|mut s| s.pending.take())
    }

    /// Cancel a pending input without consuming it as data.
    pub fn clear_pending(&self, user_id: u64) -> bool {
        self.take_pending(user_id).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_translation_disabled_by_default() {
        let sessions = SessionStore::new();
        assert!(!sessions.is_translation_enabled(1));
    }

    #[test]
    fn test_toggle_twice_restores_state() {
        let sessions = SessionStore::new();

        assert!(sessions.toggle_translation(1));
        assert!(sessions.is_translation_enabled(1));
        assert!(!sessions.toggle_translation(1));
        assert!(!sessions.is_translation_enabled(1));

        // Other users are unaffected.
        assert!(!sessions.is_translation_enabled(2));
    }

    #[test]
    fn test_pending_input_is_one_shot() {
        let sessions = SessionStore::new();
        sessions.expect_input(1, PendingInput::Feedback);
        sessions.expect_input(1, PendingInput::AdminLimit);

        assert_eq!(sessions.take_pending(1), Some(PendingInput::AdminLimit));
        assert_eq!(sessions.take_pending(1), None);
        assert!(!sessions.clear_pending(1));
    }

    #[test]
    fn test_pending_does_not_touch_toggle() {
        let sessions = SessionStore::new();
        sessions.toggle_translation(1);
        sessions.expect_input(1, PendingInput::Feedback);
        sessions.take_pending(1);

        assert!(sessions.is_translation_enabled(1));
    }
}
