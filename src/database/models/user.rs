//! User record model.
//!
//! One row per Telegram user: identity, remaining daily quota and trial days.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Persisted user row.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    /// Telegram user ID.
    pub user_id: u64,
    /// Display name captured at creation time.
    pub display_name: String,
    /// Translations left for the current quota day.
    pub daily_quota_remaining: u32,
    /// Trial days left (tracked, not enforced).
    pub remaining_trial_days: u32,
    /// Date the user first talked to the bot.
    pub join_date: NaiveDate,
    /// Quota day that `daily_quota_remaining` belongs to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quota_date: Option<NaiveDate>,
}

impl UserRecord {
    /// Create a fresh record for a first-time user.
    pub fn new(
        user_id: u64,
        display_name: impl Into<String>,
        quota: u32,
        trial_days: u32,
        today: NaiveDate,
    ) -> Self {
        Self {
            user_id,
            display_name: display_name.into(),
            daily_quota_remaining: quota,
            remaining_trial_days: trial_days,
            join_date: today,
            quota_date: Some(today),
        }
    }

    /// Roll the row over to `today` if it still belongs to an earlier quota day.
    ///
    /// Returns `true` when the record changed and must be written back.
    pub fn refresh_for_day(&mut self, today: NaiveDate, daily_quota: u32) -> bool {
        match self.quota_date {
            Some(day) if day >= today => false,
            previous => {
                self.daily_quota_remaining = daily_quota;
                if previous.is_some() {
                    self.remaining_trial_days = self.remaining_trial_days.saturating_sub(1);
                }
                self.quota_date = Some(today);
                true
            }
        }
    }
}
