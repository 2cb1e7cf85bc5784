//! Quota day arithmetic in a fixed, configurable UTC offset.

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveTime, Offset, Utc};

/// Defines when a quota day starts.
#[derive(Debug, Clone, Copy)]
pub struct QuotaClock {
    offset: FixedOffset,
    reset_at: NaiveTime,
}

impl QuotaClock {
    /// Build a clock for `utc_offset_hours` with the day rolling over at `reset_at`
    /// local time. Out-of-range offsets fall back to UTC.
    pub fn new(utc_offset_hours: i32, reset_at: NaiveTime) -> Self {
        let offset = FixedOffset::east_opt(utc_offset_hours * 3600).unwrap_or_else(|| Utc.fix());
        Self { offset, reset_at }
    }

    /// Quota day containing `now`.
    pub fn day_of(&self, now: DateTime<Utc>) -> NaiveDate {
        let local = now.with_timezone(&self.offset).naive_local();
        (local - self.reset_at.signed_duration_since(NaiveTime::MIN)).date()
    }

    /// `at` in the quota timezone.
    pub fn local(&self, at: DateTime<Utc>) -> DateTime<FixedOffset> {
        at.with_timezone(&self.offset)
    }

    pub fn today(&self) -> NaiveDate {
        self.day_of(Utc::now())
    }

    /// Time left from `now` until the next quota day begins.
    pub fn until_next_reset(&self, now: DateTime<Utc>) -> std::time::Duration {
        let local = now.with_timezone(&self.offset).naive_local();
        let mut next = local.date().and_time(self.reset_at);
        if next <= local {
            next += Duration::days(1);
        }
        (next - local).to_std().unwrap_or_default()
    }
}
