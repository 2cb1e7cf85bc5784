//! Daily reset of in-memory usage tracking.
//!
//! Stored quotas are not touched here; rows roll over lazily on the first
//! request of a new quota day.

use chrono::Utc;
use tracing::info;

use crate::quota::{QuotaClock, QuotaTracker};

/// Sleep until each quota-day boundary and clear the tracker.
pub async fn run(clock: QuotaClock, tracker: QuotaTracker) {
    loop {
        let wait = clock.until_next_reset(Utc::now());
        info!("Next quota reset in {}s", wait.as_secs());
        tokio::time::sleep(wait).await;

        reset_now(&tracker);
    }
}

pub fn reset_now(tracker: &QuotaTracker) {
    let summary = tracker.summary();
    tracker.reset();
    info!(
        "Daily reset: cleared usage for {} users ({} translations)",
        summary.active_users, summary.translations
    );
}
