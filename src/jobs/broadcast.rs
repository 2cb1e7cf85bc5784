//! Fan-out of one message to every known user and the configured group.
//!
//! Individual failures are counted and logged, never fatal to the batch.

use std::future::Future;

use futures::StreamExt;
use teloxide::prelude::*;
use teloxide::types::ParseMode;
use tracing::{info, warn};

use crate::bot::{AppState, ThrottledBot};
use crate::database::{StoreResult, UserRecord};

/// Concurrent sends in flight. The throttle adaptor still applies limits.
const SEND_CONCURRENCY: usize = 8;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    pub sent: usize,
    pub failed: usize,
}

impl BroadcastReport {
    pub fn attempted(&self) -> usize {
        self.sent + self.failed
    }
}

/// One chat per known user, then the group if configured.
pub fn broadcast_targets(users: &[UserRecord], group: Option<ChatId>) -> Vec<ChatId> {
    users
        .iter()
        .map(|u| ChatId(u.user_id as i64))
        .chain(group)
        .collect()
}

/// Run `send` once per target and tally the results.
pub async fn broadcast<F, Fut, E>(targets: Vec<ChatId>, send: F) -> BroadcastReport
where
    F: Fn(ChatId) -> Fut,
    Fut: Future<Output = Result<(), E>>,
    E: std::fmt::Display,
{
    let results: Vec<(ChatId, Result<(), E>)> = futures::stream::iter(targets)
        .map(|chat_id| {
            let fut = send(chat_id);
            async move { (chat_id, fut.await) }
        })
        .buffer_unordered(SEND_CONCURRENCY)
        .collect()
        .await;

    let mut report = BroadcastReport::default();
    for (chat_id, result) in results {
        match result {
            Ok(()) => report.sent += 1,
            Err(e) => {
                warn!("Broadcast to {} failed: {}", chat_id, e);
                report.failed += 1;
            }
        }
    }
    report
}

/// Send `text` (HTML) to all users and the group.
pub async fn send_to_all(
    bot: &ThrottledBot,
    state: &AppState,
    text: &str,
) -> StoreResult<BroadcastReport> {
    let users = state.store.list_users().await?;
    let targets = broadcast_targets(&users, state.group_chat_id);

    let report = broadcast(targets, |chat_id| {
        let request = bot
            .send_message(chat_id, text.to_string())
            .parse_mode(ParseMode::Html);
        async move { request.await.map(|_| ()) }
    })
    .await;

    info!(
        "Broadcast finished: {} sent, {} failed",
        report.sent, report.failed
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use chrono::NaiveDate;

    use super::*;

    fn users(n: u64) -> Vec<UserRecord> {
        let day = NaiveDate::from_ymd_opt(2026, 10, 18).unwrap();
        (1..=n).map(|id| UserRecord::new(id, "u", 3, 3, day)).collect()
    }

    #[test]
    fn test_targets_include_group_last() {
        let targets = broadcast_targets(&users(3), Some(ChatId(-100)));
        assert_eq!(targets.len(), 4);
        assert_eq!(targets[3], ChatId(-100));

        assert_eq!(broadcast_targets(&users(3), None).len(), 3);
    }

    #[tokio::test]
    async fn test_broadcast_attempts_every_target() {
        let attempts = AtomicUsize::new(0);
        let targets = broadcast_targets(&users(5), Some(ChatId(-100)));

        let report = broadcast(targets, |chat_id| {
            attempts.fetch_add(1, Ordering::SeqCst);
            async move {
                if chat_id.0 % 2 == 0 {
                    Err("blocked")
                } else {
                    Ok(())
                }
            }
        })
        .await;

        assert_eq!(attempts.load(Ordering::SeqCst), 6);
        assert_eq!(report.attempted(), 6);
        // Users 2 and 4 plus the group fail.
        assert_eq!(report, BroadcastReport { sent: 3, failed: 3 });
    }

    #[tokio::test]
    async fn test_broadcast_with_no_targets() {
        let report = broadcast(Vec::new(), |_| async { Ok::<(), String>(()) }).await;
        assert_eq!(report, BroadcastReport::default());
    }
}
