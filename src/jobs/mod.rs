//! Background jobs.
//!
//! - `reset` - clears in-memory usage at each quota-day boundary
//! - `vocabulary` - periodic vocabulary digest to all users and the group
//! - `broadcast` - shared fan-out used by the digest and admin broadcasts

pub mod broadcast;
pub mod reset;
pub mod vocabulary;

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tracing::info;

use crate::bot::{AppState, ThrottledBot};
use crate::config::QuotaConfig;

pub use vocabulary::VocabularyMemory;

/// Handles to the spawned jobs. Dropping them does not stop the jobs.
pub struct JobHandles {
    handles: Vec<JoinHandle<()>>,
}

impl JobHandles {
    /// Abort all jobs.
    pub fn shutdown(self) {
        for handle in &self.handles {
            handle.abort();
        }
        info!("Stopped {} background jobs", self.handles.len());
    }
}

/// Spawn the reset and vocabulary jobs.
pub fn spawn_jobs(bot: ThrottledBot, state: AppState, quota: &QuotaConfig) -> JobHandles {
    let mut handles = Vec::new();

    handles.push(tokio::spawn(reset::run(
        state.clock,
        state.tracker.clone(),
    )));

    if quota.vocab_enabled() {
        let period = Duration::from_secs(quota.vocab_interval_minutes * 60);
        let words = quota.vocab_words;
        info!(
            "Vocabulary digest every {} minutes ({} words)",
            quota.vocab_interval_minutes, words
        );

        handles.push(tokio::spawn(async move {
            let mut timer = interval_at(Instant::now() + period, period);
            timer.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                timer.tick().await;
                vocabulary::run_once(&bot, &state, words).await;
            }
        }));
    } else {
        info!("Vocabulary digest disabled");
    }

    JobHandles { handles }
}
