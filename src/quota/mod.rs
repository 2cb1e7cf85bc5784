//! Quota bookkeeping: quota-day clock and in-memory daily tracking.

mod clock;
mod tracker;

pub use clock::QuotaClock;
pub use tracker::{QuotaTracker, UsageSummary};
