//! Translation history model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One completed translation. Append-only.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub user_id: u64,
    pub timestamp: DateTime<Utc>,
    pub source_text: String,
    pub translated_text: String,
}

impl HistoryRecord {
    pub fn new(
        user_id: u64,
        source_text: impl Into<String>,
        translated_text: impl Into<String>,
    ) -> Self {
        Self {
            user_id,
            timestamp: Utc::now(),
            source_text: source_text.into(),
            translated_text: translated_text.into(),
        }
    }
}
