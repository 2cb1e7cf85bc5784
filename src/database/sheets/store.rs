//! Spreadsheet-backed record store.
//!
//! Users table columns: `A` id, `B` name, `C` quota, `D` remaining days,
//! `E` join date, `F` quota date. History table columns: `A` user id,
//! `B` timestamp, `C` source text, `D` translated text.
//!
//! The sheet has no index, so locating a row means scanning the table. The
//! scan result is memoised as an id -> row number cache; every cache hit is
//! verified by reading that single row before it is trusted.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde_json::{Value, json};
use tracing::{debug, warn};

use super::client::{RangeUpdate, Rows, SheetsClient, cell_text};
use crate::cache::{CacheConfig, TypedCache};
use crate::config::SheetsConfig;
use crate::database::error::StoreResult;
use crate::database::models::{HistoryRecord, UserRecord};
use crate::database::store::RecordStore;

const DATE_FORMAT: &str = "%Y-%m-%d";

pub struct SheetsStore {
    client: SheetsClient,
    users_range: String,
    history_range: String,
    sheet_name: String,
    first_row: usize,
    row_index: TypedCache<u64, usize>,
}

impl SheetsStore {
    pub fn new(client: SheetsClient, config: &SheetsConfig) -> Self {
        let row_index = TypedCache::new(
            "sheet_row_index",
            CacheConfig::with_capacity(20_000).ttl(Duration::from_secs(600)),
        );

        Self {
            client,
            sheet_name: sheet_name(&config.users_range).to_string(),
            first_row: first_row(&config.users_range),
            users_range: config.users_range.clone(),
            history_range: config.history_range.clone(),
            row_index,
        }
    }

    fn row_range(&self, row: usize) -> String {
        format!("{}!A{row}:F{row}", self.sheet_name)
    }

    /// Find the sheet row holding `user_id`.
    async fn locate(&self, user_id: u64) -> StoreResult<Option<(usize, UserRecord)>> {
        if let Some(row) = self.row_index.get(&user_id) {
            let values = self.client.get(&self.row_range(row)).await?;
            if let Some(record) = values.first().and_then(|r| parse_user_row(r))
                && record.user_id == user_id
            {
                return Ok(Some((row, record)));
            }
            debug!("Row index for user {} is stale", user_id);
            self.row_index.invalidate(&user_id);
        }

        let found = self
            .scan()
            .await?
            .into_iter()
            .find(|(_, record)| record.user_id == user_id);
        Ok(found)
    }

    /// Read the whole users table and rebuild the row index.
    async fn scan(&self) -> StoreResult<Vec<(usize, UserRecord)>> {
        let rows = self.client.get(&self.users_range).await?;
        let records = index_rows(&rows, self.first_row);
        for (row, record) in &records {
            self.row_index.insert(record.user_id, *row);
        }
        debug!("Scanned {} user rows", records.len());
        Ok(records)
    }
}

#[async_trait]
impl RecordStore for SheetsStore {
    fn name(&self) -> &'static str {
        "sheets"
    }

    async fn get(&self, user_id: u64) -> StoreResult<Option<UserRecord>> {
        Ok(self.locate(user_id).await?.map(|(_, record)| record))
    }

    async fn save(&self, record: &UserRecord) -> StoreResult<()> {
        match self.locate(record.user_id).await? {
            Some((row, _)) => {
                let update = RangeUpdate {
                    range: self.row_range(row),
                    values: vec![user_row(record)],
                };
                self.client.batch_update(&[update]).await
            }
            None => {
                self.client
                    .append(&self.users_range, &[user_row(record)])
                    .await
            }
        }
    }

    async fn set_quota(&self, user_id: u64, quota: u32, today: NaiveDate) -> StoreResult<bool> {
        let Some((row, _)) = self.locate(user_id).await? else {
            return Ok(false);
        };

        let updates = [
            RangeUpdate {
                range: format!("{}!C{row}", self.sheet_name),
                values: vec![vec![json!(quota)]],
            },
            RangeUpdate {
                range: format!("{}!F{row}", self.sheet_name),
                values: vec![vec![json!(today.format(DATE_FORMAT).to_string())]],
            },
        ];
        self.client.batch_update(&updates).await?;
        Ok(true)
    }

    async fn decrement_quota(&self, user_id: u64) -> StoreResult<Option<u32>> {
        let Some((row, record)) = self.locate(user_id).await? else {
            return Ok(None);
        };
        if record.daily_quota_remaining == 0 {
            return Ok(None);
        }

        let remaining = record.daily_quota_remaining - 1;
        let update = RangeUpdate {
            range: format!("{}!C{row}", self.sheet_name),
            values: vec![vec![json!(remaining)]],
        };
        self.client.batch_update(&[update]).await?;
        Ok(Some(remaining))
    }

    async fn list_users(&self) -> StoreResult<Vec<UserRecord>> {
        Ok(self.scan().await?.into_iter().map(|(_, r)| r).collect())
    }

    async fn append_history(&self, entry: &HistoryRecord) -> StoreResult<()> {
        let row = vec![
            json!(entry.user_id.to_string()),
            json!(entry.timestamp.to_rfc3339()),
            json!(entry.source_text),
            json!(entry.translated_text),
        ];
        self.client.append(&self.history_range, &[row]).await
    }

    async fn recent_history(&self, user_id: u64, limit: usize) -> StoreResult<Vec<HistoryRecord>> {
        let rows = self.client.get(&self.history_range).await?;
        Ok(rows
            .iter()
            .rev()
            .filter_map(|row| parse_history_row(row))
            .filter(|h| h.user_id == user_id)
            .take(limit)
            .collect())
    }
}

/// Sheet name part of an A1 range (`'My Sheet'!A:F` -> `'My Sheet'`).
fn sheet_name(range: &str) -> &str {
    range.split_once('!').map(|(name, _)| name).unwrap_or(range)
}

/// First row number covered by an A1 range; whole-column ranges start at 1.
fn first_row(range: &str) -> usize {
    let cells = range.split_once('!').map(|(_, c)| c).unwrap_or(range);
    let start = cells.split(':').next().unwrap_or("");
    start
        .trim_start_matches(|c: char| c.is_ascii_alphabetic() || c == '$')
        .parse()
        .unwrap_or(1)
}

/// Pair every parsable user row with its 1-based sheet row number.
fn index_rows(rows: &Rows, first_row: usize) -> Vec<(usize, UserRecord)> {
    rows.iter()
        .enumerate()
        .filter_map(|(offset, row)| parse_user_row(row).map(|record| (first_row + offset, record)))
        .collect()
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw, DATE_FORMAT)
        .or_else(|_| NaiveDate::parse_from_str(raw, "%Y/%m/%d"))
        .ok()
}

fn parse_count(raw: &str) -> u32 {
    // Sheets may hand back "3.0" or "-1" after manual edits.
    raw.parse::<f64>()
        .map(|n| if n.is_finite() && n > 0.0 { n as u32 } else { 0 })
        .unwrap_or(0)
}

/// Parse a users-table row. Header and blank rows yield `None`.
fn parse_user_row(row: &[Value]) -> Option<UserRecord> {
    let user_id: u64 = cell_text(row, 0).parse().ok()?;
    let join_raw = cell_text(row, 4);
    let join_date = parse_date(&join_raw).unwrap_or_else(|| {
        warn!("User {} has unreadable join date '{}'", user_id, join_raw);
        NaiveDate::default()
    });

    Some(UserRecord {
        user_id,
        display_name: cell_text(row, 1),
        daily_quota_remaining: parse_count(&cell_text(row, 2)),
        remaining_trial_days: parse_count(&cell_text(row, 3)),
        join_date,
        quota_date: parse_date(&cell_text(row, 5)),
    })
}

fn user_row(record: &UserRecord) -> Vec<Value> {
    vec![
        json!(record.user_id.to_string()),
        json!(record.display_name),
        json!(record.daily_quota_remaining),
        json!(record.remaining_trial_days),
        json!(record.join_date.format(DATE_FORMAT).to_string()),
        json!(
            record
                .quota_date
                .map(|d| d.format(DATE_FORMAT).to_string())
                .unwrap_or_default()
        ),
    ]
}

fn parse_history_row(row: &[Value]) -> Option<HistoryRecord> {
    let user_id: u64 = cell_text(row, 0).parse().ok()?;
    let timestamp = DateTime::parse_from_rfc3339(&cell_text(row, 1))
        .map(|t| t.with_timezone(&Utc))
        .ok()?;

    Some(HistoryRecord {
        user_id,
        timestamp,
        source_text: cell_text(row, 2),
        translated_text: cell_text(row, 3),
    })
}
