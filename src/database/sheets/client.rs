//! Minimal Google Sheets v4 values client.
//!
//! Only the three range operations the store needs: `values.get`,
//! `values.append` and `values:batchUpdate`.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

use super::auth::TokenProvider;
use crate::database::error::{StoreError, StoreResult};

const SHEETS_API: &str = "https://sheets.googleapis.com/v4/spreadsheets/";

/// A rectangular block of cell values, one inner vector per row.
pub type Rows = Vec<Vec<Value>>;

#[derive(Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Rows,
}

#[derive(Serialize)]
struct AppendBody<'a> {
    values: &'a [Vec<Value>],
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct BatchUpdateBody<'a> {
    value_input_option: &'static str,
    data: &'a [RangeUpdate],
}

/// One range write inside a batch update.
#[derive(Debug, Clone, Serialize)]
pub struct RangeUpdate {
    pub range: String,
    pub values: Rows,
}

pub struct SheetsClient {
    http: reqwest::Client,
    auth: TokenProvider,
    spreadsheet_id: String,
}

impl SheetsClient {
    pub fn new(http: reqwest::Client, auth: TokenProvider, spreadsheet_id: String) -> Self {
        Self {
            http,
            auth,
            spreadsheet_id,
        }
    }

    /// Read all values in `range`.
    pub async fn get(&self, range: &str) -> StoreResult<Rows> {
        let url = self.values_url(range, None)?;
        let token = self.auth.token().await?;
        let response = self.http.get(url).bearer_auth(token).send().await?;
        let body: ValueRange = check(response).await?.json().await?;
        Ok(body.values)
    }

    /// Append rows after the last row of the table in `range`.
    pub async fn append(&self, range: &str, rows: &[Vec<Value>]) -> StoreResult<()> {
        let mut url = self.values_url(range, Some(":append"))?;
        url.query_pairs_mut()
            .append_pair("valueInputOption", "RAW")
            .append_pair("insertDataOption", "INSERT_ROWS");

        let token = self.auth.token().await?;
        let response = self
            .http
            .post(url)
            .bearer_auth(token)
            .json(&AppendBody { values: rows })
            .send()
            .await?;
        check(response).await?;
        Ok(())
    }

    /// Write several ranges in one request.
    pub async fn batch_update(&self, updates: &[RangeUpdate]) -> StoreResult<()> {
        let mut url = self.spreadsheet_url()?;
        url.path_segments_mut()
            .map_err(|_| StoreError::Malformed("spreadsheet url cannot be a base".into()))?
            .pop_if_empty()
            .push(&self.spreadsheet_id)
            .push("values:batchUpdate");

        let token = self.auth.token().await?;
        let response = self
            .http
            .post(url)
            .bearer_auth(token)
            .json(&BatchUpdateBody {
                value_input_option: "RAW",
                data: updates,
            })
            .send()
            .await?;
        check(response).await?;
        Ok(())
    }

    fn spreadsheet_url(&self) -> StoreResult<Url> {
        Url::parse(SHEETS_API).map_err(|e| StoreError::Malformed(e.to_string()))
    }

    fn values_url(&self, range: &str, suffix: Option<&str>) -> StoreResult<Url> {
        let mut url = self.spreadsheet_url()?;
        let last = match suffix {
            Some(suffix) => format!("{range}{suffix}"),
            None => range.to_string(),
        };
        url.path_segments_mut()
            .map_err(|_| StoreError::Malformed("spreadsheet url cannot be a base".into()))?
            .pop_if_empty()
            .push(&self.spreadsheet_id)
            .push("values")
            .push(&last);
        Ok(url)
    }
}

async fn check(response: reqwest::Response) -> StoreResult<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(StoreError::Api {
        status: status.as_u16(),
        body,
    })
}

/// Render a cell as plain text, whatever JSON type the API returned.
pub fn cell_text(row: &[Value], index: usize) -> String {
    match row.get(index) {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}
