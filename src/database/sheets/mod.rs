//! Google Sheets backend.

mod auth;
mod client;
mod store;

pub use store::SheetsStore;

use crate::config::SheetsConfig;
use crate::database::error::StoreResult;

use auth::{ServiceAccountKey, TokenProvider};
use client::SheetsClient;

/// Build a spreadsheet store from configuration.
///
/// # Errors
/// Returns error if the service-account key cannot be parsed.
pub fn open(config: &SheetsConfig) -> StoreResult<SheetsStore> {
    let http = reqwest::Client::new();
    let key = ServiceAccountKey::from_json(&config.credentials_json)?;
    let auth = TokenProvider::new(key, http.clone())?;
    let client = SheetsClient::new(http, auth, config.spreadsheet_id.clone());
    Ok(SheetsStore::new(client, config))
}
