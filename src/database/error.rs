//! Store error types.

use thiserror::Error;

/// Errors raised by record store backends.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("sheets api returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("mongodb error: {0}")]
    Mongo(#[from] mongodb::error::Error),

    #[error("credentials error: {0}")]
    Credentials(String),

    #[error("token signing failed: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    #[error("malformed data: {0}")]
    Malformed(String),
}

pub type StoreResult<T> = Result<T, StoreError>;
