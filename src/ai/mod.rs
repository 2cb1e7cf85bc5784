//! Generative-AI integration.
//!
//! - `gemini` - REST client for `generateContent`
//! - `rotation` - credential/model failover
//! - `prompt` - prompt templates and response parsing

mod gemini;
pub mod prompt;
mod rotation;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

pub use gemini::GeminiClient;
pub use rotation::{FailoverPair, ModelRotation};

/// Errors raised by text generators.
#[derive(Debug, Error)]
pub enum AiError {
    #[error("no api credentials configured")]
    NotConfigured,

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("model {model} returned {status}: {body}")]
    Status {
        model: String,
        status: u16,
        body: String,
    },

    #[error("model returned no text")]
    EmptyResponse,
}

/// Something that turns a prompt into text.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Run one completion.
    async fn generate(&self, prompt: &str) -> Result<String, AiError>;

    /// The (credential, model) pair the next call will use, if any.
    fn active_pair(&self) -> Option<FailoverPair> {
        None
    }
}

pub type SharedGenerator = Arc<dyn TextGenerator>;
