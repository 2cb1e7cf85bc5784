//! Gemini `generateContent` client with failover rotation.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{AiError, FailoverPair, ModelRotation, TextGenerator};
use crate::config::AiConfig;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    temperature: f64,
    #[serde(rename = "maxOutputTokens")]
    max_output_tokens: u32,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<ResponseContent>,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    parts: Option<Vec<ResponsePart>>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

impl GenerateResponse {
    fn into_text(self) -> Option<String> {
        let text: String = self
            .candidates
            .unwrap_or_default()
            .into_iter()
            .next()?
            .content?
            .parts
            .unwrap_or_default()
            .into_iter()
            .filter_map(|part| part.text)
            .collect();
        let text = text.trim();
        (!text.is_empty()).then(|| text.to_string())
    }
}

/// Gemini client. Each call uses the rotation's active pair; a failed call
/// moves the rotation forward for every later caller and is not retried.
pub struct GeminiClient {
    http: reqwest::Client,
    api_url: String,
    rotation: ModelRotation,
}

impl GeminiClient {
    pub fn new(config: &AiConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_url: config.api_url.trim_end_matches('/').to_string(),
            rotation: ModelRotation::new(config.api_keys.clone(), config.models.clone()),
        }
    }

    async fn call(&self, pair: &FailoverPair, prompt: &str) -> Result<String, AiError> {
        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
            generation_config: GenerationConfig {
                temperature: 0.4,
                max_output_tokens: 1024,
            },
        };

        let url = format!("{}/models/{}:generateContent", self.api_url, pair.model);
        let response = self
            .http
            .post(url)
            .header("x-goog-api-key", &pair.api_key)
            .json(&request)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AiError::Status {
                model: pair.model.clone(),
                status: status.as_u16(),
                body,
            });
        }

        let payload: GenerateResponse = response.json().await?;
        payload.into_text().ok_or(AiError::EmptyResponse)
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String, AiError> {
        let pair = self.rotation.current().ok_or(AiError::NotConfigured)?;
        debug!("Calling model {} with credential #{}", pair.model, pair.key_index + 1);

        match self.call(&pair, prompt).await {
            Ok(text) => Ok(text),
            Err(e) => {
                if let Some(next) = self.rotation.advance_from(&pair) {
                    warn!(
                        "Model {} (credential #{}) failed: {}; switching to {} (credential #{})",
                        pair.model,
                        pair.key_index + 1,
                        e,
                        next.model,
                        next.key_index + 1
                    );
                }
                Err(e)
            }
        }
    }

    fn active_pair(&self) -> Option<FailoverPair> {
        self.rotation.current()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_text_joins_first_candidate_parts() {
        let payload: GenerateResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"parts":[{"text":"ສະ"},{"text":"ບາຍດີ "}]}},
                {"content":{"parts":[{"text":"ignored"}]}}]}"#,
        )
        .unwrap();

        assert_eq!(payload.into_text().as_deref(), Some("ສະບາຍດີ"));
    }

    #[test]
    fn test_blocked_response_has_no_text() {
        let payload: GenerateResponse =
            serde_json::from_str(r#"{"candidates":[{"finishReason":"SAFETY"}]}"#).unwrap();
        assert!(payload.into_text().is_none());

        let payload: GenerateResponse = serde_json::from_str("{}").unwrap();
        assert!(payload.into_text().is_none());
    }

    #[tokio::test]
    async fn test_unconfigured_client_fails_fast() {
        let client = GeminiClient::new(&AiConfig {
            api_url: "http://127.0.0.1:9".into(),
            api_keys: vec![],
            models: vec!["m".into()],
        });

        assert!(matches!(client.generate("hi").await, Err(AiError::NotConfigured)));
        assert!(client.active_pair().is_none());
    }
}
