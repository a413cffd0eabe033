//! OpenAI-compatible chat completions client.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use crate::error::ProviderError;

/// Sampling temperature for message generation. Low, so repeated runs over
/// the same diff stay close to deterministic.
const TEMPERATURE: f64 = 0.2;

/// Output token ceiling per request. Commit messages are short; anything
/// beyond this is the model rambling.
const MAX_TOKENS: u32 = 1000;

/// A single chat-style completion call.
///
/// Kept as a trait so the decision loop and generation runner can be
/// exercised with scripted fakes in tests.
#[async_trait]
pub trait CompletionClient {
    async fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        model: &str,
    ) -> Result<String, ProviderError>;
}

/// HTTP client for any OpenAI-compatible completions endpoint.
///
/// The base URL and API key come from the caller (flags, environment, or the
/// persisted config); the model is chosen per call.
#[derive(Clone)]
pub struct AiClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl AiClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }
}

#[async_trait]
impl CompletionClient for AiClient {
    async fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        model: &str,
    ) -> Result<String, ProviderError> {
        let url = format!("{}/chat/completions", self.base_url.trim_end_matches('/'));
        let body = json!({
            "model": model,
            "messages": [
                {
                    "role": "system",
                    "content": system_prompt
                },
                {
                    "role": "user",
                    "content": user_prompt
                }
            ],
            "temperature": TEMPERATURE,
            "max_tokens": MAX_TOKENS
        });

        let response = self
            .http
            .post(url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(ProviderError::RequestFailed)?;

        let status = response.status();
        let payload = response.text().await.unwrap_or_default();
        if !status.is_success() {
            return Err(ProviderError::Api {
                status: status.as_u16(),
                message: extract_api_error(&payload),
            });
        }

        let parsed: ChatResponse = serde_json::from_str(&payload)
            .map_err(|e| ProviderError::MalformedResponse(e.to_string()))?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content.unwrap_or_default())
            .ok_or(ProviderError::NoChoices)
    }
}

/// Pull a human-readable message out of the provider's error envelope.
///
/// OpenAI-compatible servers wrap failures as `{"error": {"message": ...}}`;
/// anything else falls back to the raw (truncated) body.
fn extract_api_error(body: &str) -> String {
    #[derive(Deserialize)]
    struct Envelope {
        error: Option<ApiError>,
    }
    #[derive(Deserialize)]
    struct ApiError {
        message: Option<String>,
    }

    if let Ok(parsed) = serde_json::from_str::<Envelope>(body)
        && let Some(err) = parsed.error
        && let Some(message) = err.message
    {
        return message;
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        "no error details returned".to_string()
    } else {
        trimmed.chars().take(500).collect()
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
}
