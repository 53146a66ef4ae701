//! Inference transport. The scorer only sees the [`InferenceBackend`]
//! trait; the default implementation speaks the OpenAI-compatible
//! chat-completions wire format so any hosted endpoint with that surface
//! works.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::InferenceError;

#[async_trait]
pub trait InferenceBackend: Send + Sync {
    async fn complete(
        &self,
        model: &str,
        system: &str,
        user: &str,
    ) -> Result<String, InferenceError>;
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

pub struct OpenAiBackend {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl OpenAiBackend {
    pub fn new(base_url: String, api_key: String, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }

    /// Configure from `INFERENCE_BASE_URL` / `INFERENCE_API_KEY`
    /// (`OPENAI_API_KEY` as the fallback key variable).
    pub fn from_env() -> Result<Self, InferenceError> {
        let base_url = std::env::var("INFERENCE_BASE_URL")
            .unwrap_or_else(|_| "https://api.openai.com".to_string());
        let api_key = std::env::var("INFERENCE_API_KEY")
            .or_else(|_| std::env::var("OPENAI_API_KEY"))
            .map_err(|_| {
                InferenceError::Config(
                    "set INFERENCE_API_KEY (or OPENAI_API_KEY) to enable scoring".to_string(),
                )
            })?;

        Ok(Self::new(base_url, api_key, Duration::from_secs(60)))
    }
}

#[async_trait]
impl InferenceBackend for OpenAiBackend {
    async fn complete(
        &self,
        model: &str,
        system: &str,
        user: &str,
    ) -> Result<String, InferenceError> {
        let request = ChatRequest {
            model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
            temperature: 0.2,
            max_tokens: 1024,
        };

        let response = self
            .client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(InferenceError::Service(format!("HTTP {status}: {body}")));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| InferenceError::Service(format!("bad completion payload: {e}")))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or(InferenceError::EmptyCompletion)
    }
}
