// file: src/inference/chat.rs
// description: OpenAI-compatible chat completion client with bounded retries
// reference: https://platform.openai.com/docs/api-reference/chat

use crate::config::InferenceConfig;
use crate::error::{AnalysisError, Result};
use crate::inference::{ChatMessage, InferenceClient};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    messages: &'a [ChatMessage],
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: String,
}

/// Request failure with enough detail to decide whether a retry is worthwhile.
#[derive(Debug)]
struct SendFailure {
    status: Option<StatusCode>,
    message: String,
}

impl SendFailure {
    /// Transient conditions worth one more attempt: transport failures
    /// (no status at all), rate limiting, and server-side errors.
    fn is_retryable(&self) -> bool {
        match self.status {
            Some(status) => status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error(),
            None => true,
        }
    }
}

#[derive(Debug)]
pub struct ChatClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    temperature: f32,
    max_retries: u32,
}

impl ChatClient {
    /// Fails with `CapabilityUnavailable` when no API key is configured, which
    /// the orchestrator turns into the placeholder-output path.
    pub fn from_config(config: &InferenceConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| {
                AnalysisError::CapabilityUnavailable("no API key configured".to_string())
            })?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| {
                AnalysisError::CapabilityUnavailable(format!("failed to build HTTP client: {}", e))
            })?;

        Ok(Self {
            client,
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            temperature: config.temperature,
            max_retries: config.max_retries,
        })
    }

    async fn send_once(
        &self,
        messages: &[ChatMessage],
    ) -> std::result::Result<String, SendFailure> {
        let url = format!("{}/chat/completions", self.base_url);

        let request = ChatRequest {
            model: &self.model,
            temperature: self.temperature,
            messages,
        };

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| SendFailure {
                status: None,
                message: format!("request failed: {}", e),
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(SendFailure {
                status: Some(status),
                message: format!("API request failed with status {}: {}", status, error_text),
            });
        }

        let chat_response: ChatResponse = response.json().await.map_err(|e| SendFailure {
            // A 200 with an unreadable body is not worth retrying.
            status: Some(StatusCode::OK),
            message: format!("invalid JSON body: {}", e),
        })?;

        chat_response
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| SendFailure {
                status: Some(StatusCode::OK),
                message: "response contained no choices".to_string(),
            })
    }
}

#[async_trait]
impl InferenceClient for ChatClient {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
        let mut attempt = 0;

        loop {
            match self.send_once(messages).await {
                Ok(content) => {
                    debug!(
                        "Chat completion succeeded on attempt {} ({} chars)",
                        attempt + 1,
                        content.len()
                    );
                    return Ok(content);
                }
                Err(failure) if attempt < self.max_retries && failure.is_retryable() => {
                    attempt += 1;
                    let backoff = Duration::from_millis(500 * 2u64.pow(attempt));
                    warn!(
                        "Inference attempt {} failed ({}), retrying in {:?}",
                        attempt, failure.message, backoff
                    );
                    tokio::time::sleep(backoff).await;
                }
                Err(failure) => return Err(AnalysisError::Inference(failure.message)),
            }
        }
    }
}
