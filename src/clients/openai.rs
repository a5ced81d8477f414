//! OpenAI-compatible chat-completions client

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::clients::traits::{CompletionRequest, CompletionResponse, ModelClient, ModelError};

const ERROR_BODY_CAP: usize = 500;

#[derive(Debug, Clone)]
pub struct OpenAIClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    timeout_ms: u64,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

impl OpenAIClient {
    pub fn new(
        api_key: Option<String>,
        base_url: impl Into<String>,
        timeout_ms: u64,
    ) -> Result<Self, ModelError> {
        let api_key = api_key
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| ModelError::MissingApiKey {
                provider: "openai".to_string(),
            })?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .build()
            .map_err(|e| ModelError::Transport(format!("failed to build http client: {e}")))?;

        Ok(Self {
            client,
            api_key,
            base_url: base_url.into(),
            timeout_ms,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl ModelClient for OpenAIClient {
    fn provider(&self) -> &str {
        "openai"
    }

    async fn complete(
        &self,
        request: &CompletionRequest,
    ) -> Result<CompletionResponse, ModelError> {
        debug!(
            "Requesting completion (model={}, system_chars={}, user_chars={})",
            request.model,
            request.system_prompt.len(),
            request.user_message.len()
        );

        let body = ChatRequest {
            model: &request.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: &request.system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: &request.user_message,
                },
            ],
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ModelError::Timeout {
                        timeout_ms: self.timeout_ms,
                    }
                } else {
                    ModelError::Transport(e.to_string())
                }
            })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ModelError::Status {
                status,
                body: truncate_snippet(&body, ERROR_BODY_CAP),
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| ModelError::Transport(e.to_string()))?;
        let text = extract_completion_text(&bytes)?;
        Ok(CompletionResponse { text })
    }
}

/// Pull `choices[0].message.content` out of a chat-completions body.
pub fn extract_completion_text(body: &[u8]) -> Result<String, ModelError> {
    let parsed: ChatResponse =
        serde_json::from_slice(body).map_err(|e| ModelError::Decode(e.to_string()))?;
    parsed
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .filter(|text| !text.trim().is_empty())
        .ok_or(ModelError::EmptyResponse)
}

fn truncate_snippet(input: &str, max: usize) -> String {
    if input.len() <= max {
        return input.to_string();
    }
    let mut end = max;
    while !input.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &input[..end])
}
