use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One completion call against a hosted model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionRequest {
    pub model: String,
    pub system_prompt: String,
    pub user_message: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionResponse {
    pub text: String,
}

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("model call timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },
    #[error("transport error: {0}")]
    Transport(String),
    #[error("model returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("model returned no content")]
    EmptyResponse,
    #[error("could not decode model response: {0}")]
    Decode(String),
    #[error("no API key configured for provider {provider}")]
    MissingApiKey { provider: String },
}

#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Provider name reported in labels and `/info`
    fn provider(&self) -> &str;

    async fn complete(&self, request: &CompletionRequest)
    -> Result<CompletionResponse, ModelError>;
}
