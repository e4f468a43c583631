pub mod openai;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::models::chat::ChatMessage;

pub use self::openai::OpenAIChatClient;

/// Body of an OpenAI-compatible `chat/completions` call.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UpstreamRequest {
    pub url: String,
    pub api_key: String,
    pub headers: Vec<(String, String)>,
    pub payload: CompletionRequest,
}

/// Status plus parsed body. Bodies that are not JSON arrive as `{}`.
#[derive(Debug, Clone, PartialEq)]
pub struct UpstreamResponse {
    pub status: u16,
    pub body: Value,
}

impl UpstreamResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Invalid header '{0}': {1}")]
    InvalidHeader(String, String),

    #[error("Upstream request failed: {0}")]
    Http(#[from] reqwest::Error),
}

/// One outbound POST to the completion provider. No retry.
#[async_trait]
pub trait CompletionTransport: Send + Sync {
    async fn post(&self, request: &UpstreamRequest) -> Result<UpstreamResponse, TransportError>;
}
