//! Chat-completions client.
//!
//! [`ChatModel`] is the seam the agent loop calls through; [`ChatClient`]
//! is the HTTP implementation used in production.

use crate::agent::error::ReviewError;
use crate::models::{ChatRequest, ChatResponse, Message, ToolDefinition};
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

/// A remote model that answers a conversation.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Send the full conversation plus tool declarations and return the raw response.
    async fn complete(
        &self,
        messages: &[Message],
        tools: &[ToolDefinition],
    ) -> Result<ChatResponse, ReviewError>;

    /// Model identifier, for logging and reports.
    fn model_name(&self) -> &str;
}

/// Connection settings for [`ChatClient`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub api_url: String,
    pub model_name: String,
    pub api_key: String,
    pub timeout_seconds: u64,
    pub temperature: Option<f32>,
}

/// HTTP client for an OpenAI-compatible chat-completions endpoint.
pub struct ChatClient {
    config: ClientConfig,
    http_client: reqwest::Client,
}

impl ChatClient {
    pub fn new(config: ClientConfig) -> Result<Self, ReviewError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| ReviewError::Transport(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            config,
            http_client,
        })
    }
}

#[async_trait]
impl ChatModel for ChatClient {
    async fn complete(
        &self,
        messages: &[Message],
        tools: &[ToolDefinition],
    ) -> Result<ChatResponse, ReviewError> {
        let request = ChatRequest {
            model: &self.config.model_name,
            messages,
            tools,
            temperature: self.config.temperature,
        };

        debug!(
            "Sending chat request with {} messages and {} tools",
            messages.len(),
            tools.len()
        );

        let response = self
            .http_client
            .post(&self.config.api_url)
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ReviewError::Timeout(self.config.timeout_seconds)
                } else if e.is_connect() {
                    ReviewError::Connect(self.config.api_url.clone())
                } else {
                    ReviewError::Transport(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ReviewError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await.map_err(|e| {
            if e.is_timeout() {
                ReviewError::Timeout(self.config.timeout_seconds)
            } else {
                ReviewError::Transport(e.to_string())
            }
        })?;

        serde_json::from_str(&body).map_err(|e| ReviewError::Decode(e.to_string()))
    }

    fn model_name(&self) -> &str {
        &self.config.model_name
    }
}
