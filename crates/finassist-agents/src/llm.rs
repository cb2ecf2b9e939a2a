use std::time::Duration;

use async_trait::async_trait;
use finassist_models::LlmConfig;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ensure_success, AgentError};

/// A chat-completion model. Mockable for testing.
#[async_trait]
pub trait ChatModel: Send + Sync {
    fn model(&self) -> &str;

    /// One-shot completion: system instructions plus a single user message.
    async fn complete(&self, system: &str, user: &str) -> Result<String, AgentError>;
}

/// Client for an OpenAI-compatible `/chat/completions` endpoint.
pub struct OpenAiChat {
    client: reqwest::Client,
    api_key: String,
    config: LlmConfig,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
    frequency_penalty: f32,
    presence_penalty: f32,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

impl OpenAiChat {
    pub fn new(config: LlmConfig, api_key: impl Into<String>) -> Result<Self, AgentError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;
        Ok(Self {
            client,
            api_key: api_key.into(),
            config,
        })
    }
}

#[async_trait]
impl ChatModel for OpenAiChat {
    fn model(&self) -> &str {
        &self.config.model
    }

    async fn complete(&self, system: &str, user: &str) -> Result<String, AgentError> {
        debug!(model = %self.config.model, "Requesting chat completion");

        let mut messages = vec![ChatMessage {
            role: "system",
            content: system,
        }];
        if !user.is_empty() {
            messages.push(ChatMessage {
                role: "user",
                content: user,
            });
        }

        let request = ChatRequest {
            model: &self.config.model,
            messages,
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
            frequency_penalty: self.config.frequency_penalty,
            presence_penalty: self.config.presence_penalty,
        };

        let response = self
            .client
            .post(format!(
                "{}/chat/completions",
                self.config.base_url.trim_end_matches('/')
            ))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;
        let response = ensure_success("OpenAI", response).await?;

        let parsed: ChatResponse = response.json().await?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .ok_or_else(|| AgentError::Parse("chat completion had no content".to_string()))
    }
}
