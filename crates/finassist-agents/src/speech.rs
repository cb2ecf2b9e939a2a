use std::time::Duration;

use async_trait::async_trait;
use finassist_models::SpeechConfig;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use tracing::{debug, info};

use crate::error::{ensure_success, AgentError};

/// Speech-to-text backend.
#[async_trait]
pub trait Transcriber: Send + Sync {
    async fn transcribe(&self, file_name: &str, audio: Vec<u8>) -> Result<String, AgentError>;
}

/// Groq Whisper client (OpenAI-compatible `/audio/transcriptions`).
pub struct GroqTranscriber {
    client: reqwest::Client,
    api_key: String,
    config: SpeechConfig,
}

#[derive(Deserialize)]
struct TranscriptionResponse {
    text: String,
}

impl GroqTranscriber {
    pub fn new(config: SpeechConfig, api_key: impl Into<String>) -> Result<Self, AgentError> {
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
impl Transcriber for GroqTranscriber {
    async fn transcribe(&self, file_name: &str, audio: Vec<u8>) -> Result<String, AgentError> {
        if audio.is_empty() {
            return Err(AgentError::Parse("audio upload is empty".to_string()));
        }
        debug!(file = %file_name, bytes = audio.len(), model = %self.config.model, "Transcribing");

        let form = Form::new()
            .part("file", Part::bytes(audio).file_name(file_name.to_string()))
            .text("model", self.config.model.clone())
            .text("language", self.config.language.clone())
            .text("response_format", "json");

        let response = self
            .client
            .post(format!(
                "{}/audio/transcriptions",
                self.config.base_url.trim_end_matches('/')
            ))
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await?;
        let response = ensure_success("Groq", response).await?;
        let parsed: TranscriptionResponse = response.json().await?;

        let text = parsed.text.trim().to_string();
        if text.is_empty() {
            return Err(AgentError::Parse("transcription was empty".to_string()));
        }
        info!(chars = text.len(), "Transcription complete");
        Ok(text)
    }
}
