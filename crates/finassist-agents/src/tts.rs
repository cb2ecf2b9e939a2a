use std::time::Duration;

use async_trait::async_trait;
use finassist_models::{AudioClip, TtsConfig};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{ensure_success, AgentError};
use crate::parser::clean_for_speech;

/// Text-to-speech backend.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Voice used when a request names none.
    fn default_voice(&self) -> &str;

    async fn synthesize(&self, text: &str, voice_id: &str) -> Result<AudioClip, AgentError>;
}

/// Murf text-to-speech client. Generates audio, then downloads the
/// returned audio file.
pub struct MurfSynthesizer {
    client: reqwest::Client,
    api_key: String,
    config: TtsConfig,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    text: &'a str,
    voice_id: &'a str,
    format: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    audio_file: Option<String>,
}

impl MurfSynthesizer {
    pub fn new(config: TtsConfig, api_key: impl Into<String>) -> Result<Self, AgentError> {
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
impl SpeechSynthesizer for MurfSynthesizer {
    fn default_voice(&self) -> &str {
        &self.config.default_voice
    }

    async fn synthesize(&self, text: &str, voice_id: &str) -> Result<AudioClip, AgentError> {
        let text = clean_for_speech(text);
        if text.is_empty() {
            return Err(AgentError::Parse("nothing to speak".to_string()));
        }
        debug!(voice = %voice_id, chars = text.len(), "Generating speech");

        let response = self
            .client
            .post(format!(
                "{}/speech/generate",
                self.config.base_url.trim_end_matches('/')
            ))
            .header("api-key", &self.api_key)
            .json(&GenerateRequest {
                text: &text,
                voice_id,
                format: self.config.format.to_uppercase(),
            })
            .send()
            .await?;
        let response = ensure_success("Murf", response).await?;
        let generated: GenerateResponse = response.json().await?;
        let audio_url = generated
            .audio_file
            .filter(|u| !u.is_empty())
            .ok_or_else(|| AgentError::Parse("Murf response had no audioFile".to_string()))?;

        let download = self.client.get(&audio_url).send().await?;
        let download = ensure_success("Murf", download).await?;
        let bytes = download.bytes().await?.to_vec();

        info!(voice = %voice_id, bytes = bytes.len(), "Speech generated");
        Ok(AudioClip {
            format: self.config.format.to_lowercase(),
            bytes,
        })
    }
}
