use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

use crate::agent_message::AgentResult;
use crate::route::Route;

/// Synthesized speech for a response. Bytes travel as base64 in JSON.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AudioClip {
    /// Container format, e.g. "wav".
    pub format: String,
    #[serde(serialize_with = "to_base64", deserialize_with = "from_base64")]
    pub bytes: Vec<u8>,
}

impl AudioClip {
    pub fn mime_type(&self) -> String {
        match self.format.as_str() {
            "mp3" => "audio/mpeg".to_string(),
            other => format!("audio/{other}"),
        }
    }
}

fn to_base64<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&STANDARD.encode(bytes))
}

fn from_base64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
    let encoded = String::deserialize(deserializer)?;
    STANDARD
        .decode(encoded.as_bytes())
        .map_err(serde::de::Error::custom)
}

/// The answer returned to the caller for one query.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Response {
    pub id: Uuid,
    pub query_id: Uuid,
    pub route: Route,
    pub text: String,
    /// Every agent invocation that contributed, in route order.
    pub agent_results: Vec<AgentResult>,
    pub audio: Option<AudioClip>,
    /// Set when speech was requested but could not be produced.
    pub audio_error: Option<String>,
    pub responded_at: DateTime<Utc>,
    pub processing_time_ms: u64,
}

impl Response {
    pub fn failed_agents(&self) -> impl Iterator<Item = &AgentResult> {
        self.agent_results.iter().filter(|r| !r.is_ok())
    }
}
