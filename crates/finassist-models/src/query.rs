use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Per-query switches supplied by the caller.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct QueryOptions {
    /// Voice the final response through the text-to-speech vendor.
    #[serde(default)]
    pub speak: bool,
    /// Voice to use. Falls back to `TtsConfig::default_voice`.
    #[serde(default)]
    pub voice_id: Option<String>,
}

/// A user question, typed or transcribed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Query {
    pub id: Uuid,
    pub text: String,
    /// Names of ingested documents to restrict retrieval to. Empty = all documents.
    #[serde(default)]
    pub documents: Vec<String>,
    #[serde(default)]
    pub options: QueryOptions,
    pub received_at: DateTime<Utc>,
}

impl Query {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            text: text.into(),
            documents: Vec::new(),
            options: QueryOptions::default(),
            received_at: Utc::now(),
        }
    }

    pub fn with_documents(mut self, documents: Vec<String>) -> Self {
        self.documents = documents;
        self
    }

    pub fn with_speech(mut self, voice_id: Option<String>) -> Self {
        self.options = QueryOptions {
            speak: true,
            voice_id,
        };
        self
    }

    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}
