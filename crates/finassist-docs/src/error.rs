use thiserror::Error;

#[derive(Error, Debug)]
pub enum DocsError {
    #[error("Unsupported document {name}: {reason}")]
    Unsupported { name: String, reason: String },

    #[error("Document {0} is empty")]
    Empty(String),

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
