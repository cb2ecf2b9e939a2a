use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    Text,
    Markdown,
    Csv,
    Pdf,
}

/// An uploaded document after loading, ready for chunking.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Document {
    /// File name as uploaded. Used as the retrieval source label.
    pub name: String,
    pub kind: DocumentKind,
    pub content: String,
}

/// A slice of a document stored in the vector index.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Chunk {
    pub id: Uuid,
    pub source: String,
    /// Position of the chunk within its document.
    pub index: usize,
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RetrievedChunk {
    pub chunk: Chunk,
    /// Cosine similarity to the query, in [-1, 1].
    pub score: f32,
}

/// Format retrieved chunks as numbered context blocks for a prompt.
pub fn render_context(chunks: &[RetrievedChunk]) -> String {
    chunks
        .iter()
        .enumerate()
        .map(|(i, r)| {
            format!(
                "Document {} ({}):\n{}",
                i + 1,
                r.chunk.source,
                r.chunk.text.trim()
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}
