use std::sync::Arc;
use std::time::{Duration, Instant};

use finassist_models::document::render_context;
use finassist_models::{Chunk, Document, DocumentKind, RagConfig, RetrievedChunk};
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

use crate::chunker::TextChunker;
use crate::embed::Embedder;
use crate::error::DocsError;
use crate::index::VectorIndex;
use crate::loader::load_document;
use crate::memory::EmbeddingCache;

/// Outcome of ingesting one document.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct IngestReport {
    pub document: String,
    pub kind: DocumentKind,
    pub chunks: usize,
    /// True when an earlier upload with the same name was replaced.
    pub replaced: bool,
}

/// Chunked, embedded documents available for retrieval.
///
/// Read-heavy: queries take a read lock on the index, ingestion takes the
/// write lock only after all embeddings are computed.
pub struct DocumentStore {
    embedder: Arc<dyn Embedder>,
    cache: EmbeddingCache,
    chunker: TextChunker,
    index: RwLock<VectorIndex>,
}

impl DocumentStore {
    pub fn new(embedder: Arc<dyn Embedder>, chunker: TextChunker, cache: EmbeddingCache) -> Self {
        Self {
            embedder,
            cache,
            chunker,
            index: RwLock::new(VectorIndex::new()),
        }
    }

    pub fn from_config(embedder: Arc<dyn Embedder>, config: &RagConfig) -> Self {
        Self::new(
            embedder,
            TextChunker::new(config.chunk_size, config.chunk_overlap),
            EmbeddingCache::new(
                config.embedding_cache_capacity,
                Duration::from_secs(config.embedding_cache_ttl_seconds),
            ),
        )
    }

    pub fn embedder_name(&self) -> &str {
        self.embedder.name()
    }

    pub async fn ingest_bytes(&self, name: &str, bytes: &[u8]) -> Result<IngestReport, DocsError> {
        let document = load_document(name, bytes)?;
        self.ingest(document).await
    }

    pub async fn ingest(&self, document: Document) -> Result<IngestReport, DocsError> {
        let start = Instant::now();
        let pieces = self.chunker.split(&document.content);
        if pieces.is_empty() {
            return Err(DocsError::Empty(document.name));
        }
        let vectors = self.embed_all(&pieces).await?;

        let mut index = self.index.write().await;
        let replaced = index.remove_source(&document.name) > 0;
        let count = pieces.len();
        for (i, (text, vector)) in pieces.into_iter().zip(vectors).enumerate() {
            index.insert(
                Chunk {
                    id: Uuid::new_v4(),
                    source: document.name.clone(),
                    index: i,
                    text,
                },
                vector,
            );
        }

        info!(
            document = %document.name,
            chunks = count,
            replaced,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Document ingested"
        );

        Ok(IngestReport {
            document: document.name,
            kind: document.kind,
            chunks: count,
            replaced,
        })
    }

    /// Top `k` chunks for `query`, optionally restricted to `sources`.
    pub async fn search(
        &self,
        query: &str,
        k: usize,
        sources: &[String],
    ) -> Result<Vec<RetrievedChunk>, DocsError> {
        if self.index.read().await.is_empty() || query.trim().is_empty() {
            return Ok(Vec::new());
        }
        let vector = self
            .embed_all(&[query.to_string()])
            .await?
            .pop()
            .unwrap_or_default();
        let hits = self.index.read().await.search(&vector, k, sources);
        debug!(hits = hits.len(), "Document search");
        Ok(hits)
    }

    /// Retrieved chunks formatted as prompt context; empty when nothing matches.
    pub async fn context_for_query(
        &self,
        query: &str,
        k: usize,
        sources: &[String],
    ) -> Result<String, DocsError> {
        let hits = self.search(query, k, sources).await?;
        Ok(render_context(&hits))
    }

    pub async fn has_documents(&self) -> bool {
        !self.index.read().await.is_empty()
    }

    pub async fn document_names(&self) -> Vec<String> {
        self.index.read().await.sources()
    }

    pub async fn chunk_count(&self) -> usize {
        self.index.read().await.len()
    }

    pub async fn remove(&self, name: &str) -> bool {
        self.index.write().await.remove_source(name) > 0
    }

    pub async fn clear(&self) {
        self.index.write().await.clear();
        info!("Document store cleared");
    }

    async fn embed_all(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, DocsError> {
        let name = self.embedder.name().to_string();
        let mut vectors: Vec<Option<Vec<f32>>> = Vec::with_capacity(texts.len());
        let mut missing = Vec::new();
        for (i, text) in texts.iter().enumerate() {
            match self.cache.get(&name, text).await {
                Some(hit) => vectors.push(Some(hit.as_ref().clone())),
                None => {
                    vectors.push(None);
                    missing.push(i);
                }
            }
        }

        if !missing.is_empty() {
            let batch: Vec<String> = missing.iter().map(|&i| texts[i].clone()).collect();
            let fresh = self.embedder.embed(&batch).await?;
            if fresh.len() != batch.len() {
                return Err(DocsError::Embedding(format!(
                    "expected {} embeddings, got {}",
                    batch.len(),
                    fresh.len()
                )));
            }
            for (i, vector) in missing.into_iter().zip(fresh) {
                self.cache.insert(&name, &texts[i], vector.clone()).await;
                vectors[i] = Some(vector);
            }
        }

        Ok(vectors.into_iter().map(Option::unwrap_or_default).collect())
    }
}
