pub mod chunker;
pub mod embed;
pub mod error;
pub mod index;
pub mod loader;
pub mod memory;
pub mod store;

pub use chunker::TextChunker;
pub use embed::{Embedder, HashingEmbedder, OpenAiEmbedder};
pub use error::DocsError;
pub use store::{DocumentStore, IngestReport};
