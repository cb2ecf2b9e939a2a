use finassist_models::{Chunk, RetrievedChunk};

/// Cosine similarity; zero when either vector is zero or lengths differ.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let na = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let nb = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if na == 0.0 || nb == 0.0 {
        return 0.0;
    }
    dot / (na * nb)
}

struct IndexedChunk {
    chunk: Chunk,
    vector: Vec<f32>,
}

/// Brute-force in-memory vector index.
#[derive(Default)]
pub struct VectorIndex {
    entries: Vec<IndexedChunk>,
}

impl VectorIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, chunk: Chunk, vector: Vec<f32>) {
        self.entries.push(IndexedChunk { chunk, vector });
    }

    /// Remove every chunk from `source`, returning how many were dropped.
    pub fn remove_source(&mut self, source: &str) -> usize {
        let before = self.entries.len();
        self.entries.retain(|e| e.chunk.source != source);
        before - self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Distinct sources in insertion order.
    pub fn sources(&self) -> Vec<String> {
        let mut seen: Vec<String> = Vec::new();
        for entry in &self.entries {
            if !seen.contains(&entry.chunk.source) {
                seen.push(entry.chunk.source.clone());
            }
        }
        seen
    }

    /// Top `k` chunks by cosine similarity. An empty `sources` slice searches
    /// everything; otherwise only chunks from the listed sources are scored.
    pub fn search(&self, query: &[f32], k: usize, sources: &[String]) -> Vec<RetrievedChunk> {
        let mut scored: Vec<RetrievedChunk> = self
            .entries
            .iter()
            .filter(|e| sources.is_empty() || sources.contains(&e.chunk.source))
            .map(|e| RetrievedChunk {
                chunk: e.chunk.clone(),
                score: cosine_similarity(query, &e.vector),
            })
            .collect();
        scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        scored.truncate(k);
        scored
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn chunk(source: &str, index: usize, text: &str) -> Chunk {
        Chunk {
            id: Uuid::new_v4(),
            source: source.to_string(),
            index,
            text: text.to_string(),
        }
    }

    #[test]
    fn cosine_of_parallel_and_orthogonal() {
        assert!((cosine_similarity(&[1.0, 2.0], &[2.0, 4.0]) - 1.0).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 1.0]), 0.0);
    }

    #[test]
    fn search_ranks_by_similarity() {
        let mut index = VectorIndex::new();
        index.insert(chunk("a.txt", 0, "east"), vec![1.0, 0.0]);
        index.insert(chunk("b.txt", 0, "north"), vec![0.0, 1.0]);
        index.insert(chunk("c.txt", 0, "north-east"), vec![0.7, 0.7]);

        let hits = index.search(&[0.0, 1.0], 2, &[]);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].chunk.source, "b.txt");
        assert_eq!(hits[1].chunk.source, "c.txt");
    }

    #[test]
    fn search_respects_source_filter() {
        let mut index = VectorIndex::new();
        index.insert(chunk("a.txt", 0, "east"), vec![1.0, 0.0]);
        index.insert(chunk("b.txt", 0, "north"), vec![0.0, 1.0]);

        let hits = index.search(&[0.0, 1.0], 5, &["a.txt".to_string()]);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].chunk.source, "a.txt");
    }

    #[test]
    fn sources_and_removal() {
        let mut index = VectorIndex::new();
        index.insert(chunk("a.txt", 0, "x"), vec![1.0]);
        index.insert(chunk("a.txt", 1, "y"), vec![1.0]);
        index.insert(chunk("b.txt", 0, "z"), vec![1.0]);
        assert_eq!(index.sources(), vec!["a.txt", "b.txt"]);

        assert_eq!(index.remove_source("a.txt"), 2);
        assert_eq!(index.len(), 1);

        index.clear();
        assert!(index.is_empty());
    }
}
