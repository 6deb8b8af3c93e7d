//! Brute-force in-process index. Suitable for profile-sized corpora.

use async_trait::async_trait;
use tokio::sync::RwLock;

use profilerag_core::error::{Error, Result};
use profilerag_core::traits::SimilarityIndex;
use profilerag_core::types::{ClearOutcome, IndexedVector, SearchResult};

use crate::similarity::{cosine, ensure_finite};

#[derive(Default)]
pub struct MemoryIndex {
    rows: RwLock<Vec<IndexedVector>>,
}

impl MemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SimilarityIndex for MemoryIndex {
    fn backend(&self) -> &str {
        "memory"
    }

    async fn upsert(&self, vectors: Vec<IndexedVector>) -> Result<()> {
        let mut rows = self.rows.write().await;
        let dim = rows.first().or(vectors.first()).map(|r| r.embedding.len());
        if let Some(d) = dim {
            if let Some(bad) = vectors.iter().find(|v| v.embedding.len() != d) {
                return Err(Error::DimensionMismatch { expected: d, actual: bad.embedding.len() });
            }
        }
        for v in &vectors {
            ensure_finite(&v.embedding)?;
        }
        for v in vectors {
            if let Some(existing) = rows.iter_mut().find(|r| r.id == v.id) {
                *existing = v;
            } else {
                rows.push(v);
            }
        }
        Ok(())
    }

    async fn query(&self, vector: &[f32], top_k: usize) -> Result<Vec<SearchResult>> {
        if top_k == 0 {
            return Err(Error::InvalidInput("top_k must be at least 1".into()));
        }
        ensure_finite(vector)?;
        let rows = self.rows.read().await;
        if let Some(first) = rows.first() {
            if first.embedding.len() != vector.len() {
                return Err(Error::DimensionMismatch { expected: first.embedding.len(), actual: vector.len() });
            }
        }
        let mut hits: Vec<SearchResult> = rows
            .iter()
            .map(|r| SearchResult { text: r.text.clone(), score: cosine(vector, &r.embedding), metadata: r.metadata.clone() })
            .collect();
        // stable: equal scores keep insertion order
        hits.sort_by(|a, b| b.score.total_cmp(&a.score));
        hits.truncate(top_k);
        Ok(hits)
    }

    async fn len(&self) -> Result<usize> {
        Ok(self.rows.read().await.len())
    }

    async fn clear(&self) -> Result<ClearOutcome> {
        self.rows.write().await.clear();
        Ok(ClearOutcome::Cleared)
    }
}
