use async_trait::async_trait;

use crate::error::Result;
use crate::types::{ClearOutcome, IndexedVector, SearchResult};

/// A black-box text → vector model. Implementations are CPU/GPU bound and
/// synchronous; async callers move them onto a blocking thread.
pub trait Embedder: Send + Sync {
    /// Stable identifier for the model (e.g. `minilm:all-MiniLM-L6-v2:d384`).
    fn model_id(&self) -> &str;
    fn dim(&self) -> usize;
    fn max_len(&self) -> usize;
    fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>>;
}

/// Stores embedded passages and answers cosine top-K queries.
#[async_trait]
pub trait SimilarityIndex: Send + Sync {
    /// Short backend label used in logs and stats.
    fn backend(&self) -> &str;

    /// Idempotent connection/table setup. Fails with `IndexUnavailable` when
    /// the backend has not been configured.
    async fn prepare(&self) -> Result<()> {
        Ok(())
    }

    async fn upsert(&self, vectors: Vec<IndexedVector>) -> Result<()>;

    /// Results are ordered by descending score and hold at most `top_k` items.
    async fn query(&self, vector: &[f32], top_k: usize) -> Result<Vec<SearchResult>>;

    async fn len(&self) -> Result<usize>;

    async fn clear(&self) -> Result<ClearOutcome>;
}

/// Parameters for a single completion call.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub system: String,
    pub prompt: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

/// A black-box text completion backend.
#[async_trait]
pub trait Generator: Send + Sync {
    fn name(&self) -> &str;
    async fn generate(&self, request: &GenerationRequest) -> Result<String>;
}
