//! Query orchestration: cache, retrieval, re-ranking, context assembly and
//! answer synthesis over injected collaborators.

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use tokio::sync::OnceCell;

use profilerag_core::config::{CacheSettings, GenerationSettings, QuerySettings, Settings};
use profilerag_core::error::{Error, Result};
use profilerag_core::traits::{Generator, SimilarityIndex};
use profilerag_core::types::{BatchAnswer, ClearOutcome, Document, IndexedVector, QueryResponse, RankedResult, Source};
use profilerag_embed::EmbeddingProvider;
use profilerag_vector::index_from_settings;

use crate::cache::{CacheKey, CacheStats, ResponseCache};
use crate::context::assemble_context;
use crate::generation::OpenAiCompatibleGenerator;
use crate::metrics::{Metrics, MetricsSnapshot};
use crate::rerank::rerank;
use crate::synth::Synthesizer;

#[derive(Debug, Clone, Serialize)]
pub struct EngineStats {
    pub total_documents: usize,
    pub is_initialized: bool,
    pub model_name: Option<String>,
    pub index_backend: String,
    pub generation_enabled: bool,
    pub cache: CacheStats,
    pub metrics: MetricsSnapshot,
}

pub struct QueryEngine {
    embedder: Arc<EmbeddingProvider>,
    index: Arc<dyn SimilarityIndex>,
    synthesizer: Synthesizer,
    cache: ResponseCache,
    metrics: Metrics,
    options: QuerySettings,
    index_ready: OnceCell<()>,
    started_at: Instant,
}

pub struct QueryEngineBuilder {
    embedder: Arc<EmbeddingProvider>,
    index: Arc<dyn SimilarityIndex>,
    generator: Option<Arc<dyn Generator>>,
    query: QuerySettings,
    cache: CacheSettings,
    cache_ttl: Option<Duration>,
    temperature: f32,
    max_tokens: u32,
}

impl QueryEngineBuilder {
    pub fn generator(mut self, generator: Arc<dyn Generator>) -> Self {
        self.generator = Some(generator);
        self
    }

    pub fn query_settings(mut self, query: QuerySettings) -> Self {
        self.query = query;
        self
    }

    pub fn cache_settings(mut self, cache: CacheSettings) -> Self {
        self.cache = cache;
        self
    }

    /// Overrides `cache.ttl_secs` with a finer-grained duration.
    pub fn cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = Some(ttl);
        self
    }

    pub fn sampling(mut self, temperature: f32, max_tokens: u32) -> Self {
        self.temperature = temperature;
        self.max_tokens = max_tokens;
        self
    }

    pub fn build(self) -> Result<QueryEngine> {
        if self.query.default_top_k == 0 || self.query.context_budget == 0 {
            return Err(Error::InvalidConfig("query.default_top_k and query.context_budget must be > 0".into()));
        }
        if self.cache.capacity == 0 {
            return Err(Error::InvalidConfig("cache.capacity must be > 0".into()));
        }
        let ttl = self.cache_ttl.unwrap_or(Duration::from_secs(self.cache.ttl_secs));
        let synthesizer = Synthesizer::new(self.generator, self.query.confidence_floor, self.temperature, self.max_tokens)?;
        Ok(QueryEngine {
            embedder: self.embedder,
            index: self.index,
            synthesizer,
            cache: ResponseCache::new(self.cache.capacity, ttl),
            metrics: Metrics::default(),
            options: self.query,
            index_ready: OnceCell::new(),
            started_at: Instant::now(),
        })
    }
}

impl QueryEngine {
    pub fn builder(embedder: Arc<EmbeddingProvider>, index: Arc<dyn SimilarityIndex>) -> QueryEngineBuilder {
        let generation = GenerationSettings::default();
        QueryEngineBuilder {
            embedder,
            index,
            generator: None,
            query: QuerySettings::default(),
            cache: CacheSettings::default(),
            cache_ttl: None,
            temperature: generation.temperature,
            max_tokens: generation.max_tokens,
        }
    }

    /// Wire the configured embedder, index and (optional) generation backend.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        settings.validate()?;
        let embedder = Arc::new(EmbeddingProvider::from_settings(&settings.embedding));
        let index = index_from_settings(&settings.index, settings.embedding.dim);
        let mut builder = Self::builder(embedder, index)
            .query_settings(settings.query.clone())
            .cache_settings(settings.cache.clone())
            .sampling(settings.generation.temperature, settings.generation.max_tokens);
        if let Some(generator) = OpenAiCompatibleGenerator::from_settings(&settings.generation)? {
            builder = builder.generator(Arc::new(generator));
        }
        builder.build()
    }

    /// Load the embedding model and prepare the index. Safe to call
    /// repeatedly and concurrently.
    pub async fn initialize(&self) -> Result<()> {
        self.embedder.initialize().await?;
        self.index_ready
            .get_or_try_init(|| async {
                self.index.prepare().await?;
                tracing::info!(backend = self.index.backend(), "similarity index ready");
                Ok::<(), Error>(())
            })
            .await?;
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.embedder.is_ready()
    }

    pub fn default_top_k(&self) -> usize {
        self.options.default_top_k
    }

    pub fn cache(&self) -> &ResponseCache {
        &self.cache
    }

    pub fn uptime(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Embed and index `documents`. Returns how many were indexed.
    pub async fn add_documents(&self, documents: Vec<Document>) -> Result<usize> {
        if documents.is_empty() {
            return Ok(0);
        }
        if let Some(bad) = documents.iter().find(|d| d.id.trim().is_empty() || d.text.trim().is_empty()) {
            return Err(Error::InvalidInput(format!("document '{}' has an empty id or text", bad.id)));
        }
        self.initialize().await?;
        let texts: Vec<String> = documents.iter().map(|d| d.text.clone()).collect();
        let embeddings = self.embedder.embed_many(texts).await?;
        let rows: Vec<IndexedVector> = documents
            .into_iter()
            .zip(embeddings)
            .map(|(doc, emb)| IndexedVector::from_document(doc, emb))
            .collect();
        let count = rows.len();
        self.index.upsert(rows).await?;
        tracing::info!(count, backend = self.index.backend(), "documents indexed");
        Ok(count)
    }

    /// Over-fetch candidates, re-rank them and keep the best `top_k`.
    pub async fn retrieve(&self, question: &str, top_k: usize) -> Result<Vec<RankedResult>> {
        validate(question, top_k)?;
        self.initialize().await?;
        let vector = self.embedder.embed(question).await?;
        let candidates = top_k.max(self.options.min_candidates);
        let hits = self.index.query(&vector, candidates).await?;
        let mut ranked = rerank(hits, question);
        ranked.truncate(top_k);
        Ok(ranked)
    }

    pub async fn query(&self, question: &str, top_k: Option<usize>) -> Result<QueryResponse> {
        let started = Instant::now();
        let response = self.answer(question, top_k.unwrap_or(self.options.default_top_k)).await?;
        self.metrics.record(1, started.elapsed());
        Ok(response)
    }

    /// Answer every question concurrently; results follow input order.
    /// Metrics receive one aggregate update for the whole batch.
    pub async fn batch_query(&self, questions: &[String], top_k: Option<usize>) -> Result<Vec<BatchAnswer>> {
        let started = Instant::now();
        let top_k = top_k.unwrap_or(self.options.default_top_k);
        let answers = futures::future::try_join_all(questions.iter().map(|q| async move {
            let response = self.answer(q, top_k).await?;
            Ok::<_, Error>(BatchAnswer { question: q.clone(), response })
        }))
        .await?;
        let elapsed = started.elapsed();
        self.metrics.record(questions.len() as u64, elapsed);
        tracing::info!(questions = questions.len(), elapsed_ms = elapsed.as_millis() as u64, "batch answered");
        Ok(answers)
    }

    async fn answer(&self, question: &str, top_k: usize) -> Result<QueryResponse> {
        validate(question, top_k)?;
        let key = CacheKey::new(question, top_k);
        if let Some(hit) = self.cache.get(&key) {
            tracing::debug!(top_k, "cache hit");
            return Ok(hit);
        }
        let ranked = self.retrieve(question, top_k).await?;
        let confidence = ranked.first().map(|r| r.score).unwrap_or(0.0);
        let sources: Vec<Source> = ranked.iter().map(RankedResult::source).collect();
        let context = assemble_context(&sources, self.options.context_budget);
        let (answer, path) = self.synthesizer.synthesize(question, &context, confidence).await;
        tracing::debug!(?path, confidence, sources = sources.len(), "answer synthesized");
        let response = QueryResponse { answer, sources, confidence };
        self.cache.put(key, response.clone());
        Ok(response)
    }

    pub async fn get_stats(&self) -> Result<EngineStats> {
        Ok(EngineStats {
            total_documents: self.index.len().await?,
            is_initialized: self.is_initialized(),
            model_name: self.embedder.model_id(),
            index_backend: self.index.backend().to_string(),
            generation_enabled: self.synthesizer.has_generator(),
            cache: self.cache.stats(),
            metrics: self.metrics.snapshot(),
        })
    }

    /// Drop cached answers and ask the index to remove every passage.
    pub async fn clear_index(&self) -> Result<ClearOutcome> {
        self.cache.clear();
        let outcome = self.index.clear().await?;
        tracing::info!(?outcome, backend = self.index.backend(), "index cleared");
        Ok(outcome)
    }

    pub(crate) async fn index_len(&self) -> Result<usize> {
        self.index.len().await
    }
}

fn validate(question: &str, top_k: usize) -> Result<()> {
    if question.trim().is_empty() {
        return Err(Error::InvalidInput("question must not be empty".into()));
    }
    if top_k == 0 {
        return Err(Error::InvalidInput("top_k must be at least 1".into()));
    }
    Ok(())
}
