//! Lazily initialized embedding provider.
//!
//! The model is loaded once, on a blocking thread, the first time
//! [`EmbeddingProvider::initialize`] is awaited. Concurrent first callers wait
//! on the same in-flight load; a failed load leaves the provider
//! uninitialized so a later call can retry.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::OnceCell;

use profilerag_core::config::EmbeddingSettings;
use profilerag_core::error::{Error, Result};
use profilerag_core::traits::Embedder;

type Loader = Arc<dyn Fn() -> anyhow::Result<Box<dyn Embedder>> + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderState {
    Uninitialized,
    Initializing,
    Ready,
}

pub struct EmbeddingProvider {
    loader: Loader,
    embedder: OnceCell<Arc<dyn Embedder>>,
    loading: AtomicBool,
}

/// Clears the in-flight flag when a load finishes, fails or is cancelled.
struct LoadingGuard<'a>(&'a AtomicBool);

impl<'a> LoadingGuard<'a> {
    fn set(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::Release);
        Self(flag)
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl EmbeddingProvider {
    pub fn new<F>(loader: F) -> Self
    where
        F: Fn() -> anyhow::Result<Box<dyn Embedder>> + Send + Sync + 'static,
    {
        Self { loader: Arc::new(loader), embedder: OnceCell::new(), loading: AtomicBool::new(false) }
    }

    pub fn from_settings(settings: &EmbeddingSettings) -> Self {
        let settings = settings.clone();
        Self::new(move || crate::embedder_from_settings(&settings))
    }

    pub fn state(&self) -> ProviderState {
        if self.embedder.initialized() {
            ProviderState::Ready
        } else if self.loading.load(Ordering::Acquire) {
            ProviderState::Initializing
        } else {
            ProviderState::Uninitialized
        }
    }

    pub fn is_ready(&self) -> bool {
        self.embedder.initialized()
    }

    /// Model identifier once loaded.
    pub fn model_id(&self) -> Option<String> {
        self.embedder.get().map(|e| e.model_id().to_string())
    }

    pub fn dim(&self) -> Option<usize> {
        self.embedder.get().map(|e| e.dim())
    }

    /// Load the model if no one has yet. Idempotent.
    pub async fn initialize(&self) -> Result<()> {
        self.embedder
            .get_or_try_init(|| async {
                let _loading = LoadingGuard::set(&self.loading);
                let started = Instant::now();
                let loader = Arc::clone(&self.loader);
                let loaded = tokio::task::spawn_blocking(move || loader()).await;
                match loaded {
                    Ok(Ok(embedder)) => {
                        let embedder: Arc<dyn Embedder> = Arc::from(embedder);
                        tracing::info!(
                            model = embedder.model_id(),
                            dim = embedder.dim(),
                            elapsed_ms = started.elapsed().as_millis() as u64,
                            "embedding provider ready"
                        );
                        Ok(embedder)
                    }
                    Ok(Err(e)) => {
                        tracing::error!(error = %e, "failed to initialize embedding provider");
                        Err(Error::Embedding(format!("{:#}", e)))
                    }
                    Err(join) => Err(Error::Embedding(format!("model loader panicked: {}", join))),
                }
            })
            .await?;
        Ok(())
    }

    pub async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut vectors = self.embed_many(vec![text.to_string()]).await?;
        vectors.pop().ok_or_else(|| Error::Embedding("embedder returned no vector".into()))
    }

    /// Embed several texts in one blocking call. Every vector is checked
    /// against the model's dimensionality.
    pub async fn embed_many(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>> {
        let embedder = self.embedder.get().cloned().ok_or(Error::EmbedderNotReady)?;
        if texts.iter().any(|t| t.trim().is_empty()) {
            return Err(Error::InvalidInput("cannot embed empty text".into()));
        }
        let expected_len = texts.len();
        let dim = embedder.dim();
        let vectors = tokio::task::spawn_blocking(move || embedder.embed_batch(&texts))
            .await
            .map_err(|e| Error::Embedding(format!("embedding task panicked: {}", e)))?
            .map_err(|e| Error::Embedding(format!("{:#}", e)))?;
        if vectors.len() != expected_len {
            return Err(Error::Embedding(format!("expected {} vectors, got {}", expected_len, vectors.len())));
        }
        if let Some(bad) = vectors.iter().find(|v| v.len() != dim) {
            return Err(Error::DimensionMismatch { expected: dim, actual: bad.len() });
        }
        Ok(vectors)
    }
}
