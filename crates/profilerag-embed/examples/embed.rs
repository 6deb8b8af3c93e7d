use profilerag_core::config::{EmbeddingBackend, EmbeddingSettings};
use profilerag_embed::EmbeddingProvider;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = EmbeddingSettings { backend: EmbeddingBackend::Hash, ..EmbeddingSettings::default() };
    let provider = EmbeddingProvider::from_settings(&settings);
    provider.initialize().await?;
    let embs = provider.embed_many(vec!["hello world".to_string(), "rust embeddings".to_string()]).await?;
    println!("B={} dim={}", embs.len(), provider.dim().unwrap_or_default());
    Ok(())
}
