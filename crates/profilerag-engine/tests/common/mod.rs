#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use profilerag_core::error::{Error, Result};
use profilerag_core::traits::{Embedder, GenerationRequest, Generator};
use profilerag_core::types::{Document, DocumentMetadata};
use profilerag_embed::EmbeddingProvider;
use profilerag_engine::{QueryEngine, QueryEngineBuilder};
use profilerag_vector::MemoryIndex;

const PROGRAMMING: &[&str] = &["python", "typescript", "rust", "programming", "languages", "language", "know", "code"];
const LEADERSHIP: &[&str] = &["team", "led", "lead", "leadership", "mentor", "person"];

/// Three-axis embedder: programming words, leadership words, everything else
/// (weighted low). Gives predictable cosine scores for tests.
pub struct ConceptEmbedder;

impl ConceptEmbedder {
    pub fn vector(text: &str) -> Vec<f32> {
        let mut v = vec![0f32; 3];
        let lower = text.to_lowercase();
        for token in lower.split(|c: char| !c.is_alphanumeric()).filter(|t| !t.is_empty()) {
            if PROGRAMMING.contains(&token) {
                v[0] += 1.0;
            } else if LEADERSHIP.contains(&token) {
                v[1] += 1.0;
            } else {
                v[2] += 0.1;
            }
        }
        v
    }
}

impl Embedder for ConceptEmbedder {
    fn model_id(&self) -> &str { "concept:d3" }
    fn dim(&self) -> usize { 3 }
    fn max_len(&self) -> usize { 512 }
    fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| Self::vector(t)).collect())
    }
}

#[derive(Default)]
pub struct CountingGenerator {
    pub calls: AtomicUsize,
}

impl CountingGenerator {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Generator for CountingGenerator {
    fn name(&self) -> &str { "counting" }
    async fn generate(&self, request: &GenerationRequest) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        assert!(request.prompt.contains("Context:"));
        Ok("Generated: Python and TypeScript.".to_string())
    }
}

#[derive(Default)]
pub struct FailingGenerator {
    pub calls: AtomicUsize,
}

#[async_trait]
impl Generator for FailingGenerator {
    fn name(&self) -> &str { "failing" }
    async fn generate(&self, _request: &GenerationRequest) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(Error::Generation("503 service unavailable".into()))
    }
}

pub fn builder() -> QueryEngineBuilder {
    let embedder = Arc::new(EmbeddingProvider::new(|| Ok(Box::new(ConceptEmbedder) as Box<dyn Embedder>)));
    QueryEngine::builder(embedder, Arc::new(MemoryIndex::new()))
}

pub fn engine() -> QueryEngine {
    builder().build().expect("engine")
}

pub fn keywords(words: &[&str]) -> DocumentMetadata {
    DocumentMetadata { keywords: words.iter().map(|w| w.to_string()).collect(), ..DocumentMetadata::default() }
}

pub fn sample_documents() -> Vec<Document> {
    vec![
        Document::new("doc_0", "I know Python and TypeScript.").with_metadata(keywords(&["Python", "TypeScript"])),
        Document::new("doc_1", "I led a 5-person team.").with_metadata(keywords(&["leadership"])),
    ]
}
