mod common;

use std::sync::Arc;

use profilerag_core::types::ClearOutcome;
use profilerag_core::ErrorKind;
use profilerag_engine::INSUFFICIENT_INFORMATION;

use common::{builder, engine, sample_documents, CountingGenerator, FailingGenerator};

const QUESTION: &str = "What programming languages do you know?";

#[tokio::test]
async fn ranks_programming_passage_first_and_extracts_answer() {
    let engine = engine();
    assert_eq!(engine.add_documents(sample_documents()).await.unwrap(), 2);

    let ranked = engine.retrieve(QUESTION, 1).await.unwrap();
    assert_eq!(ranked.len(), 1);
    assert_eq!(ranked[0].text, "I know Python and TypeScript.");
    assert!(ranked[0].score > ranked[0].base_score, "boosted {} vs raw {}", ranked[0].score, ranked[0].base_score);

    let response = engine.query(QUESTION, Some(1)).await.unwrap();
    assert_eq!(response.sources.len(), 1);
    assert!(response.answer.contains("Python") || response.answer.contains("TypeScript"), "answer: {}", response.answer);
    assert!((0.0..=1.0).contains(&response.confidence));
    assert_eq!(response.confidence, response.sources[0].score);
}

#[tokio::test]
async fn rerank_never_lowers_scores() {
    let engine = engine();
    engine.add_documents(sample_documents()).await.unwrap();
    for r in engine.retrieve("Tell me about your team leadership", 2).await.unwrap() {
        assert!(r.score >= r.base_score);
        assert!(r.score <= 1.0);
    }
}

#[tokio::test]
async fn empty_index_gives_insufficient_information() {
    let generator = Arc::new(CountingGenerator::default());
    let engine = builder().generator(generator.clone()).build().unwrap();
    let response = engine.query(QUESTION, None).await.unwrap();
    assert_eq!(response.answer, INSUFFICIENT_INFORMATION);
    assert_eq!(response.confidence, 0.0);
    assert!(response.sources.is_empty());
    assert_eq!(generator.calls(), 0);
}

#[tokio::test]
async fn low_confidence_skips_generation() {
    let generator = Arc::new(CountingGenerator::default());
    let engine = builder().generator(generator.clone()).build().unwrap();
    engine.add_documents(sample_documents()).await.unwrap();

    let response = engine.query("weather forecast tomorrow", Some(2)).await.unwrap();
    assert!(response.confidence < 0.25, "confidence {}", response.confidence);
    assert_eq!(response.answer, INSUFFICIENT_INFORMATION);
    assert_eq!(generator.calls(), 0);
}

#[tokio::test]
async fn generator_answer_is_used_when_available() {
    let generator = Arc::new(CountingGenerator::default());
    let engine = builder().generator(generator.clone()).build().unwrap();
    engine.add_documents(sample_documents()).await.unwrap();

    let response = engine.query(QUESTION, Some(1)).await.unwrap();
    assert_eq!(response.answer, "Generated: Python and TypeScript.");
    assert_eq!(generator.calls(), 1);
}

#[tokio::test]
async fn generator_failure_falls_back_to_extraction() {
    let generator = Arc::new(FailingGenerator::default());
    let engine = builder().generator(generator.clone()).build().unwrap();
    engine.add_documents(sample_documents()).await.unwrap();

    let response = engine.query(QUESTION, Some(1)).await.unwrap();
    assert!(response.answer.contains("Python"));
    assert_eq!(generator.calls.load(std::sync::atomic::Ordering::SeqCst), 1);
}

#[tokio::test]
async fn repeated_query_is_served_from_cache() {
    let generator = Arc::new(CountingGenerator::default());
    let engine = builder().generator(generator.clone()).build().unwrap();
    engine.add_documents(sample_documents()).await.unwrap();

    let first = engine.query(QUESTION, Some(1)).await.unwrap();
    let second = engine.query(QUESTION, Some(1)).await.unwrap();
    assert_eq!(first, second);
    assert_eq!(serde_json::to_string(&first).unwrap(), serde_json::to_string(&second).unwrap());
    assert_eq!(generator.calls(), 1, "second call must not regenerate");

    // different top_k is a different key
    engine.query(QUESTION, Some(2)).await.unwrap();
    assert_eq!(generator.calls(), 2);

    let stats = engine.get_stats().await.unwrap();
    assert_eq!(stats.cache.hits, 1);
    assert_eq!(stats.cache.size, 2);
    assert_eq!(stats.metrics.request_count, 3);
}

#[tokio::test]
async fn expired_entries_rerun_the_pipeline() {
    let generator = Arc::new(CountingGenerator::default());
    let engine = builder()
        .generator(generator.clone())
        .cache_ttl(std::time::Duration::from_millis(30))
        .build()
        .unwrap();
    engine.add_documents(sample_documents()).await.unwrap();

    engine.query(QUESTION, Some(1)).await.unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(80)).await;
    engine.query(QUESTION, Some(1)).await.unwrap();
    assert_eq!(generator.calls(), 2);
}

#[tokio::test]
async fn batch_preserves_order_and_counts_once_per_question() {
    let engine = engine();
    engine.add_documents(sample_documents()).await.unwrap();

    let questions = vec!["q1".to_string(), "q2".to_string()];
    let answers = engine.batch_query(&questions, Some(3)).await.unwrap();
    assert_eq!(answers.len(), 2);
    assert_eq!(answers[0].question, "q1");
    assert_eq!(answers[1].question, "q2");
    for a in &answers {
        assert!((0.0..=1.0).contains(&a.response.confidence));
    }

    let stats = engine.get_stats().await.unwrap();
    assert_eq!(stats.metrics.request_count, 2);
    assert_eq!(stats.cache.size, 2);
}

#[tokio::test]
async fn invalid_input_is_rejected() {
    let engine = engine();
    assert_eq!(engine.query("   ", None).await.unwrap_err().kind(), ErrorKind::InvalidInput);
    assert_eq!(engine.query(QUESTION, Some(0)).await.unwrap_err().kind(), ErrorKind::InvalidInput);
    let docs = vec![profilerag_core::types::Document::new("doc_x", "")];
    assert_eq!(engine.add_documents(docs).await.unwrap_err().kind(), ErrorKind::InvalidInput);
}

#[tokio::test]
async fn stats_and_clear() {
    let engine = engine();
    let stats = engine.get_stats().await.unwrap();
    assert!(!stats.is_initialized);
    assert_eq!(stats.total_documents, 0);
    assert_eq!(stats.metrics.avg_latency_ms, 0);

    engine.add_documents(sample_documents()).await.unwrap();
    engine.query(QUESTION, None).await.unwrap();
    let stats = engine.get_stats().await.unwrap();
    assert!(stats.is_initialized);
    assert_eq!(stats.total_documents, 2);
    assert_eq!(stats.model_name.as_deref(), Some("concept:d3"));
    assert_eq!(stats.index_backend, "memory");

    assert_eq!(engine.clear_index().await.unwrap(), ClearOutcome::Cleared);
    assert!(engine.cache().is_empty());
    assert_eq!(engine.get_stats().await.unwrap().total_documents, 0);
}

#[tokio::test]
async fn unconfigured_lance_index_is_fatal_but_clear_is_not() {
    use profilerag_core::traits::Embedder;
    use profilerag_embed::EmbeddingProvider;
    use profilerag_engine::QueryEngine;
    use profilerag_vector::LanceIndex;

    let embedder = Arc::new(EmbeddingProvider::new(|| Ok(Box::new(common::ConceptEmbedder) as Box<dyn Embedder>)));
    let engine = QueryEngine::builder(embedder, Arc::new(LanceIndex::new(None, "profile", 3))).build().unwrap();

    let err = engine.query(QUESTION, None).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::IndexUnavailable);
    assert!(err.is_fatal());
    assert_eq!(engine.clear_index().await.unwrap(), ClearOutcome::Unsupported);
}
