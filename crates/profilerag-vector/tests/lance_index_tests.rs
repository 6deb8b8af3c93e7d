use profilerag_core::traits::SimilarityIndex;
use profilerag_core::types::{ClearOutcome, DocumentMetadata, IndexedVector};
use profilerag_core::ErrorKind;
use profilerag_vector::LanceIndex;

fn row(id: &str, text: &str, embedding: Vec<f32>, keywords: &[&str]) -> IndexedVector {
    let metadata = DocumentMetadata {
        category: Some("skills".into()),
        keywords: keywords.iter().map(|k| k.to_string()).collect(),
        source: Some("profile".into()),
    };
    IndexedVector { id: id.into(), embedding, text: text.into(), metadata }
}

#[tokio::test]
async fn unconfigured_index_is_unavailable() {
    let index = LanceIndex::new(None, "profile", 4);
    assert_eq!(index.prepare().await.unwrap_err().kind(), ErrorKind::IndexUnavailable);
    assert_eq!(index.query(&[1.0, 0.0, 0.0, 0.0], 1).await.unwrap_err().kind(), ErrorKind::IndexUnavailable);
    assert_eq!(index.len().await.unwrap_err().kind(), ErrorKind::IndexUnavailable);
    assert_eq!(index.clear().await.unwrap(), ClearOutcome::Unsupported);
}

#[tokio::test]
async fn upsert_query_and_clear_round_trip() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    let uri = tmp.path().to_string_lossy().to_string();
    let index = LanceIndex::new(Some(uri), "profile", 4);
    index.prepare().await?;
    assert_eq!(index.len().await?, 0);
    assert!(index.query(&[1.0, 0.0, 0.0, 0.0], 3).await?.is_empty());

    index
        .upsert(vec![
            row("doc_0", "Rust and Go", vec![1.0, 0.0, 0.0, 0.0], &["Rust"]),
            row("doc_1", "Led a team", vec![0.0, 1.0, 0.0, 0.0], &[]),
        ])
        .await?;
    index.upsert(vec![row("doc_0", "Rust, Go and Python", vec![1.0, 0.1, 0.0, 0.0], &["Rust"])]).await?;
    assert_eq!(index.len().await?, 2);

    let hits = index.query(&[1.0, 0.0, 0.0, 0.0], 2).await?;
    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0].text, "Rust, Go and Python");
    assert_eq!(hits[0].metadata.keywords, vec!["Rust".to_string()]);
    assert!(hits.iter().all(|h| (0.0..=1.0).contains(&h.score)));
    assert!(hits[0].score >= hits[1].score);

    let err = index.query(&[1.0, 0.0], 2).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DimensionMismatch);

    assert_eq!(index.clear().await?, ClearOutcome::Cleared);
    assert_eq!(index.len().await?, 0);
    Ok(())
}

#[tokio::test]
async fn non_finite_vectors_are_rejected_before_touching_storage() {
    let index = LanceIndex::new(None, "profile", 2);
    let err = index.upsert(vec![row("doc_0", "bad", vec![f32::NAN, 1.0], &[])]).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
    let err = index.query(&[f32::INFINITY, 0.0], 1).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
}
