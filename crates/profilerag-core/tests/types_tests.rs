use profilerag_core::types::{BatchAnswer, ConfidenceLevel, Document, QueryResponse, Source};
use profilerag_core::{Error, ErrorKind};

#[test]
fn metadata_ignores_unknown_keys_and_malformed_keywords() {
    let doc: Document = serde_json::from_str(
        r#"{"id":"a","text":"hello","metadata":{"keywords":"not-a-list","color":"blue","category":"misc"}}"#,
    )
    .expect("lenient metadata");
    assert!(doc.metadata.keywords.is_empty());
    assert_eq!(doc.metadata.category.as_deref(), Some("misc"));

    let doc: Document = serde_json::from_str(r#"{"id":"b","text":"hi","metadata":{"keywords":["Rust", 7, ""]}}"#).unwrap();
    assert_eq!(doc.metadata.keywords, vec!["Rust".to_string(), String::new()]);

    let doc: Document = serde_json::from_str(r#"{"id":"c","text":"no metadata"}"#).unwrap();
    assert_eq!(doc.metadata, Default::default());
}

#[test]
fn batch_answer_flattens_response() {
    let item = BatchAnswer {
        question: "q1".into(),
        response: QueryResponse { answer: "a".into(), sources: vec![Source { text: "t".into(), score: 0.5 }], confidence: 0.5 },
    };
    let v = serde_json::to_value(&item).unwrap();
    assert_eq!(v["question"], "q1");
    assert_eq!(v["answer"], "a");
    assert_eq!(v["sources"][0]["text"], "t");
    assert!(v.get("response").is_none());
}

#[test]
fn confidence_levels_follow_thresholds() {
    assert_eq!(ConfidenceLevel::from_score(0.7), ConfidenceLevel::High);
    assert_eq!(ConfidenceLevel::from_score(0.69), ConfidenceLevel::Medium);
    assert_eq!(ConfidenceLevel::from_score(0.5), ConfidenceLevel::Medium);
    assert_eq!(ConfidenceLevel::from_score(0.1), ConfidenceLevel::Low);
}

#[test]
fn error_kinds_are_tags_not_strings() {
    assert_eq!(Error::EmbedderNotReady.kind(), ErrorKind::EmbedderNotReady);
    assert_eq!(Error::DimensionMismatch { expected: 3, actual: 2 }.kind(), ErrorKind::DimensionMismatch);
    assert!(!Error::Generation("timeout".into()).is_fatal());
    assert!(Error::IndexUnavailable("no uri".into()).is_fatal());
}
