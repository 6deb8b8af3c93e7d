//! Domain types shared by the embedding, index and engine crates.

use serde::{Deserialize, Deserializer, Serialize};

pub type DocumentId = String;

/// Optional, closed set of descriptive fields attached to a passage.
///
/// Unknown keys are ignored on deserialization, and a `keywords` value that is
/// not a list of strings is treated as empty rather than rejected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, deserialize_with = "lenient_keywords", skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl DocumentMetadata {
    pub fn with_source(source: impl Into<String>) -> Self {
        Self { source: Some(source.into()), ..Self::default() }
    }
}

fn lenient_keywords<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::Array(items)) => items
            .into_iter()
            .filter_map(|v| match v {
                serde_json::Value::String(s) => Some(s),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    })
}

/// A passage of the profile corpus, immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: DocumentId,
    pub text: String,
    #[serde(default)]
    pub metadata: DocumentMetadata,
}

impl Document {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self { id: id.into(), text: text.into(), metadata: DocumentMetadata::default() }
    }

    pub fn with_metadata(mut self, metadata: DocumentMetadata) -> Self {
        self.metadata = metadata;
        self
    }
}

/// A document after embedding; owned by the similarity index.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexedVector {
    pub id: DocumentId,
    pub embedding: Vec<f32>,
    pub text: String,
    pub metadata: DocumentMetadata,
}

impl IndexedVector {
    pub fn from_document(doc: Document, embedding: Vec<f32>) -> Self {
        Self { id: doc.id, embedding, text: doc.text, metadata: doc.metadata }
    }
}

/// A nearest-neighbour hit. `score` is cosine similarity clamped to [0, 1].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResult {
    pub text: String,
    pub score: f32,
    pub metadata: DocumentMetadata,
}

/// A search hit after lexical/metadata boosting.
///
/// `base_score` is the raw similarity, `score` the boosted value (≤ 1).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedResult {
    pub text: String,
    pub score: f32,
    pub base_score: f32,
    pub metadata: DocumentMetadata,
}

impl RankedResult {
    pub fn source(&self) -> Source {
        Source { text: self.text.clone(), score: self.score }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Source {
    pub text: String,
    pub score: f32,
}

/// The answer to a single question. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResponse {
    pub answer: String,
    pub sources: Vec<Source>,
    pub confidence: f32,
}

/// One element of a batch result, in input order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchAnswer {
    pub question: String,
    #[serde(flatten)]
    pub response: QueryResponse,
}

/// What an index did when asked to drop everything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ClearOutcome {
    Cleared,
    Unsupported,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceLevel {
    High,
    Medium,
    Low,
}

impl ConfidenceLevel {
    pub fn from_score(score: f32) -> Self {
        if score >= 0.7 {
            ConfidenceLevel::High
        } else if score >= 0.5 {
            ConfidenceLevel::Medium
        } else {
            ConfidenceLevel::Low
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            ConfidenceLevel::High => "High confidence - Very relevant match",
            ConfidenceLevel::Medium => "Medium confidence - Moderately relevant",
            ConfidenceLevel::Low => "Low confidence - May not be relevant",
        }
    }
}
