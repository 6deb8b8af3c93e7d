//! Lexical and metadata boosting on top of vector similarity.

use std::collections::BTreeSet;

use profilerag_core::types::{RankedResult, SearchResult};

/// Added per query token found in the passage text.
pub const TOKEN_OVERLAP_BOOST: f32 = 0.02;
/// Added per metadata keyword found in the question.
pub const KEYWORD_BOOST: f32 = 0.03;

/// Lowercased, de-duplicated word tokens of `query`.
pub fn query_tokens(query: &str) -> BTreeSet<String> {
    query
        .to_lowercase()
        .split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

fn boost(result: &SearchResult, tokens: &BTreeSet<String>, query_lower: &str) -> f32 {
    let text_lower = result.text.to_lowercase();
    let overlap = tokens.iter().filter(|t| text_lower.contains(t.as_str())).count();
    let keyword_hits = result
        .metadata
        .keywords
        .iter()
        .filter(|kw| query_lower.contains(&kw.to_lowercase()))
        .count();
    overlap as f32 * TOKEN_OVERLAP_BOOST + keyword_hits as f32 * KEYWORD_BOOST
}

/// Boost each result and re-sort descending. Equal scores keep input order.
/// A non-finite similarity is treated as zero.
pub fn rerank(results: Vec<SearchResult>, query: &str) -> Vec<RankedResult> {
    let query_lower = query.to_lowercase();
    let tokens = query_tokens(query);
    let mut ranked: Vec<RankedResult> = results
        .into_iter()
        .map(|r| {
            let base_score = if r.score.is_finite() { r.score } else { 0.0 };
            let score = (base_score + boost(&r, &tokens, &query_lower)).min(1.0);
            RankedResult { text: r.text, score, base_score, metadata: r.metadata }
        })
        .collect();
    ranked.sort_by(|a, b| b.score.total_cmp(&a.score));
    ranked
}
