//! Answer synthesis: optional generative backend with a deterministic
//! extraction fallback.

use std::sync::Arc;

use regex::{Regex, RegexBuilder};

use profilerag_core::error::{Error, Result};
use profilerag_core::traits::{GenerationRequest, Generator};

pub const INSUFFICIENT_INFORMATION: &str = "I don't have enough relevant information to answer that question accurately. Try rephrasing or asking about a different topic.";

const SYSTEM_PROMPT: &str = "You answer questions about a professional profile. Use only the information in the provided context. \
If the context does not contain the answer, say that you do not have enough information. Keep answers concise and factual.";

/// Question category used by the extraction path. Variants are listed in
/// matching precedence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestionKind {
    Experience,
    Skills,
    Projects,
    Challenge,
    Leadership,
    General,
}

impl QuestionKind {
    const ALL: [QuestionKind; 5] = [
        QuestionKind::Experience,
        QuestionKind::Skills,
        QuestionKind::Projects,
        QuestionKind::Challenge,
        QuestionKind::Leadership,
    ];

    fn triggers(self) -> &'static [&'static str] {
        match self {
            QuestionKind::Experience => &["experience", "worked"],
            QuestionKind::Skills => &["skill", "technology", "know"],
            QuestionKind::Projects => &["project", "built", "developed"],
            QuestionKind::Challenge => &["challenge", "problem"],
            QuestionKind::Leadership => &["team", "leadership"],
            QuestionKind::General => &[],
        }
    }

    pub fn classify(question: &str) -> Self {
        let q = question.to_lowercase();
        Self::ALL
            .into_iter()
            .find(|kind| kind.triggers().iter().any(|t| q.contains(t)))
            .unwrap_or(QuestionKind::General)
    }

    fn line_pattern(self) -> Option<&'static str> {
        match self {
            QuestionKind::Experience => Some(r"\bat\b|position|achievement|result"),
            QuestionKind::Skills => Some(r"skills:|technology|experience|proficienc"),
            QuestionKind::Projects => Some(r"built|developed|implemented|project|result"),
            QuestionKind::Challenge => Some(r"situation|task|action|result|challenge"),
            QuestionKind::Leadership => Some(r"team|mentor|lead|leadership|manage"),
            QuestionKind::General => None,
        }
    }

    fn max_lines(self) -> usize {
        match self {
            QuestionKind::Challenge => 6,
            _ => 5,
        }
    }

    fn fallback_chars(self) -> usize {
        match self {
            QuestionKind::Experience | QuestionKind::Projects => 400,
            QuestionKind::Skills => 300,
            QuestionKind::Challenge => 500,
            QuestionKind::Leadership => 350,
            QuestionKind::General => 450,
        }
    }
}

/// Rule-based answer extraction from assembled context.
pub struct Extractor {
    patterns: Vec<(QuestionKind, Regex)>,
}

impl Extractor {
    pub fn new() -> Result<Self> {
        let mut patterns = Vec::new();
        for kind in QuestionKind::ALL {
            if let Some(p) = kind.line_pattern() {
                let re = RegexBuilder::new(p)
                    .case_insensitive(true)
                    .build()
                    .map_err(|e| Error::InvalidConfig(format!("bad extraction pattern for {:?}: {}", kind, e)))?;
                patterns.push((kind, re));
            }
        }
        Ok(Self { patterns })
    }

    pub fn extract(&self, question: &str, context: &str) -> String {
        let kind = QuestionKind::classify(question);
        if let Some((_, re)) = self.patterns.iter().find(|(k, _)| *k == kind) {
            let selected: Vec<&str> = context
                .lines()
                .map(str::trim)
                .filter(|l| !l.is_empty() && re.is_match(l))
                .take(kind.max_lines())
                .collect();
            if !selected.is_empty() {
                return selected.join(" ");
            }
        }
        prefix_with_ellipsis(context, kind.fallback_chars())
    }
}

fn prefix_with_ellipsis(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", text[..cut].trim()),
        None => text.trim().to_string(),
    }
}

/// Which path produced an answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerPath {
    Insufficient,
    Generated,
    Extracted,
}

pub struct Synthesizer {
    generator: Option<Arc<dyn Generator>>,
    extractor: Extractor,
    confidence_floor: f32,
    temperature: f32,
    max_tokens: u32,
}

impl Synthesizer {
    pub fn new(generator: Option<Arc<dyn Generator>>, confidence_floor: f32, temperature: f32, max_tokens: u32) -> Result<Self> {
        Ok(Self { generator, extractor: Extractor::new()?, confidence_floor, temperature, max_tokens })
    }

    pub fn has_generator(&self) -> bool {
        self.generator.is_some()
    }

    pub fn build_request(&self, question: &str, context: &str) -> GenerationRequest {
        GenerationRequest {
            system: SYSTEM_PROMPT.to_string(),
            prompt: format!("Context:\n{}\n\nQuestion: {}\n\nAnswer:", context, question),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        }
    }

    /// Never fails: generation errors fall back to extraction.
    pub async fn synthesize(&self, question: &str, context: &str, confidence: f32) -> (String, AnswerPath) {
        if context.trim().is_empty() || confidence < self.confidence_floor {
            tracing::debug!(confidence, "context too weak to answer");
            return (INSUFFICIENT_INFORMATION.to_string(), AnswerPath::Insufficient);
        }
        if let Some(generator) = &self.generator {
            let request = self.build_request(question, context);
            match generator.generate(&request).await {
                Ok(text) if !text.trim().is_empty() => return (text.trim().to_string(), AnswerPath::Generated),
                Ok(_) => tracing::warn!(backend = generator.name(), "generation returned empty output; using extraction"),
                Err(e) => tracing::warn!(backend = generator.name(), error = %e, "generation failed; using extraction"),
            }
        }
        (self.extractor.extract(question, context), AnswerPath::Extracted)
    }
}
