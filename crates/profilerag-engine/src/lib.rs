//! Retrieval-augmented query engine over a profile knowledge base.
pub mod cache;
pub mod context;
pub mod engine;
pub mod generation;
pub mod health;
pub mod metrics;
pub mod rerank;
pub mod synth;

pub use cache::{CacheKey, CacheStats, ResponseCache};
pub use context::assemble_context;
pub use engine::{EngineStats, QueryEngine, QueryEngineBuilder};
pub use generation::OpenAiCompatibleGenerator;
pub use health::{HealthChecks, HealthReport, HealthStatus};
pub use metrics::{Metrics, MetricsSnapshot};
pub use rerank::rerank;
pub use synth::{AnswerPath, Extractor, QuestionKind, Synthesizer, INSUFFICIENT_INFORMATION};
