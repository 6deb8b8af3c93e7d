//! Similarity index backends: brute-force in-memory and LanceDB.
pub mod lance;
pub mod memory;
pub mod schema;
pub mod similarity;
pub mod table;

use std::sync::Arc;

use profilerag_core::config::{IndexBackend, IndexSettings};
use profilerag_core::traits::SimilarityIndex;

pub use lance::LanceIndex;
pub use memory::MemoryIndex;
pub use similarity::cosine;

/// Build the configured index. `dim` is the embedding dimensionality the
/// Lance schema is created with.
pub fn index_from_settings(settings: &IndexSettings, dim: usize) -> Arc<dyn SimilarityIndex> {
    match settings.backend {
        IndexBackend::Memory => Arc::new(MemoryIndex::new()),
        IndexBackend::Lance => Arc::new(LanceIndex::new(settings.uri.clone(), settings.table.clone(), dim)),
    }
}
