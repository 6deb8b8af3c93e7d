use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::engine::QueryEngine;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Down,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HealthChecks {
    pub embeddings: bool,
    pub vector_store: bool,
    pub cache: bool,
}

impl HealthChecks {
    pub fn status(&self) -> HealthStatus {
        let passed = [self.embeddings, self.vector_store, self.cache].iter().filter(|ok| **ok).count();
        match passed {
            3 => HealthStatus::Healthy,
            0 => HealthStatus::Down,
            _ => HealthStatus::Degraded,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub status: HealthStatus,
    pub checks: HealthChecks,
    pub timestamp: DateTime<Utc>,
    pub uptime_secs: u64,
    pub version: &'static str,
}

impl QueryEngine {
    /// Snapshot of component readiness. Never fails; an index error counts
    /// as a failed `vector_store` check.
    pub async fn health(&self) -> HealthReport {
        let vector_store = match self.index_len().await {
            Ok(n) => n > 0,
            Err(e) => {
                tracing::warn!(error = %e, "vector store check failed");
                false
            }
        };
        let checks = HealthChecks { embeddings: self.is_initialized(), vector_store, cache: true };
        HealthReport {
            status: checks.status(),
            checks,
            timestamp: Utc::now(),
            uptime_secs: self.uptime().as_secs(),
            version: env!("CARGO_PKG_VERSION"),
        }
    }
}
