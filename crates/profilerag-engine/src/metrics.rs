use std::time::Duration;

use parking_lot::Mutex;
use serde::Serialize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct RuntimeMetrics {
    request_count: u64,
    total_latency_ms: u64,
    last_request_ms: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub request_count: u64,
    pub avg_latency_ms: u64,
    pub last_request_ms: u64,
}

/// Process-wide request counters. Each `record` call is one atomic update.
#[derive(Default)]
pub struct Metrics {
    inner: Mutex<RuntimeMetrics>,
}

impl Metrics {
    /// Account `requests` completed requests that together took `elapsed`.
    pub fn record(&self, requests: u64, elapsed: Duration) {
        let ms = elapsed.as_millis() as u64;
        let mut m = self.inner.lock();
        m.request_count += requests;
        m.total_latency_ms += ms;
        m.last_request_ms = ms;
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let m = *self.inner.lock();
        let avg_latency_ms = if m.request_count == 0 {
            0
        } else {
            (m.total_latency_ms as f64 / m.request_count as f64).round() as u64
        };
        MetricsSnapshot { request_count: m.request_count, avg_latency_ms, last_request_ms: m.last_request_ms }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn average_is_zero_without_requests() {
        assert_eq!(Metrics::default().snapshot().avg_latency_ms, 0);
    }

    #[test]
    fn batch_update_counts_every_request_once() {
        let m = Metrics::default();
        m.record(1, Duration::from_millis(10));
        m.record(3, Duration::from_millis(30));
        let s = m.snapshot();
        assert_eq!(s.request_count, 4);
        assert_eq!(s.avg_latency_ms, 10);
        assert_eq!(s.last_request_ms, 30);
    }
}
