use std::sync::atomic::{AtomicU64, Ordering};
use serde::Serialize;

/// Pipeline counters.
///
/// All operations use `Ordering::Relaxed`; `snapshot()` is not atomic across
/// fields.
#[derive(Debug, Default)]
pub struct PipelineMetrics {
    pub chunks: AtomicU64,
    pub records: AtomicU64,
    pub dropped_records: AtomicU64,
    pub fragments: AtomicU64,
    pub sink_errors: AtomicU64,
    pub malformed_chunks: AtomicU64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PipelineSnapshot {
    pub chunks: u64,
    pub records: u64,
    pub dropped_records: u64,
    pub fragments: u64,
    pub sink_errors: u64,
    pub malformed_chunks: u64,
}

impl PipelineMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn add(counter: &AtomicU64, n: u64) {
        counter.fetch_add(n, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> PipelineSnapshot {
        PipelineSnapshot {
            chunks: self.chunks.load(Ordering::Relaxed),
            records: self.records.load(Ordering::Relaxed),
            dropped_records: self.dropped_records.load(Ordering::Relaxed),
            fragments: self.fragments.load(Ordering::Relaxed),
            sink_errors: self.sink_errors.load(Ordering::Relaxed),
            malformed_chunks: self.malformed_chunks.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_snapshot_reflects_counters() {
        let metrics = PipelineMetrics::new();
        PipelineMetrics::add(&metrics.records, 3);
        PipelineMetrics::add(&metrics.fragments, 2);
        PipelineMetrics::add(&metrics.fragments, 1);

        let snap = metrics.snapshot();
        assert_eq!(snap.records, 3);
        assert_eq!(snap.fragments, 3);
        assert_eq!(snap.sink_errors, 0);
    }

    #[test]
    fn test_concurrent_updates() {
        let metrics = Arc::new(PipelineMetrics::new());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let m = Arc::clone(&metrics);
                std::thread::spawn(move || {
                    for _ in 0..1000 {
                        PipelineMetrics::add(&m.chunks, 1);
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(metrics.snapshot().chunks, 4000);
    }

    #[test]
    fn test_snapshot_serializes() {
        let json = serde_json::to_value(PipelineMetrics::new().snapshot()).unwrap();
        assert_eq!(json["dropped_records"], 0);
    }
}
