//! Atomic reload counters.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use super::MetricsSnapshot;

/// Counters shared by every reload on one cache.
///
/// All updates use relaxed ordering; the values are for reporting only and
/// never gate reload behavior.
#[derive(Debug, Default)]
pub struct ReloadMetrics {
    reloads_started: AtomicU64,
    reloads_completed: AtomicU64,
    reloads_failed: AtomicU64,
    files_parsed: AtomicU64,
    parse_failures: AtomicU64,
    containers_skipped: AtomicU64,
    last_reload_micros: AtomicU64,
}

impl ReloadMetrics {
    /// Create a metrics instance with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// A reload passed the in-progress check.
    pub fn reload_started(&self) {
        self.reloads_started.fetch_add(1, Ordering::Relaxed);
    }

    /// A reload published a new snapshot.
    pub fn reload_completed(&self, elapsed: Duration) {
        self.reloads_completed.fetch_add(1, Ordering::Relaxed);
        self.last_reload_micros
            .store(elapsed.as_micros() as u64, Ordering::Relaxed);
    }

    /// A reload ended without publishing.
    pub fn reload_failed(&self) {
        self.reloads_failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Record successfully parsed files.
    pub fn files_parsed(&self, count: u64) {
        self.files_parsed.fetch_add(count, Ordering::Relaxed);
    }

    /// Record one file that failed to read or parse.
    pub fn parse_failed(&self) {
        self.parse_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Record one overlay skipped because it could not be enumerated.
    pub fn container_skipped(&self) {
        self.containers_skipped.fetch_add(1, Ordering::Relaxed);
    }

    /// Copy the current counter values.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            reloads_started: self.reloads_started.load(Ordering::Relaxed),
            reloads_completed: self.reloads_completed.load(Ordering::Relaxed),
            reloads_failed: self.reloads_failed.load(Ordering::Relaxed),
            files_parsed: self.files_parsed.load(Ordering::Relaxed),
            parse_failures: self.parse_failures.load(Ordering::Relaxed),
            containers_skipped: self.containers_skipped.load(Ordering::Relaxed),
            last_reload: Duration::from_micros(self.last_reload_micros.load(Ordering::Relaxed)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_new_metrics_start_at_zero() {
        let snapshot = ReloadMetrics::new().snapshot();
        assert_eq!(snapshot, MetricsSnapshot::default());
    }

    #[test]
    fn test_counters_accumulate() {
        let metrics = ReloadMetrics::new();

        metrics.reload_started();
        metrics.files_parsed(3);
        metrics.files_parsed(2);
        metrics.parse_failed();
        metrics.container_skipped();
        metrics.reload_completed(Duration::from_millis(15));

        metrics.reload_started();
        metrics.reload_failed();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.reloads_started, 2);
        assert_eq!(snapshot.reloads_completed, 1);
        assert_eq!(snapshot.reloads_failed, 1);
        assert_eq!(snapshot.files_parsed, 5);
        assert_eq!(snapshot.parse_failures, 1);
        assert_eq!(snapshot.containers_skipped, 1);
        assert_eq!(snapshot.last_reload, Duration::from_millis(15));
    }

    #[test]
    fn test_thread_safe_counting() {
        let metrics = Arc::new(ReloadMetrics::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let m = Arc::clone(&metrics);
                std::thread::spawn(move || {
                    for _ in 0..50 {
                        m.parse_failed();
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(metrics.snapshot().parse_failures, 400);
    }
}
