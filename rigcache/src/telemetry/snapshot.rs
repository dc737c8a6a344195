//! Point-in-time copy of reload counters.

use std::fmt;
use std::time::Duration;

/// Values of [`super::ReloadMetrics`] at one instant.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub reloads_started: u64,
    pub reloads_completed: u64,
    pub reloads_failed: u64,
    pub files_parsed: u64,
    pub parse_failures: u64,
    pub containers_skipped: u64,

    /// Duration of the most recent successful reload.
    pub last_reload: Duration,
}

impl MetricsSnapshot {
    /// Share of parse attempts that failed, from 0.0 to 1.0.
    pub fn failure_rate(&self) -> f64 {
        let attempts = self.files_parsed + self.parse_failures;
        if attempts == 0 {
            0.0
        } else {
            self.parse_failures as f64 / attempts as f64
        }
    }
}

impl fmt::Display for MetricsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Reloads:   {} started, {} completed, {} failed",
            self.reloads_started, self.reloads_completed, self.reloads_failed
        )?;
        writeln!(
            f,
            "Files:     {} parsed, {} failed ({:.1}%)",
            self.files_parsed,
            self.parse_failures,
            self.failure_rate() * 100.0
        )?;
        writeln!(f, "Skipped:   {} containers", self.containers_skipped)?;
        write!(f, "Last run:  {:.1?}", self.last_reload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_rate() {
        let snapshot = MetricsSnapshot {
            files_parsed: 3,
            parse_failures: 1,
            ..Default::default()
        };
        assert!((snapshot.failure_rate() - 0.25).abs() < f64::EPSILON);
        assert_eq!(MetricsSnapshot::default().failure_rate(), 0.0);
    }

    #[test]
    fn test_display_lists_counters() {
        let snapshot = MetricsSnapshot {
            reloads_started: 2,
            reloads_completed: 1,
            containers_skipped: 4,
            ..Default::default()
        };
        let text = snapshot.to_string();
        assert!(text.contains("2 started"));
        assert!(text.contains("1 completed"));
        assert!(text.contains("4 containers"));
    }
}
