//! Reload telemetry.
//!
//! Lock-free counters updated by the reload drivers, copied into a
//! point-in-time snapshot for display.
//!
//! ```text
//! SyncReloader / AsyncReloader ───► ReloadMetrics ───► MetricsSnapshot ───► CLI
//!                                   (atomic counters)  (plain values)
//! ```
//!
//! # Example
//!
//! ```
//! use rigcache::telemetry::ReloadMetrics;
//! use std::time::Duration;
//!
//! let metrics = ReloadMetrics::new();
//! metrics.reload_started();
//! metrics.files_parsed(12);
//! metrics.reload_completed(Duration::from_millis(40));
//!
//! let snapshot = metrics.snapshot();
//! assert_eq!(snapshot.reloads_completed, 1);
//! assert_eq!(snapshot.files_parsed, 12);
//! ```

mod metrics;
mod snapshot;

pub use metrics::ReloadMetrics;
pub use snapshot::MetricsSnapshot;
