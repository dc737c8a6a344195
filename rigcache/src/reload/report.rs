//! Outcome of one reload.

use std::fmt;
use std::time::Duration;

use crate::document::AssetKind;
use crate::error::ParseError;
use crate::identifier::AssetId;

/// Which driver ran the reload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReloadMode {
    /// [`super::SyncReloader`]: ran to completion on the caller's thread.
    Synchronous,

    /// [`super::AsyncReloader`]: parse units fanned out on a background runtime.
    Concurrent,
}

impl fmt::Display for ReloadMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReloadMode::Synchronous => write!(f, "synchronous"),
            ReloadMode::Concurrent => write!(f, "concurrent"),
        }
    }
}

/// One file left out of the new snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseFailure {
    pub id: AssetId,
    pub kind: AssetKind,

    /// Overlay that supplied the file.
    pub overlay: String,

    /// Rendered error.
    pub reason: String,
}

impl ParseFailure {
    pub(crate) fn new(kind: AssetKind, overlay: &str, error: &ParseError) -> Self {
        Self {
            id: error.id().clone(),
            kind,
            overlay: overlay.to_string(),
            reason: error.to_string(),
        }
    }
}

/// Summary of a published reload.
#[derive(Debug, Clone)]
pub struct ReloadReport {
    pub mode: ReloadMode,

    /// Generation of the snapshot this reload published.
    pub generation: u64,

    pub animations: usize,
    pub models: usize,

    /// Files that failed to read or parse, in the order they were seen.
    pub failures: Vec<ParseFailure>,

    /// Overlays skipped because they could not be enumerated.
    pub skipped: Vec<String>,

    pub elapsed: Duration,
}

impl ReloadReport {
    /// Check if every file loaded and every overlay was readable.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty() && self.skipped.is_empty()
    }

    /// Failures for one asset kind.
    pub fn failures_of(&self, kind: AssetKind) -> impl Iterator<Item = &ParseFailure> {
        self.failures.iter().filter(move |f| f.kind == kind)
    }
}

impl fmt::Display for ReloadReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "generation {} ({}): {} animations, {} models in {:.1?}",
            self.generation, self.mode, self.animations, self.models, self.elapsed
        )?;

        if !self.failures.is_empty() {
            write!(f, "\n  {} failed:", self.failures.len())?;
            for failure in &self.failures {
                write!(
                    f,
                    "\n    [{}] {} ({}): {}",
                    failure.kind, failure.id, failure.overlay, failure.reason
                )?;
            }
        }

        if !self.skipped.is_empty() {
            write!(f, "\n  skipped overlays: {}", self.skipped.join(", "))?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report() -> ReloadReport {
        ReloadReport {
            mode: ReloadMode::Synchronous,
            generation: 3,
            animations: 2,
            models: 1,
            failures: Vec::new(),
            skipped: Vec::new(),
            elapsed: Duration::from_millis(12),
        }
    }

    #[test]
    fn test_clean_report() {
        let report = report();
        assert!(report.is_clean());

        let text = report.to_string();
        assert!(text.starts_with("generation 3 (synchronous): 2 animations, 1 models"));
        assert!(!text.contains("failed"));
    }

    #[test]
    fn test_report_lists_failures_and_skips() {
        let id = AssetId::new("x", "animations/bad.json");
        let error = ParseError::invalid(&id, "broken");

        let mut report = report();
        report.failures.push(ParseFailure::new(AssetKind::Animation, "base", &error));
        report.skipped.push("gone.zip".to_string());

        assert!(!report.is_clean());
        assert_eq!(report.failures_of(AssetKind::Animation).count(), 1);
        assert_eq!(report.failures_of(AssetKind::Model).count(), 0);

        let text = report.to_string();
        assert!(text.contains("1 failed"));
        assert!(text.contains("x:animations/bad.json (base)"));
        assert!(text.contains("skipped overlays: gone.zip"));
    }
}
