//! Reload phase tracking.
//!
//! ```text
//! Idle ─► Discovering ─► Parsing ─► AwaitingCompletion ─► Publishing ─► Idle
//! ```
//!
//! Only one reload may leave `Idle` at a time. The guard returned by
//! [`PhaseTracker::begin`] puts the tracker back to `Idle` however the reload
//! ends.

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};

use tracing::trace;

use crate::error::ReloadError;

/// Where a reload currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ReloadPhase {
    /// No reload running.
    Idle = 0,

    /// Enumerating overlays.
    Discovering = 1,

    /// Parse work dispatched.
    Parsing = 2,

    /// Waiting for outstanding parse work.
    AwaitingCompletion = 3,

    /// Swapping in the new snapshot.
    Publishing = 4,
}

impl ReloadPhase {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => ReloadPhase::Discovering,
            2 => ReloadPhase::Parsing,
            3 => ReloadPhase::AwaitingCompletion,
            4 => ReloadPhase::Publishing,
            _ => ReloadPhase::Idle,
        }
    }
}

impl fmt::Display for ReloadPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ReloadPhase::Idle => "idle",
            ReloadPhase::Discovering => "discovering",
            ReloadPhase::Parsing => "parsing",
            ReloadPhase::AwaitingCompletion => "awaiting completion",
            ReloadPhase::Publishing => "publishing",
        };
        f.write_str(name)
    }
}

/// Atomic holder of the current [`ReloadPhase`].
#[derive(Debug, Default)]
pub struct PhaseTracker {
    state: AtomicU8,
}

impl PhaseTracker {
    /// Create a tracker in [`ReloadPhase::Idle`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Current phase.
    pub fn current(&self) -> ReloadPhase {
        ReloadPhase::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Move from `Idle` to `Discovering`.
    ///
    /// Fails with [`ReloadError::InProgress`] if another reload holds the
    /// tracker.
    pub fn begin(&self) -> Result<PhaseGuard<'_>, ReloadError> {
        self.state
            .compare_exchange(
                ReloadPhase::Idle as u8,
                ReloadPhase::Discovering as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .map_err(|_| ReloadError::InProgress)?;

        trace!(phase = %ReloadPhase::Discovering, "Reload phase entered");
        Ok(PhaseGuard { tracker: self })
    }
}

/// Exclusive hold on a [`PhaseTracker`] for one reload.
#[derive(Debug)]
pub struct PhaseGuard<'a> {
    tracker: &'a PhaseTracker,
}

impl PhaseGuard<'_> {
    /// Enter `phase`.
    pub fn advance(&self, phase: ReloadPhase) {
        self.tracker.state.store(phase as u8, Ordering::Release);
        trace!(phase = %phase, "Reload phase entered");
    }
}

impl Drop for PhaseGuard<'_> {
    fn drop(&mut self) {
        self.tracker
            .state
            .store(ReloadPhase::Idle as u8, Ordering::Release);
    }
}
