//! Reload drivers.
//!
//! Two ways to rebuild the cache from an overlay stack:
//!
//! ```text
//!  SyncReloader                          AsyncReloader
//!  ────────────                          ─────────────
//!  for overlay in stack:                 resolve stack (last overlay wins)
//!      enumerate animations + models         │
//!      parse (serial or rayon)               ▼
//!      fold into staging maps            one blocking unit per identifier
//!  publish both maps                         │  (Semaphore-bounded JoinSet)
//!                                            ▼
//!                                        join every unit
//!                                            │
//!                                            ▼
//!                                        publish on PublishExecutor
//!                                            │
//!                                            ▼
//!                                        ReloadStage handshake
//! ```
//!
//! Both produce the same mapping for the same overlays and both publish the
//! animation and geometry maps in a single step. Only one reload may run per
//! cache at a time; see [`PhaseTracker`].

mod async_driver;
mod executor;
mod phase;
mod report;
mod stage;
mod sync_driver;

pub use async_driver::AsyncReloader;
pub use executor::{InlineExecutor, MainThreadExecutor, MainThreadPump, PublishExecutor, PublishJob};
pub use phase::{PhaseGuard, PhaseTracker, ReloadPhase};
pub use report::{ParseFailure, ReloadMode, ReloadReport};
pub use stage::{ImmediateStage, ReloadStage, StageBarrier};
pub use sync_driver::SyncReloader;
