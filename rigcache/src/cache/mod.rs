//! The published asset state and its owner.
//!
//! # Architecture
//!
//! ```text
//!                  ┌────────────────────────────────────────┐
//!   reload ──────► │ AssetCache                             │
//!   (sync/async)   │   ArcSwap<AssetSnapshot> ──┐           │
//!                  │   AnimationParser          │ publish() │
//!                  │   ModelParser              │ one store │
//!                  │   VariableRegistry         ▼           │
//!                  └──────────────┬─────────────────────────┘
//!                                 │ load_full()
//!                                 ▼
//!                  readers: Arc<AnimationMap>, Arc<ModelMap>
//! ```
//!
//! [`CacheContext`] gates access until the host has constructed the cache.

mod context;
mod snapshot;
mod store;

pub use context::{global, CacheContext};
pub use snapshot::{AnimationMap, AssetSnapshot, ModelMap};
pub use store::AssetCache;
