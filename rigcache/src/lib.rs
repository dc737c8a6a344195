//! rigcache - hot-reloadable animation and geometry asset cache
//!
//! This library discovers animation and geometry documents across an ordered
//! stack of resource packs (plain directories and zip archives), parses them,
//! and publishes the result as an immutable snapshot that readers can load
//! without locking. A reload replaces the whole snapshot in one step.
//!
//! # Example
//!
//! ```ignore
//! use rigcache::{CacheConfig, global};
//! use rigcache::overlay::PackDirectoryProvider;
//!
//! let cache = global().initialize(CacheConfig::default());
//! let provider = PackDirectoryProvider::new("resourcepacks");
//! let report = cache.reload_from(&provider)?;
//! println!("{}", report);
//!
//! let animations = global().animations()?;
//! ```

pub mod cache;
pub mod config;
pub mod document;
pub mod error;
pub mod identifier;
pub mod logging;
pub mod overlay;
pub mod reload;
pub mod telemetry;

#[cfg(test)]
mod testing;

pub use cache::{global, AnimationMap, AssetCache, AssetSnapshot, CacheContext, ModelMap};
pub use config::{CacheConfig, ConfigFile};
pub use error::{CacheError, ConfigError, OverlayError, ParseError, ReloadError};
pub use identifier::AssetId;

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
