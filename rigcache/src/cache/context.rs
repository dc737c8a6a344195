//! One-time initialization gate for a shared cache.
//!
//! Hosts construct the cache once during startup through
//! [`CacheContext::initialize`] and hand out the context (or the returned
//! `Arc<AssetCache>`) to everything that reads assets. Reading through the
//! context before initialization is an error rather than a silent construct.

use std::sync::Arc;

use once_cell::sync::OnceCell;
use tracing::info;

use super::snapshot::{AnimationMap, ModelMap};
use super::store::AssetCache;
use crate::config::CacheConfig;
use crate::error::CacheError;

/// Holder of at most one [`AssetCache`].
#[derive(Debug, Default)]
pub struct CacheContext {
    cell: OnceCell<Arc<AssetCache>>,
}

impl CacheContext {
    /// Create an uninitialized context.
    pub const fn new() -> Self {
        Self {
            cell: OnceCell::new(),
        }
    }

    /// Construct the cache if it does not exist yet and return it.
    ///
    /// Concurrent callers race safely: exactly one constructs, all receive
    /// the same instance. `config` is ignored once the cache exists.
    pub fn initialize(&self, config: CacheConfig) -> Arc<AssetCache> {
        let cache = self.cell.get_or_init(|| {
            info!("Initializing asset cache");
            Arc::new(AssetCache::new(config))
        });
        Arc::clone(cache)
    }

    /// Install an already constructed cache.
    ///
    /// Returns the cache back if the context was already initialized.
    pub fn install(&self, cache: Arc<AssetCache>) -> Result<(), Arc<AssetCache>> {
        self.cell.set(cache)
    }

    /// Check if the cache has been constructed.
    pub fn is_ready(&self) -> bool {
        self.cell.get().is_some()
    }

    /// The cache, if initialized.
    pub fn get(&self) -> Result<Arc<AssetCache>, CacheError> {
        self.cell.get().cloned().ok_or(CacheError::Uninitialized)
    }

    /// The current animation map.
    pub fn animations(&self) -> Result<Arc<AnimationMap>, CacheError> {
        self.cell
            .get()
            .map(|cache| cache.animations())
            .ok_or(CacheError::Uninitialized)
    }

    /// The current geometry map.
    pub fn models(&self) -> Result<Arc<ModelMap>, CacheError> {
        self.cell
            .get()
            .map(|cache| cache.models())
            .ok_or(CacheError::Uninitialized)
    }
}

static GLOBAL: CacheContext = CacheContext::new();

/// The process-wide context, for hosts that want a single shared cache.
pub fn global() -> &'static CacheContext {
    &GLOBAL
}
