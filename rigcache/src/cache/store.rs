//! The asset cache.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use arc_swap::ArcSwap;
use tracing::{debug, info};

use super::snapshot::{AnimationMap, AssetSnapshot, ModelMap};
use crate::config::CacheConfig;
use crate::document::{AnimationParser, AnimationSet, GeoModel, ModelParser, VariableRegistry};
use crate::error::ReloadError;
use crate::identifier::AssetId;
use crate::overlay::{Overlay, OverlayProvider};
use crate::reload::{PhaseTracker, ReloadPhase, ReloadReport, SyncReloader};
use crate::telemetry::{MetricsSnapshot, ReloadMetrics};

/// Parsed animation and geometry documents, replaced wholesale by reloads.
///
/// Reads are lock-free: each accessor loads the currently published
/// [`AssetSnapshot`]. A reload builds both maps off to the side and publishes
/// them in a single store, so a reader sees either the old pair or the new
/// pair, never one of each.
///
/// # Example
///
/// ```ignore
/// use rigcache::{AssetCache, CacheConfig};
/// use rigcache::overlay::PackDirectoryProvider;
///
/// let cache = AssetCache::new(CacheConfig::default());
/// let report = cache.reload_from(&PackDirectoryProvider::new("resourcepacks"))?;
///
/// for (id, set) in cache.animations().iter() {
///     println!("{} -> {} animations", id, set.len());
/// }
/// ```
#[derive(Debug)]
pub struct AssetCache {
    published: ArcSwap<AssetSnapshot>,
    generation: AtomicU64,
    animation_parser: AnimationParser,
    model_parser: ModelParser,
    variables: Arc<VariableRegistry>,
    config: CacheConfig,
    phase: PhaseTracker,
    metrics: ReloadMetrics,
}

impl AssetCache {
    /// Create an empty cache.
    ///
    /// The expression registry is seeded with the standard query variables
    /// here, once, and shared by every later reload.
    pub fn new(config: CacheConfig) -> Self {
        let variables = Arc::new(VariableRegistry::with_standard_queries());

        debug!(
            animations_folder = %config.animations_folder,
            models_folder = %config.models_folder,
            suffix = %config.file_suffix,
            variables = variables.len(),
            "Asset cache created"
        );

        Self {
            published: ArcSwap::from_pointee(AssetSnapshot::empty()),
            generation: AtomicU64::new(0),
            animation_parser: AnimationParser::new(Arc::clone(&variables)),
            model_parser: ModelParser::new(),
            variables,
            config,
            phase: PhaseTracker::new(),
            metrics: ReloadMetrics::new(),
        }
    }

    /// The current snapshot.
    pub fn snapshot(&self) -> Arc<AssetSnapshot> {
        self.published.load_full()
    }

    /// The current animation map.
    pub fn animations(&self) -> Arc<AnimationMap> {
        Arc::clone(self.published.load().animations())
    }

    /// The current geometry map.
    pub fn models(&self) -> Arc<ModelMap> {
        Arc::clone(self.published.load().models())
    }

    /// Look up one animation file in the current snapshot.
    pub fn animation(&self, id: &AssetId) -> Option<Arc<AnimationSet>> {
        self.published.load().animation(id)
    }

    /// Look up one geometry file in the current snapshot.
    pub fn model(&self, id: &AssetId) -> Option<Arc<GeoModel>> {
        self.published.load().model(id)
    }

    /// Generation of the current snapshot.
    pub fn generation(&self) -> u64 {
        self.published.load().generation()
    }

    /// Replace both maps in one step. Returns the new generation.
    ///
    /// This is the only way the published state changes.
    pub(crate) fn publish(&self, animations: AnimationMap, models: ModelMap) -> u64 {
        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        let (animation_count, model_count) = (animations.len(), models.len());

        self.published
            .store(Arc::new(AssetSnapshot::new(animations, models, generation)));

        info!(
            generation,
            animations = animation_count,
            models = model_count,
            "Published asset snapshot"
        );
        generation
    }

    /// Reload from `overlays` (lowest priority first) on the calling thread.
    ///
    /// Per-overlay and per-file failures are logged and reported; only a
    /// reload already in progress makes this fail.
    pub fn reload(&self, overlays: &[Arc<dyn Overlay>]) -> Result<ReloadReport, ReloadError> {
        SyncReloader::new(self).run(overlays)
    }

    /// Reload from the overlays `provider` currently lists.
    pub fn reload_from(&self, provider: &dyn OverlayProvider) -> Result<ReloadReport, ReloadError> {
        let overlays = provider.overlays();
        self.reload(&overlays)
    }

    /// Phase of the reload currently running, or `Idle`.
    pub fn phase(&self) -> ReloadPhase {
        self.phase.current()
    }

    /// Reload counters.
    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Configuration the cache was created with.
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// The shared expression-variable registry.
    pub fn variables(&self) -> &Arc<VariableRegistry> {
        &self.variables
    }

    pub(crate) fn animation_parser(&self) -> &AnimationParser {
        &self.animation_parser
    }

    pub(crate) fn model_parser(&self) -> &ModelParser {
        &self.model_parser
    }

    pub(crate) fn phase_tracker(&self) -> &PhaseTracker {
        &self.phase
    }

    pub(crate) fn reload_metrics(&self) -> &ReloadMetrics {
        &self.metrics
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{DocumentParser, STANDARD_QUERIES};
    use crate::testing::model_json;

    #[test]
    fn test_new_cache_is_empty() {
        let cache = AssetCache::new(CacheConfig::default());

        assert!(cache.animations().is_empty());
        assert!(cache.models().is_empty());
        assert_eq!(cache.generation(), 0);
        assert_eq!(cache.phase(), ReloadPhase::Idle);
    }

    #[test]
    fn test_registry_seeded_once() {
        let cache = AssetCache::new(CacheConfig::default());
        assert_eq!(cache.variables().len(), STANDARD_QUERIES.len());
    }

    #[test]
    fn test_publish_replaces_both_maps() {
        let cache = AssetCache::new(CacheConfig::default());
        let id = AssetId::new("x", "geo/a.json");
        let model = cache
            .model_parser()
            .parse(&id, model_json("geometry.a").as_bytes())
            .unwrap();

        let before = cache.snapshot();
        let mut models = ModelMap::new();
        models.insert(id.clone(), Arc::new(model));

        assert_eq!(cache.publish(AnimationMap::new(), models), 1);
        assert_eq!(cache.generation(), 1);
        assert!(cache.model(&id).is_some());

        // Earlier snapshot is untouched
        assert!(before.models().is_empty());
        assert_eq!(before.generation(), 0);
    }

    #[test]
    fn test_generations_increase() {
        let cache = AssetCache::new(CacheConfig::default());
        assert_eq!(cache.publish(AnimationMap::new(), ModelMap::new()), 1);
        assert_eq!(cache.publish(AnimationMap::new(), ModelMap::new()), 2);
        assert_eq!(cache.snapshot().generation(), 2);
    }
}
