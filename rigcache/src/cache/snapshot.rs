//! The published, immutable state of the cache.

use std::collections::HashMap;
use std::sync::Arc;

use crate::document::{AnimationSet, GeoModel};
use crate::identifier::AssetId;

/// Identifier to parsed animation file.
pub type AnimationMap = HashMap<AssetId, Arc<AnimationSet>>;

/// Identifier to parsed geometry file.
pub type ModelMap = HashMap<AssetId, Arc<GeoModel>>;

/// Both asset maps as published by one reload.
///
/// Snapshots are never mutated after construction. A reload builds a new one
/// and swaps it in; readers holding an older snapshot keep a consistent view
/// until they drop it.
#[derive(Debug, Clone, Default)]
pub struct AssetSnapshot {
    animations: Arc<AnimationMap>,
    models: Arc<ModelMap>,
    generation: u64,
}

impl AssetSnapshot {
    /// Create a snapshot from two finished maps.
    pub fn new(animations: AnimationMap, models: ModelMap, generation: u64) -> Self {
        Self {
            animations: Arc::new(animations),
            models: Arc::new(models),
            generation,
        }
    }

    /// The empty snapshot a new cache starts with (generation 0).
    pub fn empty() -> Self {
        Self::default()
    }

    /// The animation map.
    pub fn animations(&self) -> &Arc<AnimationMap> {
        &self.animations
    }

    /// The geometry map.
    pub fn models(&self) -> &Arc<ModelMap> {
        &self.models
    }

    /// Number of publishes before this one; 0 for the initial empty state.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Look up one animation file.
    pub fn animation(&self, id: &AssetId) -> Option<Arc<AnimationSet>> {
        self.animations.get(id).cloned()
    }

    /// Look up one geometry file.
    pub fn model(&self, id: &AssetId) -> Option<Arc<GeoModel>> {
        self.models.get(id).cloned()
    }

    /// Check if both maps are empty.
    pub fn is_empty(&self) -> bool {
        self.animations.is_empty() && self.models.is_empty()
    }
}
