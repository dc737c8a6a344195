//! Host-level resolution across an ordered overlay list.
//!
//! [`OverlayStack`] merges the enumerations of every overlay into one map
//! keyed by identifier, similar to an overlay filesystem. When several
//! overlays supply the same identifier, the last-listed overlay wins.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, warn};

use super::{AssetSource, Overlay};
use crate::identifier::AssetId;

/// Result of resolving one subfolder across the stack.
#[derive(Debug, Default)]
pub struct Resolution {
    /// Winning source for every identifier.
    pub sources: BTreeMap<AssetId, AssetSource>,

    /// Overlays that could not be enumerated, by position in the stack.
    pub skipped: BTreeMap<usize, String>,
}

impl Resolution {
    /// Number of resolved identifiers.
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    /// Check if nothing was resolved.
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

/// An ordered list of overlays, lowest priority first.
#[derive(Debug, Clone, Default)]
pub struct OverlayStack {
    overlays: Vec<Arc<dyn Overlay>>,
}

impl OverlayStack {
    /// Create a stack from overlays ordered lowest priority first.
    pub fn new(overlays: Vec<Arc<dyn Overlay>>) -> Self {
        Self { overlays }
    }

    /// Overlays in priority order.
    pub fn overlays(&self) -> &[Arc<dyn Overlay>] {
        &self.overlays
    }

    /// Number of overlays in the stack.
    pub fn len(&self) -> usize {
        self.overlays.len()
    }

    /// Check if the stack is empty.
    pub fn is_empty(&self) -> bool {
        self.overlays.is_empty()
    }

    /// Resolve every identifier under `subfolder` that passes `filter`.
    ///
    /// Overlays are enumerated in order and inserted into one map, so later
    /// overlays replace the sources of earlier ones. An overlay that fails to
    /// enumerate is logged, recorded in [`Resolution::skipped`], and ignored.
    pub fn resolve(&self, subfolder: &str, filter: &(dyn Fn(&str) -> bool + Sync)) -> Resolution {
        let mut resolution = Resolution::default();

        for (position, overlay) in self.overlays.iter().enumerate() {
            let entries = match overlay.enumerate(subfolder, filter) {
                Ok(entries) => entries,
                Err(e) => {
                    warn!(
                        overlay = %overlay.name(),
                        subfolder,
                        error = %e,
                        "Skipping unreadable overlay"
                    );
                    resolution
                        .skipped
                        .insert(position, overlay.name().to_string());
                    continue;
                }
            };

            for entry in entries {
                let source = AssetSource::new(Arc::clone(overlay), entry);
                if let Some(previous) = resolution.sources.insert(source.id().clone(), source) {
                    debug!(
                        id = %previous.id(),
                        shadowed = %previous.overlay.name(),
                        "Identifier overridden by later overlay"
                    );
                }
            }
        }

        debug!(
            subfolder,
            overlays = self.overlays.len(),
            resolved = resolution.sources.len(),
            skipped = resolution.skipped.len(),
            "Overlay stack resolved"
        );

        resolution
    }
}
