//! Synchronous reload: everything runs before the call returns.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use rayon::prelude::*;
use tracing::{debug, info, warn};

use super::phase::ReloadPhase;
use super::report::{ParseFailure, ReloadMode, ReloadReport};
use crate::cache::AssetCache;
use crate::document::DocumentParser;
use crate::error::{ParseError, ReloadError};
use crate::identifier::AssetId;
use crate::overlay::{suffix_filter, AssetEntry, AssetSource, Overlay};

/// Runs a full reload on the calling thread.
///
/// Overlays are processed in order. For each one, the animation and model
/// folders are enumerated (a folder that cannot be read is skipped on its
/// own) and every entry is parsed, serially or on the rayon
/// pool depending on [`crate::CacheConfig::parallel_parse`]. Results are
/// applied to the staging maps in enumeration order either way:
///
/// - a successful parse replaces whatever an earlier overlay staged for the
///   same identifier;
/// - a failed parse removes it, so the identifier is absent unless a later
///   overlay supplies a good copy.
///
/// When every overlay is done, both staging maps are published together.
pub struct SyncReloader<'a> {
    cache: &'a AssetCache,
}

impl<'a> SyncReloader<'a> {
    /// Create a reloader for `cache`.
    pub fn new(cache: &'a AssetCache) -> Self {
        Self { cache }
    }

    /// Reload from `overlays`, lowest priority first.
    pub fn run(&self, overlays: &[Arc<dyn Overlay>]) -> Result<ReloadReport, ReloadError> {
        let guard = self.cache.phase_tracker().begin()?;
        let metrics = self.cache.reload_metrics();
        metrics.reload_started();

        let started = Instant::now();
        let config = self.cache.config();
        let filter = suffix_filter(config.file_suffix.as_str());

        let mut animations = HashMap::new();
        let mut models = HashMap::new();
        let mut failures = Vec::new();
        let mut skipped = Vec::new();

        info!(
            overlays = overlays.len(),
            parallel = config.parallel_parse,
            "Starting synchronous reload"
        );

        for overlay in overlays {
            guard.advance(ReloadPhase::Discovering);

            let animation_entries = self.enumerate(overlay, &config.animations_folder, &filter);
            let model_entries = self.enumerate(overlay, &config.models_folder, &filter);

            if animation_entries.is_none() || model_entries.is_none() {
                metrics.container_skipped();
                skipped.push(overlay.name().to_string());
            }

            debug!(
                overlay = %overlay.name(),
                animations = animation_entries.as_ref().map_or(0, Vec::len),
                models = model_entries.as_ref().map_or(0, Vec::len),
                "Overlay enumerated"
            );

            guard.advance(ReloadPhase::Parsing);
            if let Some(entries) = animation_entries {
                self.apply(
                    overlay,
                    self.cache.animation_parser(),
                    entries,
                    &mut animations,
                    &mut failures,
                );
            }
            if let Some(entries) = model_entries {
                self.apply(
                    overlay,
                    self.cache.model_parser(),
                    entries,
                    &mut models,
                    &mut failures,
                );
            }
        }

        // Every parse above has returned; nothing is outstanding.
        guard.advance(ReloadPhase::AwaitingCompletion);

        guard.advance(ReloadPhase::Publishing);
        let (animation_count, model_count) = (animations.len(), models.len());
        let generation = self.cache.publish(animations, models);

        let elapsed = started.elapsed();
        metrics.reload_completed(elapsed);

        Ok(ReloadReport {
            mode: ReloadMode::Synchronous,
            generation,
            animations: animation_count,
            models: model_count,
            failures,
            skipped,
            elapsed,
        })
    }

    /// List one subfolder of `overlay`, or `None` if it cannot be read.
    fn enumerate(
        &self,
        overlay: &Arc<dyn Overlay>,
        subfolder: &str,
        filter: &(dyn Fn(&str) -> bool + Sync),
    ) -> Option<Vec<AssetEntry>> {
        match overlay.enumerate(subfolder, filter) {
            Ok(entries) => Some(entries),
            Err(e) => {
                warn!(
                    overlay = %overlay.name(),
                    subfolder,
                    error = %e,
                    "Skipping unreadable overlay"
                );
                None
            }
        }
    }

    /// Parse `entries` and fold the results into `staging` in order.
    fn apply<P: DocumentParser>(
        &self,
        overlay: &Arc<dyn Overlay>,
        parser: &P,
        entries: Vec<AssetEntry>,
        staging: &mut HashMap<AssetId, Arc<P::Document>>,
        failures: &mut Vec<ParseFailure>,
    ) {
        let metrics = self.cache.reload_metrics();

        for (id, result) in self.parse_all(overlay, parser, entries) {
            match result {
                Ok(document) => {
                    metrics.files_parsed(1);
                    staging.insert(id, Arc::new(document));
                }
                Err(e) => {
                    warn!(
                        id = %id,
                        kind = %parser.kind(),
                        overlay = %overlay.name(),
                        error = %e,
                        "Failed to load asset"
                    );
                    metrics.parse_failed();
                    staging.remove(&id);
                    failures.push(ParseFailure::new(parser.kind(), overlay.name(), &e));
                }
            }
        }
    }

    fn parse_all<P: DocumentParser>(
        &self,
        overlay: &Arc<dyn Overlay>,
        parser: &P,
        entries: Vec<AssetEntry>,
    ) -> Vec<(AssetId, Result<P::Document, ParseError>)> {
        let load = |entry: AssetEntry| {
            let source = AssetSource::new(Arc::clone(overlay), entry);
            let result = parser.load(&source);
            (source.entry.id, result)
        };

        if self.cache.config().parallel_parse {
            entries.into_par_iter().map(load).collect()
        } else {
            entries.into_iter().map(load).collect()
        }
    }
}
