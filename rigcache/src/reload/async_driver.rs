//! Concurrent reload: scatter parse units, gather, publish on a designated
//! executor.
//!
//! ```text
//!            background runtime                          publish executor
//!  ┌──────────────────────────────────────────┐     ┌──────────────────────┐
//!  │ spawn_blocking: OverlayStack::resolve ×2 │     │                      │
//!  │        │                                 │     │                      │
//!  │        ▼  one unit per identifier        │     │                      │
//!  │ JoinSet ── unit ─► DashMap<AssetId, _>   │     │                      │
//!  │         ── unit ─► DashMap<AssetId, _>   │     │                      │
//!  │  (bounded by Semaphore)                  │     │                      │
//!  └────────┬─────────────────────────────────┘     │                      │
//!           │ join_next() until empty              │                      │
//!           └──────────────────────────────────────►│ publish(both maps)   │
//!                                                   └──────────┬───────────┘
//!                                                              ▼
//!                                         ReloadStage::mark_complete_awaiting_others
//! ```
//!
//! Identifier collisions are resolved during discovery (last overlay wins), so
//! every parse unit owns a distinct key and the staging maps need no ordering.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Instant;

use dashmap::DashMap;
use tokio::runtime::Handle;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use super::executor::PublishExecutor;
use super::phase::{PhaseGuard, ReloadPhase};
use super::report::{ParseFailure, ReloadMode, ReloadReport};
use super::stage::ReloadStage;
use crate::cache::{AnimationMap, AssetCache, ModelMap};
use crate::document::DocumentParser;
use crate::error::ReloadError;
use crate::identifier::AssetId;
use crate::overlay::{suffix_filter, AssetSource, Overlay, OverlayStack};

type Staging<D> = Arc<DashMap<AssetId, Arc<D>>>;

/// Runs reloads with parse work fanned out on a background runtime.
///
/// Unlike [`super::SyncReloader`], nothing but the final publish touches the
/// caller's context, and the publish itself runs wherever the configured
/// [`PublishExecutor`] puts it.
pub struct AsyncReloader {
    cache: Arc<AssetCache>,
    background: Handle,
    publisher: Arc<dyn PublishExecutor>,
}

impl AsyncReloader {
    /// Create a reloader.
    ///
    /// * `background` - runtime that runs discovery and parse units
    /// * `publisher` - context that runs the snapshot swap
    pub fn new(cache: Arc<AssetCache>, background: Handle, publisher: Arc<dyn PublishExecutor>) -> Self {
        Self {
            cache,
            background,
            publisher,
        }
    }

    /// The cache this reloader publishes to.
    pub fn cache(&self) -> &Arc<AssetCache> {
        &self.cache
    }

    /// Reload from `overlays` (lowest priority first), then complete `stage`.
    ///
    /// Per-overlay and per-file failures are logged and reported. Any failure
    /// of the task machinery, the publish executor or the stage is returned
    /// as [`ReloadError::Orchestration`]; if it happens before publishing,
    /// the previous snapshot stays in place.
    pub async fn reload(
        &self,
        overlays: Vec<Arc<dyn Overlay>>,
        stage: &dyn ReloadStage,
    ) -> Result<ReloadReport, ReloadError> {
        let guard = self.cache.phase_tracker().begin()?;
        let metrics = self.cache.reload_metrics();
        metrics.reload_started();

        let result = self.run(&guard, overlays, stage).await;
        if let Err(e) = &result {
            warn!(error = %e, "Concurrent reload failed");
            metrics.reload_failed();
        }
        result
    }

    async fn run(
        &self,
        guard: &PhaseGuard<'_>,
        overlays: Vec<Arc<dyn Overlay>>,
        stage: &dyn ReloadStage,
    ) -> Result<ReloadReport, ReloadError> {
        let started = Instant::now();
        let metrics = self.cache.reload_metrics();

        info!(overlays = overlays.len(), "Starting concurrent reload");

        // Discovery: one resolution per asset kind, across every overlay.
        let config = self.cache.config().clone();
        let stack = OverlayStack::new(overlays);
        let (animation_sources, model_sources, skipped) = self
            .background
            .spawn_blocking(move || {
                let filter = suffix_filter(config.file_suffix.as_str());
                let animations = stack.resolve(&config.animations_folder, &filter);
                let models = stack.resolve(&config.models_folder, &filter);

                // An overlay unreadable for both kinds is skipped once.
                let mut skipped = animations.skipped;
                skipped.extend(models.skipped);
                let skipped: Vec<String> = skipped.into_values().collect();
                (animations.sources, models.sources, skipped)
            })
            .await
            .map_err(|e| ReloadError::Orchestration(format!("discovery task failed: {}", e)))?;

        for _ in &skipped {
            metrics.container_skipped();
        }

        debug!(
            animations = animation_sources.len(),
            models = model_sources.len(),
            "Discovery complete"
        );

        // Parsing: one unit per identifier.
        guard.advance(ReloadPhase::Parsing);
        let permits = Arc::new(Semaphore::new(self.cache.config().max_concurrent_parses.max(1)));
        let mut tasks: JoinSet<Option<ParseFailure>> = JoinSet::new();

        let staged_animations: Staging<_> = Arc::new(DashMap::new());
        let staged_models: Staging<_> = Arc::new(DashMap::new());

        self.spawn_units(
            &mut tasks,
            &permits,
            self.cache.animation_parser().clone(),
            animation_sources,
            &staged_animations,
        )
        .await?;
        self.spawn_units(
            &mut tasks,
            &permits,
            self.cache.model_parser().clone(),
            model_sources,
            &staged_models,
        )
        .await?;

        // Completion barrier: every unit has finished once the set is empty.
        guard.advance(ReloadPhase::AwaitingCompletion);
        let mut failures = Vec::new();
        let mut join_error = None;
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(None) => {}
                Ok(Some(failure)) => failures.push(failure),
                Err(e) => {
                    join_error.get_or_insert(e);
                }
            }
        }
        if let Some(e) = join_error {
            return Err(ReloadError::Orchestration(format!("parse unit failed: {}", e)));
        }

        // Publishing, on the designated executor.
        guard.advance(ReloadPhase::Publishing);
        let animations: AnimationMap = drain(staged_animations);
        let models: ModelMap = drain(staged_models);
        let (animation_count, model_count) = (animations.len(), models.len());

        let cache = Arc::clone(&self.cache);
        let generation = self
            .publisher
            .execute(Box::new(move || cache.publish(animations, models)))
            .await?;

        let elapsed = started.elapsed();

        // The new snapshot stays published even if the handshake fails.
        stage.mark_complete_awaiting_others().await?;
        metrics.reload_completed(elapsed);

        Ok(ReloadReport {
            mode: ReloadMode::Concurrent,
            generation,
            animations: animation_count,
            models: model_count,
            failures,
            skipped,
            elapsed,
        })
    }

    /// Dispatch one blocking parse unit per source.
    async fn spawn_units<P>(
        &self,
        tasks: &mut JoinSet<Option<ParseFailure>>,
        permits: &Arc<Semaphore>,
        parser: P,
        sources: BTreeMap<AssetId, AssetSource>,
        staging: &Staging<P::Document>,
    ) -> Result<(), ReloadError>
    where
        P: DocumentParser + Clone + 'static,
    {
        for source in sources.into_values() {
            let permit = Arc::clone(permits)
                .acquire_owned()
                .await
                .map_err(|e| ReloadError::Orchestration(format!("parse limiter closed: {}", e)))?;

            let parser = parser.clone();
            let staging = Arc::clone(staging);
            let metrics_cache = Arc::clone(&self.cache);

            tasks.spawn_blocking_on(
                move || {
                    let _permit = permit;
                    let metrics = metrics_cache.reload_metrics();

                    match parser.load(&source) {
                        Ok(document) => {
                            metrics.files_parsed(1);
                            staging.insert(source.id().clone(), Arc::new(document));
                            None
                        }
                        Err(e) => {
                            warn!(
                                id = %source.id(),
                                kind = %parser.kind(),
                                overlay = %source.overlay.name(),
                                error = %e,
                                "Failed to load asset"
                            );
                            metrics.parse_failed();
                            Some(ParseFailure::new(parser.kind(), source.overlay.name(), &e))
                        }
                    }
                },
                &self.background,
            );
        }

        Ok(())
    }
}

/// Move a staging map into a plain map.
fn drain<D>(staging: Staging<D>) -> HashMap<AssetId, Arc<D>> {
    match Arc::try_unwrap(staging) {
        Ok(map) => map.into_iter().collect(),
        Err(shared) => shared
            .iter()
            .map(|entry| (entry.key().clone(), Arc::clone(entry.value())))
            .collect(),
    }
}
