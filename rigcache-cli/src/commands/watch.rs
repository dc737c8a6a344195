//! Watch command - reload whenever the packs change.
//!
//! The packs folder is re-listed every interval and the overlay fingerprint
//! compared with the last one loaded. Any change (a pack added, removed,
//! reordered or edited) triggers a full reload. Ctrl+C cancels the loop.

use std::path::PathBuf;
use std::time::Duration;

use rigcache::overlay::{fingerprint, OverlayProvider};
use rigcache::{AssetCache, ConfigFile};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::common::resolve_provider;
use super::scan::print_report;
use crate::error::CliError;

/// Run the watch command.
pub fn run(config: &ConfigFile, packs: Option<PathBuf>, interval: u64) -> Result<(), CliError> {
    let provider = resolve_provider(packs, config)?;
    let cache = AssetCache::new(config.cache.clone());
    let interval = Duration::from_secs(interval.max(1));

    println!("Watching: {}", provider.packs_dir().display());
    println!("Press Ctrl+C to stop");
    println!();

    let shutdown = CancellationToken::new();
    let shutdown_handler = shutdown.clone();
    ctrlc::set_handler(move || {
        println!();
        println!("Received shutdown signal, stopping...");
        shutdown_handler.cancel();
    })
    .map_err(|e| CliError::Config(format!("Failed to set signal handler: {}", e)))?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()?;

    runtime.block_on(watch_loop(&cache, &provider, interval, shutdown));

    let metrics = cache.metrics();
    println!();
    println!("Session Summary");
    println!("───────────────");
    println!("{}", metrics);
    Ok(())
}

async fn watch_loop(
    cache: &AssetCache,
    provider: &dyn OverlayProvider,
    interval: Duration,
    shutdown: CancellationToken,
) {
    let mut last_loaded: Option<u64> = None;

    loop {
        let overlays = provider.overlays();
        let current = fingerprint(&overlays);

        if last_loaded != Some(current) {
            if last_loaded.is_some() {
                info!(overlays = overlays.len(), "Packs changed, reloading");
            }

            match cache.reload(&overlays) {
                Ok(report) => {
                    print_report(&report);
                    println!();
                    last_loaded = Some(current);
                }
                Err(e) => warn!(error = %e, "Reload failed"),
            }
        }

        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = tokio::time::sleep(interval) => {}
        }
    }
}
