//! Common types and utilities shared across CLI commands.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::ValueEnum;
use rigcache::overlay::{Overlay, OverlayProvider, PackDirectoryProvider};
use rigcache::{AssetCache, ConfigFile};

use crate::error::CliError;

/// Asset kind selection for CLI arguments.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum AssetKindArg {
    /// Animation documents
    Animations,
    /// Geometry documents
    Models,
}

/// Load the config from `path`, or from the default location.
///
/// An explicit path must exist; a missing default file means defaults.
pub fn load_config(path: Option<&Path>) -> Result<ConfigFile, CliError> {
    match path {
        Some(path) => Ok(ConfigFile::load_from(path)?),
        None => {
            let default_path = rigcache::config::config_file_path();
            if default_path.exists() {
                Ok(ConfigFile::load_from(&default_path)?)
            } else {
                Ok(ConfigFile::default())
            }
        }
    }
}

/// Resolve the packs provider: CLI folder first, then config.
pub fn resolve_provider(
    cli_packs: Option<PathBuf>,
    config: &ConfigFile,
) -> Result<PackDirectoryProvider, CliError> {
    let provider = match cli_packs {
        Some(dir) if config.overlays.order.is_empty() => PackDirectoryProvider::new(dir),
        Some(dir) => PackDirectoryProvider::new(dir).with_order(config.overlays.order.clone()),
        None => config.overlay_provider().ok_or_else(|| {
            CliError::Config(
                "No packs folder given. Use --packs or set overlays.packs_dir in config.ini"
                    .to_string(),
            )
        })?,
    };

    if !provider.exists() {
        return Err(CliError::Config(format!(
            "Packs folder does not exist: {}",
            provider.packs_dir().display()
        )));
    }

    Ok(provider)
}

/// Build a cache from the config and list the overlays to load.
pub fn prepare(
    cli_packs: Option<PathBuf>,
    config: &ConfigFile,
) -> Result<(Arc<AssetCache>, Vec<Arc<dyn Overlay>>), CliError> {
    let provider = resolve_provider(cli_packs, config)?;
    let overlays = provider.overlays();

    println!("Packs folder: {}", provider.packs_dir().display());
    for overlay in &overlays {
        println!("  {} ({})", overlay.name(), overlay.kind());
    }
    println!();

    Ok((Arc::new(AssetCache::new(config.cache.clone())), overlays))
}
