//! List command - reload once and print cached identifiers.

use std::path::PathBuf;

use rigcache::{AssetId, ConfigFile};

use super::common::{prepare, AssetKindArg};
use crate::error::CliError;

/// Run the list command.
pub fn run(config: &ConfigFile, packs: Option<PathBuf>, kind: AssetKindArg) -> Result<(), CliError> {
    let (cache, overlays) = prepare(packs, config)?;
    cache.reload(&overlays)?;

    let snapshot = cache.snapshot();
    let mut lines: Vec<(AssetId, String)> = match kind {
        AssetKindArg::Animations => snapshot
            .animations()
            .iter()
            .map(|(id, set)| {
                let names: Vec<&str> = set.names().collect();
                (id.clone(), names.join(", "))
            })
            .collect(),
        AssetKindArg::Models => snapshot
            .models()
            .iter()
            .map(|(id, model)| {
                let detail = format!(
                    "{} ({} bones, {} cubes)",
                    model.identifier,
                    model.bones.len(),
                    model.cube_count()
                );
                (id.clone(), detail)
            })
            .collect(),
    };
    lines.sort();

    if lines.is_empty() {
        println!("(none)");
    }
    for (id, detail) in &lines {
        println!("{}  {}", id, detail);
    }

    Ok(())
}
