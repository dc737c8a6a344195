//! Directory-backed overlays.
//!
//! Enumeration walks `assets/<namespace>/<subfolder>` depth-first. Identifiers
//! keep the subfolder: `assets/x/animations/sub/b.json` becomes
//! `x:animations/sub/b.json`.

use std::collections::BTreeSet;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use tracing::{debug, warn};
use walkdir::WalkDir;

use super::{AssetEntry, Overlay, OverlayKind, ASSETS_ROOT};
use crate::error::OverlayError;
use crate::identifier::AssetId;

/// A resource pack stored as a plain directory.
#[derive(Debug, Clone)]
pub struct DirectoryOverlay {
    name: String,
    root: PathBuf,
}

impl DirectoryOverlay {
    /// Create an overlay for `root`, named after its final path component.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let name = root
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| root.display().to_string());
        Self { name, root }
    }

    /// Create an overlay with an explicit display name.
    pub fn with_name(name: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            root: root.into(),
        }
    }

    /// Root directory of the pack.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn unreadable(&self, source: io::Error) -> OverlayError {
        OverlayError::Unreadable {
            container: self.name.clone(),
            source,
        }
    }
}

impl Overlay for DirectoryOverlay {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> OverlayKind {
        OverlayKind::Directory
    }

    fn namespaces(&self) -> Result<BTreeSet<String>, OverlayError> {
        if !self.root.is_dir() {
            return Err(self.unreadable(io::Error::new(
                io::ErrorKind::NotFound,
                format!("{} is not a directory", self.root.display()),
            )));
        }

        let assets = self.root.join(ASSETS_ROOT);
        if !assets.is_dir() {
            return Ok(BTreeSet::new());
        }

        let mut namespaces = BTreeSet::new();
        for entry in std::fs::read_dir(&assets).map_err(|e| self.unreadable(e))? {
            let entry = entry.map_err(|e| self.unreadable(e))?;
            if entry.path().is_dir() {
                namespaces.insert(entry.file_name().to_string_lossy().into_owned());
            }
        }

        Ok(namespaces)
    }

    fn enumerate(
        &self,
        subfolder: &str,
        filter: &(dyn Fn(&str) -> bool + Sync),
    ) -> Result<Vec<AssetEntry>, OverlayError> {
        let subfolder = subfolder.trim_matches('/');
        let mut entries = Vec::new();

        for namespace in self.namespaces()? {
            let base = self.root.join(ASSETS_ROOT).join(&namespace).join(subfolder);
            if !base.is_dir() {
                continue;
            }

            for item in WalkDir::new(&base).follow_links(true).sort_by_file_name() {
                let item = match item {
                    Ok(item) => item,
                    Err(e) => {
                        warn!(
                            overlay = %self.name,
                            error = %e,
                            "Skipping unreadable path during directory walk"
                        );
                        continue;
                    }
                };

                if !item.file_type().is_file() {
                    continue;
                }

                if !filter(&item.file_name().to_string_lossy()) {
                    continue;
                }

                let Ok(relative) = item.path().strip_prefix(&base) else {
                    continue;
                };
                let relative = slash_path(relative);

                entries.push(AssetEntry::new(
                    AssetId::new(namespace.as_str(), format!("{}/{}", subfolder, relative)),
                    format!("{}/{}/{}/{}", ASSETS_ROOT, namespace, subfolder, relative),
                ));
            }
        }

        debug!(
            overlay = %self.name,
            subfolder,
            count = entries.len(),
            "Directory overlay enumerated"
        );

        Ok(entries)
    }

    fn read(&self, entry: &AssetEntry) -> Result<Vec<u8>, OverlayError> {
        let path = self.root.join(&entry.location);
        std::fs::read(&path).map_err(|e| {
            if e.kind() == io::ErrorKind::NotFound {
                OverlayError::EntryNotFound {
                    container: self.name.clone(),
                    entry: entry.location.clone(),
                }
            } else {
                self.unreadable(e)
            }
        })
    }

    fn modified(&self) -> Option<SystemTime> {
        WalkDir::new(&self.root)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter_map(|e| e.metadata().ok())
            .filter_map(|m| m.modified().ok())
            .max()
    }
}

/// Render a relative path with `/` separators regardless of platform.
fn slash_path(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
