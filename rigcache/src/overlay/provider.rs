//! Sources of the active overlay list.
//!
//! Providers never fail: a packs folder that is missing or unreadable, or a
//! pack that cannot be opened, is logged and left out. A reload over an empty
//! list publishes empty maps.

use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use tracing::{debug, warn};

use super::{ArchiveOverlay, DirectoryOverlay, Overlay};

/// Supplies the ordered list of active overlays, lowest priority first.
pub trait OverlayProvider: Send + Sync {
    /// Current overlays. Later entries win on identifier collision.
    fn overlays(&self) -> Vec<Arc<dyn Overlay>>;
}

/// A fixed, host-supplied overlay list.
#[derive(Debug, Clone, Default)]
pub struct StaticOverlays {
    overlays: Vec<Arc<dyn Overlay>>,
}

impl StaticOverlays {
    /// Create a provider returning `overlays` as-is.
    pub fn new(overlays: Vec<Arc<dyn Overlay>>) -> Self {
        Self { overlays }
    }

    /// Append an overlay with the highest priority so far.
    pub fn push(&mut self, overlay: Arc<dyn Overlay>) {
        self.overlays.push(overlay);
    }
}

impl OverlayProvider for StaticOverlays {
    fn overlays(&self) -> Vec<Arc<dyn Overlay>> {
        self.overlays.clone()
    }
}

/// Discovers packs in a folder: subfolders become [`DirectoryOverlay`]s and
/// `*.zip` files become [`ArchiveOverlay`]s.
///
/// Without an explicit order, packs are sorted alphabetically by file name.
/// With one, only the named packs are active, in the listed order.
#[derive(Debug, Clone)]
pub struct PackDirectoryProvider {
    packs_dir: PathBuf,
    order: Option<Vec<String>>,
}

impl PackDirectoryProvider {
    /// Create a provider for the given packs folder.
    pub fn new(packs_dir: impl Into<PathBuf>) -> Self {
        Self {
            packs_dir: packs_dir.into(),
            order: None,
        }
    }

    /// Activate only the named packs, lowest priority first.
    pub fn with_order(mut self, order: Vec<String>) -> Self {
        self.order = Some(order);
        self
    }

    /// The packs folder.
    pub fn packs_dir(&self) -> &Path {
        &self.packs_dir
    }

    /// Check if the packs folder exists.
    pub fn exists(&self) -> bool {
        self.packs_dir.is_dir()
    }

    /// Open every pack in the folder, sorted by name.
    fn discover(&self) -> Vec<(String, Arc<dyn Overlay>)> {
        if !self.exists() {
            warn!(
                packs_dir = %self.packs_dir.display(),
                "Packs folder does not exist; no overlays active"
            );
            return Vec::new();
        }

        let entries = match std::fs::read_dir(&self.packs_dir) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(
                    packs_dir = %self.packs_dir.display(),
                    error = %e,
                    "Failed to read packs folder; no overlays active"
                );
                return Vec::new();
            }
        };

        let mut packs: Vec<(String, Arc<dyn Overlay>)> = Vec::new();

        for entry in entries.flatten() {
            let path = entry.path();
            let name = entry.file_name().to_string_lossy().to_string();

            // Skip hidden entries
            if name.starts_with('.') {
                continue;
            }

            if path.is_dir() {
                packs.push((name, Arc::new(DirectoryOverlay::new(&path))));
            } else if is_zip(&path) {
                match ArchiveOverlay::open(&path) {
                    Ok(archive) => packs.push((name, Arc::new(archive))),
                    Err(e) => warn!(
                        pack = %name,
                        error = %e,
                        "Skipping pack that could not be opened"
                    ),
                }
            }
        }

        packs.sort_by(|a, b| a.0.cmp(&b.0));
        packs
    }
}

impl OverlayProvider for PackDirectoryProvider {
    fn overlays(&self) -> Vec<Arc<dyn Overlay>> {
        let packs = self.discover();

        let overlays: Vec<Arc<dyn Overlay>> = match &self.order {
            None => packs.into_iter().map(|(_, overlay)| overlay).collect(),
            Some(order) => {
                let mut by_name: HashMap<String, Arc<dyn Overlay>> = packs.into_iter().collect();
                order
                    .iter()
                    .filter_map(|name| {
                        let overlay = by_name.remove(name);
                        if overlay.is_none() {
                            warn!(pack = %name, "Configured pack not found in packs folder");
                        }
                        overlay
                    })
                    .collect()
            }
        };

        debug!(
            packs_dir = %self.packs_dir.display(),
            count = overlays.len(),
            "Overlay list resolved"
        );

        overlays
    }
}

fn is_zip(path: &Path) -> bool {
    path.is_file()
        && path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("zip"))
}

/// Hash of the overlay list's names, kinds and modification times.
///
/// Changes whenever a pack is added, removed, reordered or modified, so
/// callers can poll it to decide when to reload.
pub fn fingerprint(overlays: &[Arc<dyn Overlay>]) -> u64 {
    let mut hasher = DefaultHasher::new();

    for overlay in overlays {
        overlay.name().hash(&mut hasher);
        overlay.kind().hash(&mut hasher);

        let modified = overlay
            .modified()
            .and_then(|t| t.duration_since(SystemTime::UNIX_EPOCH).ok())
            .map(|d| d.as_nanos())
            .unwrap_or(0);
        modified.hash(&mut hasher);
    }

    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overlay::OverlayKind;
    use crate::testing::{write_file, write_zip};
    use tempfile::TempDir;

    fn names(overlays: &[Arc<dyn Overlay>]) -> Vec<String> {
        overlays.iter().map(|o| o.name().to_string()).collect()
    }

    #[test]
    fn test_missing_packs_dir_yields_empty_list() {
        let provider = PackDirectoryProvider::new("/nonexistent/rigcache/packs");
        assert!(!provider.exists());
        assert!(provider.overlays().is_empty());
    }

    #[test]
    fn test_discovers_folders_and_archives_alphabetically() {
        let temp = TempDir::new().unwrap();
        write_file(temp.path(), "b_pack/assets/x/geo/a.json", "{}");
        write_zip(&temp.path().join("a_pack.zip"), &[("assets/x/geo/a.json", "{}")]);
        write_file(temp.path(), "readme.txt", "not a pack");

        let overlays = PackDirectoryProvider::new(temp.path()).overlays();

        assert_eq!(names(&overlays), vec!["a_pack.zip", "b_pack"]);
        assert_eq!(overlays[0].kind(), OverlayKind::Archive);
        assert_eq!(overlays[1].kind(), OverlayKind::Directory);
    }

    #[test]
    fn test_hidden_entries_are_skipped() {
        let temp = TempDir::new().unwrap();
        write_file(temp.path(), ".cache/assets/x/geo/a.json", "{}");
        write_file(temp.path(), "visible/assets/x/geo/a.json", "{}");

        let overlays = PackDirectoryProvider::new(temp.path()).overlays();
        assert_eq!(names(&overlays), vec!["visible"]);
    }

    #[test]
    fn test_broken_archive_is_skipped() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("broken.zip"), b"garbage").unwrap();
        write_file(temp.path(), "good/assets/x/geo/a.json", "{}");

        let overlays = PackDirectoryProvider::new(temp.path()).overlays();
        assert_eq!(names(&overlays), vec!["good"]);
    }

    #[test]
    fn test_explicit_order_selects_and_orders_packs() {
        let temp = TempDir::new().unwrap();
        write_file(temp.path(), "alpha/assets/x/geo/a.json", "{}");
        write_file(temp.path(), "beta/assets/x/geo/a.json", "{}");
        write_file(temp.path(), "gamma/assets/x/geo/a.json", "{}");

        let overlays = PackDirectoryProvider::new(temp.path())
            .with_order(vec![
                "gamma".to_string(),
                "missing".to_string(),
                "alpha".to_string(),
            ])
            .overlays();

        assert_eq!(names(&overlays), vec!["gamma", "alpha"]);
    }

    #[test]
    fn test_static_overlays_preserve_order() {
        let mut provider = StaticOverlays::default();
        provider.push(Arc::new(DirectoryOverlay::with_name("one", "/a")));
        provider.push(Arc::new(DirectoryOverlay::with_name("two", "/b")));

        assert_eq!(names(&provider.overlays()), vec!["one", "two"]);
    }

    #[test]
    fn test_fingerprint_tracks_list_changes() {
        let temp = TempDir::new().unwrap();
        write_file(temp.path(), "alpha/assets/x/geo/a.json", "{}");
        let provider = PackDirectoryProvider::new(temp.path());

        let before = fingerprint(&provider.overlays());
        assert_eq!(before, fingerprint(&provider.overlays()));

        write_file(temp.path(), "beta/assets/x/geo/b.json", "{}");
        assert_ne!(before, fingerprint(&provider.overlays()));
    }
}
