//! Zip-backed overlays.
//!
//! The archive's entry index is read once when the overlay is opened and
//! scanned on every enumeration. Identifiers are the part of the entry name
//! after `assets/<namespace>/<subfolder>/`, so `assets/x/geo/model/foo.json`
//! enumerated for `geo` becomes `x:model/foo.json`.

use std::collections::BTreeSet;
use std::fmt;
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use parking_lot::Mutex;
use tracing::debug;
use zip::result::ZipError;
use zip::ZipArchive;

use super::{folder_prefix, suffix_after_prefix, AssetEntry, Overlay, OverlayKind, ASSETS_ROOT};
use crate::error::OverlayError;
use crate::identifier::AssetId;

/// Largest entry [`ArchiveOverlay`] will read.
pub const MAX_ENTRY_BYTES: u64 = 64 * 1024 * 1024;

/// Cap on the buffer reserved up front from an entry's declared size.
const PREALLOCATE_LIMIT: u64 = 1024 * 1024;

/// A resource pack stored as a zip archive.
pub struct ArchiveOverlay {
    name: String,
    path: PathBuf,
    /// Entry names, sorted.
    index: Vec<String>,
    archive: Mutex<ZipArchive<File>>,
}

impl ArchiveOverlay {
    /// Open the archive at `path` and read its entry index.
    ///
    /// The overlay is named after the archive's file name.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, OverlayError> {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self::open_named(name, path)
    }

    /// Open the archive at `path` with an explicit display name.
    pub fn open_named(name: impl Into<String>, path: impl Into<PathBuf>) -> Result<Self, OverlayError> {
        let name = name.into();
        let path = path.into();

        let file = File::open(&path).map_err(|source| OverlayError::Unreadable {
            container: name.clone(),
            source,
        })?;
        let archive = ZipArchive::new(file).map_err(|e| zip_error(&name, e))?;

        let mut index: Vec<String> = archive.file_names().map(str::to_string).collect();
        index.sort();

        debug!(
            overlay = %name,
            path = %path.display(),
            entries = index.len(),
            "Opened archive overlay"
        );

        Ok(Self {
            name,
            path,
            index,
            archive: Mutex::new(archive),
        })
    }

    /// Path of the archive file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of entries in the archive index.
    pub fn entry_count(&self) -> usize {
        self.index.len()
    }

    fn ensure_present(&self) -> Result<(), OverlayError> {
        std::fs::metadata(&self.path)
            .map(|_| ())
            .map_err(|source| OverlayError::Unreadable {
                container: self.name.clone(),
                source,
            })
    }
}

impl fmt::Debug for ArchiveOverlay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArchiveOverlay")
            .field("name", &self.name)
            .field("path", &self.path)
            .field("entries", &self.index.len())
            .finish()
    }
}

impl Overlay for ArchiveOverlay {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> OverlayKind {
        OverlayKind::Archive
    }

    fn namespaces(&self) -> Result<BTreeSet<String>, OverlayError> {
        let root = format!("{}/", ASSETS_ROOT);
        Ok(self
            .index
            .iter()
            .filter_map(|name| name.strip_prefix(root.as_str()))
            .filter_map(|rest| rest.split_once('/'))
            .map(|(namespace, _)| namespace)
            .filter(|namespace| !namespace.is_empty())
            .map(str::to_string)
            .collect())
    }

    fn enumerate(
        &self,
        subfolder: &str,
        filter: &(dyn Fn(&str) -> bool + Sync),
    ) -> Result<Vec<AssetEntry>, OverlayError> {
        self.ensure_present()?;

        let prefixes: Vec<(String, String)> = self
            .namespaces()?
            .into_iter()
            .map(|namespace| {
                let prefix = folder_prefix(&namespace, subfolder);
                (namespace, prefix)
            })
            .collect();

        let mut entries = Vec::new();
        for name in &self.index {
            if name.ends_with('/') {
                continue;
            }

            for (namespace, prefix) in &prefixes {
                if let Some(suffix) = suffix_after_prefix(name, prefix) {
                    if filter(name) {
                        entries.push(AssetEntry::new(
                            AssetId::new(namespace.as_str(), suffix),
                            name.as_str(),
                        ));
                    }
                }
            }
        }

        debug!(
            overlay = %self.name,
            subfolder,
            count = entries.len(),
            "Archive overlay enumerated"
        );

        Ok(entries)
    }

    fn read(&self, entry: &AssetEntry) -> Result<Vec<u8>, OverlayError> {
        let mut archive = self.archive.lock();
        let mut file = archive.by_name(&entry.location).map_err(|e| match e {
            ZipError::FileNotFound => OverlayError::EntryNotFound {
                container: self.name.clone(),
                entry: entry.location.clone(),
            },
            other => zip_error(&self.name, other),
        })?;

        // The declared size comes from the archive and is only a hint.
        let hint = file.size().min(PREALLOCATE_LIMIT) as usize;
        let mut bytes = Vec::with_capacity(hint);
        (&mut file)
            .take(MAX_ENTRY_BYTES + 1)
            .read_to_end(&mut bytes)
            .map_err(|source| OverlayError::Unreadable {
                container: self.name.clone(),
                source,
            })?;

        if bytes.len() as u64 > MAX_ENTRY_BYTES {
            return Err(OverlayError::Unreadable {
                container: self.name.clone(),
                source: io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!(
                        "entry '{}' is larger than {} bytes",
                        entry.location, MAX_ENTRY_BYTES
                    ),
                ),
            });
        }
        Ok(bytes)
    }

    fn modified(&self) -> Option<SystemTime> {
        std::fs::metadata(&self.path).and_then(|m| m.modified()).ok()
    }
}

fn zip_error(container: &str, error: ZipError) -> OverlayError {
    match error {
        ZipError::Io(source) => OverlayError::Unreadable {
            container: container.to_string(),
            source,
        },
        other => OverlayError::ArchiveFormat {
            container: container.to_string(),
            reason: other.to_string(),
        },
    }
}
