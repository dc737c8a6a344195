//! Overlay containers (resource packs) and asset discovery.
//!
//! An overlay is one resource pack contributing files under
//! `assets/<namespace>/...`. Packs are stacked in an ordered list; when two
//! packs supply the same identifier, the later one wins.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────┐
//! │      OverlayProvider      │  StaticOverlays / PackDirectoryProvider
//! └─────────────┬─────────────┘
//!               │ Vec<Arc<dyn Overlay>> (lowest priority first)
//!               ▼
//! ┌───────────────────────────┐
//! │     dyn Overlay           │  DirectoryOverlay: tree walk
//! │  enumerate(subfolder, f)  │  ArchiveOverlay:   zip index scan
//! └─────────────┬─────────────┘
//!               │ Vec<AssetEntry>
//!               ▼
//! ┌───────────────────────────┐
//! │      OverlayStack         │  resolve(): one map, last overlay wins
//! └───────────────────────────┘
//! ```
//!
//! Overlays expose an explicit enumeration contract instead of their storage
//! internals, so new container types only need to implement [`Overlay`].

mod archive;
mod directory;
mod provider;
mod stack;

pub use archive::ArchiveOverlay;
pub use directory::DirectoryOverlay;
pub use provider::{fingerprint, OverlayProvider, PackDirectoryProvider, StaticOverlays};
pub use stack::{OverlayStack, Resolution};

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;
use std::time::SystemTime;

use crate::error::OverlayError;
use crate::identifier::AssetId;

/// Root folder every namespace lives under inside a pack.
pub const ASSETS_ROOT: &str = "assets";

/// Storage type backing an overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OverlayKind {
    /// A plain directory on disk.
    Directory,

    /// A zip archive.
    Archive,
}

impl fmt::Display for OverlayKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OverlayKind::Directory => write!(f, "directory"),
            OverlayKind::Archive => write!(f, "archive"),
        }
    }
}

/// One asset file found inside an overlay.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AssetEntry {
    /// Identifier the file is cached under.
    pub id: AssetId,

    /// Container-relative storage path, always `/`-separated.
    pub location: String,
}

impl AssetEntry {
    /// Create a new entry.
    pub fn new(id: AssetId, location: impl Into<String>) -> Self {
        Self {
            id,
            location: location.into(),
        }
    }
}

/// A resource pack that can list and read asset files.
///
/// Implementations must be cheap to share across threads; reload drivers read
/// from several worker threads at once.
pub trait Overlay: Send + Sync + fmt::Debug {
    /// Display name used in logs and reports.
    fn name(&self) -> &str;

    /// Storage type.
    fn kind(&self) -> OverlayKind;

    /// Namespaces this overlay provides.
    fn namespaces(&self) -> Result<BTreeSet<String>, OverlayError>;

    /// List every file under `assets/<namespace>/<subfolder>`, across all
    /// namespaces, that passes `filter`.
    ///
    /// A subfolder that does not exist yields an empty list, not an error.
    fn enumerate(
        &self,
        subfolder: &str,
        filter: &(dyn Fn(&str) -> bool + Sync),
    ) -> Result<Vec<AssetEntry>, OverlayError>;

    /// Read the raw bytes of an enumerated entry.
    fn read(&self, entry: &AssetEntry) -> Result<Vec<u8>, OverlayError>;

    /// Most recent modification time of the overlay's contents, if known.
    fn modified(&self) -> Option<SystemTime>;
}

/// An entry bound to the overlay that supplies it.
#[derive(Debug, Clone)]
pub struct AssetSource {
    /// Overlay the entry was found in.
    pub overlay: Arc<dyn Overlay>,

    /// The entry itself.
    pub entry: AssetEntry,
}

impl AssetSource {
    /// Create a new source.
    pub fn new(overlay: Arc<dyn Overlay>, entry: AssetEntry) -> Self {
        Self { overlay, entry }
    }

    /// Identifier of the entry.
    pub fn id(&self) -> &AssetId {
        &self.entry.id
    }

    /// Read the entry's bytes from its overlay.
    pub fn read(&self) -> Result<Vec<u8>, OverlayError> {
        self.overlay.read(&self.entry)
    }
}

/// Build a filter accepting names that end with `suffix`.
pub fn suffix_filter(suffix: impl Into<String>) -> impl Fn(&str) -> bool + Send + Sync {
    let suffix = suffix.into();
    move |name: &str| name.ends_with(suffix.as_str())
}

/// Prefix an entry must start with to belong to `namespace`/`subfolder`.
pub(crate) fn folder_prefix(namespace: &str, subfolder: &str) -> String {
    format!("{}/{}/{}/", ASSETS_ROOT, namespace, subfolder.trim_matches('/'))
}

/// The part of `entry_name` after the end of `prefix`, if it starts with it.
///
/// The suffix is sliced at the end of the prefix as matched inside the entry
/// name. Returns `None` for non-matching names and for the folder entry itself.
pub(crate) fn suffix_after_prefix<'a>(entry_name: &'a str, prefix: &str) -> Option<&'a str> {
    entry_name
        .strip_prefix(prefix)
        .filter(|suffix| !suffix.is_empty())
}
