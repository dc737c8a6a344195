//! Error types for the asset cache.
//!
//! Errors are split by the unit they affect. Only [`CacheError`] and
//! [`ReloadError::Orchestration`] are fatal to the caller; overlay and parse
//! errors are recovered inside a reload by skipping the container or file.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::identifier::AssetId;

/// Errors raised when reading the cache through a [`crate::CacheContext`].
#[derive(Debug, Error)]
pub enum CacheError {
    /// The cache was read before the host constructed it.
    #[error("asset cache was never initialized; call CacheContext::initialize during startup")]
    Uninitialized,
}

/// Errors raised by an overlay container.
///
/// A reload treats every variant as per-container: the container is skipped,
/// the error is logged, and the remaining containers are still processed.
#[derive(Debug, Error)]
pub enum OverlayError {
    /// The underlying storage could not be read.
    #[error("container '{container}' is unreadable: {source}")]
    Unreadable {
        container: String,
        #[source]
        source: io::Error,
    },

    /// The archive file exists but is not a readable zip.
    #[error("container '{container}' is not a valid archive: {reason}")]
    ArchiveFormat { container: String, reason: String },

    /// An entry that was enumerated is no longer present.
    #[error("entry '{entry}' not found in container '{container}'")]
    EntryNotFound { container: String, entry: String },
}

/// Errors raised while turning one asset file into a document.
///
/// Always scoped to a single identifier; a reload omits that identifier from
/// the new map and carries on.
#[derive(Debug, Error)]
pub enum ParseError {
    /// The bytes could not be read from the container.
    #[error("failed to read {id}: {source}")]
    Read {
        id: AssetId,
        #[source]
        source: OverlayError,
    },

    /// The file is not well-formed JSON or does not match the document shape.
    #[error("malformed document {id}: {source}")]
    Syntax {
        id: AssetId,
        #[source]
        source: serde_json::Error,
    },

    /// The document parsed but violates a structural rule.
    #[error("invalid document {id}: {reason}")]
    Invalid { id: AssetId, reason: String },
}

impl ParseError {
    /// Identifier of the file that failed.
    pub fn id(&self) -> &AssetId {
        match self {
            ParseError::Read { id, .. } => id,
            ParseError::Syntax { id, .. } => id,
            ParseError::Invalid { id, .. } => id,
        }
    }

    pub(crate) fn invalid(id: &AssetId, reason: impl Into<String>) -> Self {
        ParseError::Invalid {
            id: id.clone(),
            reason: reason.into(),
        }
    }
}

/// Errors that fail a reload as a whole.
///
/// When a reload returns one of these, nothing was published and readers keep
/// seeing the previous snapshot.
#[derive(Debug, Error)]
pub enum ReloadError {
    /// Another reload is still running on this cache.
    #[error("a reload is already in progress")]
    InProgress,

    /// Task composition, the publish executor or the reload handshake failed.
    #[error("reload orchestration failed: {0}")]
    Orchestration(String),
}

/// Errors raised while loading or saving configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read or parsed.
    #[error("failed to read config {}: {reason}", path.display())]
    Read { path: PathBuf, reason: String },

    /// The config file could not be written.
    #[error("failed to write config {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A key holds a value that cannot be used.
    #[error("invalid value for '{key}': {value}")]
    InvalidValue { key: String, value: String },
}
