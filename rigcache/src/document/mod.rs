//! Decoders for the two cached document kinds.
//!
//! Both formats are Bedrock-style JSON. Parsers are stateless apart from the
//! shared [`VariableRegistry`] and are safe to call from many threads at once.

mod animation;
mod expression;
mod model;

pub use animation::{
    Animation, AnimationParser, AnimationSet, BoneAnimation, Channel, KeyValue, Keyframe, LoopMode,
    Vector3,
};
pub use expression::{canonical_name, query_references, VariableRegistry, STANDARD_QUERIES};
pub use model::{Cube, Face, FaceUv, GeoBone, GeoModel, ModelParser, Uv};

use std::fmt;

use crate::error::ParseError;
use crate::identifier::AssetId;
use crate::overlay::AssetSource;

/// The two kinds of cached asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetKind {
    /// Animation documents.
    Animation,

    /// Geometry documents.
    Model,
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetKind::Animation => write!(f, "animation"),
            AssetKind::Model => write!(f, "model"),
        }
    }
}

/// Turns raw asset bytes into a document.
pub trait DocumentParser: Send + Sync {
    /// The parsed document type.
    type Document: Send + Sync + 'static;

    /// Which asset kind this parser handles.
    fn kind(&self) -> AssetKind;

    /// Parse one file's bytes.
    fn parse(&self, id: &AssetId, bytes: &[u8]) -> Result<Self::Document, ParseError>;

    /// Read `source` from its overlay and parse it.
    fn load(&self, source: &AssetSource) -> Result<Self::Document, ParseError> {
        let bytes = source.read().map_err(|e| ParseError::Read {
            id: source.id().clone(),
            source: e,
        })?;
        self.parse(source.id(), &bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::OverlayError;
    use crate::overlay::{AssetEntry, DirectoryOverlay};
    use std::sync::Arc;

    #[test]
    fn test_asset_kind_display() {
        assert_eq!(AssetKind::Animation.to_string(), "animation");
        assert_eq!(AssetKind::Model.to_string(), "model");
    }

    #[test]
    fn test_load_wraps_read_failures() {
        let overlay = Arc::new(DirectoryOverlay::new("/nonexistent/rigcache/pack"));
        let id = AssetId::new("x", "geo/a.json");
        let source = AssetSource::new(overlay, AssetEntry::new(id.clone(), "assets/x/geo/a.json"));

        let err = ModelParser::new().load(&source).unwrap_err();
        assert_eq!(err.id(), &id);
        assert!(matches!(
            err,
            ParseError::Read {
                source: OverlayError::EntryNotFound { .. },
                ..
            }
        ));
    }
}
