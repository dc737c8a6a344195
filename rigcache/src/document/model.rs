//! Geometry documents.
//!
//! Reads the `minecraft:geometry` array and keeps the first geometry. The bone
//! list must form a forest: unique names, parents that exist, no cycles.

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::Deserialize;
use tracing::debug;

use super::{AssetKind, DocumentParser};
use crate::error::ParseError;
use crate::identifier::AssetId;

/// A cube face.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Face {
    North,
    South,
    East,
    West,
    Up,
    Down,
}

/// Texture region for one face.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FaceUv {
    pub uv: [f32; 2],
    #[serde(default)]
    pub uv_size: [f32; 2],
}

/// Texture mapping of a cube.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Uv {
    /// Box UV: a single offset, faces laid out automatically.
    Box([f32; 2]),

    /// Explicit region per face.
    PerFace(BTreeMap<Face, FaceUv>),
}

impl Default for Uv {
    fn default() -> Self {
        Uv::Box([0.0, 0.0])
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Cube {
    pub origin: [f32; 3],
    pub size: [f32; 3],
    #[serde(default)]
    pub uv: Uv,
    #[serde(default)]
    pub inflate: f32,
    pub mirror: Option<bool>,
    pub pivot: Option<[f32; 3]>,
    pub rotation: Option<[f32; 3]>,
}

/// A bone in the geometry hierarchy.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GeoBone {
    pub name: String,
    pub parent: Option<String>,
    #[serde(default)]
    pub pivot: [f32; 3],
    #[serde(default)]
    pub rotation: [f32; 3],
    #[serde(default)]
    pub mirror: bool,
    #[serde(default)]
    pub cubes: Vec<Cube>,
}

/// A parsed geometry.
#[derive(Debug, Clone, PartialEq)]
pub struct GeoModel {
    /// Geometry identifier, e.g. `geometry.x.wolf`.
    pub identifier: String,
    pub texture_width: u32,
    pub texture_height: u32,
    pub bones: Vec<GeoBone>,
}

impl GeoModel {
    /// Look up a bone by name.
    pub fn bone(&self, name: &str) -> Option<&GeoBone> {
        self.bones.iter().find(|b| b.name == name)
    }

    /// Bones without a parent.
    pub fn roots(&self) -> impl Iterator<Item = &GeoBone> {
        self.bones.iter().filter(|b| b.parent.is_none())
    }

    /// Direct children of `name`.
    pub fn children<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a GeoBone> {
        self.bones
            .iter()
            .filter(move |b| b.parent.as_deref() == Some(name))
    }

    /// Total number of cubes across all bones.
    pub fn cube_count(&self) -> usize {
        self.bones.iter().map(|b| b.cubes.len()).sum()
    }
}

// Wire types

#[derive(Deserialize)]
struct RawFile {
    #[serde(rename = "minecraft:geometry")]
    geometry: Vec<RawGeometry>,
}

#[derive(Deserialize)]
struct RawGeometry {
    description: RawDescription,
    #[serde(default)]
    bones: Vec<GeoBone>,
}

#[derive(Deserialize)]
struct RawDescription {
    identifier: String,
    #[serde(default = "default_texture_size")]
    texture_width: u32,
    #[serde(default = "default_texture_size")]
    texture_height: u32,
}

fn default_texture_size() -> u32 {
    16
}

/// Parser for geometry documents.
#[derive(Debug, Clone, Default)]
pub struct ModelParser;

impl ModelParser {
    /// Create a new parser.
    pub fn new() -> Self {
        Self
    }
}

impl DocumentParser for ModelParser {
    type Document = GeoModel;

    fn kind(&self) -> AssetKind {
        AssetKind::Model
    }

    fn parse(&self, id: &AssetId, bytes: &[u8]) -> Result<GeoModel, ParseError> {
        let raw: RawFile = serde_json::from_slice(bytes).map_err(|source| ParseError::Syntax {
            id: id.clone(),
            source,
        })?;

        let geometry = raw
            .geometry
            .into_iter()
            .next()
            .ok_or_else(|| ParseError::invalid(id, "document contains no geometry"))?;

        if geometry.description.identifier.trim().is_empty() {
            return Err(ParseError::invalid(id, "geometry identifier is empty"));
        }

        validate_hierarchy(id, &geometry.bones)?;

        let model = GeoModel {
            identifier: geometry.description.identifier,
            texture_width: geometry.description.texture_width,
            texture_height: geometry.description.texture_height,
            bones: geometry.bones,
        };

        debug!(
            id = %id,
            identifier = %model.identifier,
            bones = model.bones.len(),
            "Parsed model document"
        );
        Ok(model)
    }
}

fn validate_hierarchy(id: &AssetId, bones: &[GeoBone]) -> Result<(), ParseError> {
    let mut parents: HashMap<&str, Option<&str>> = HashMap::with_capacity(bones.len());
    for bone in bones {
        if parents
            .insert(bone.name.as_str(), bone.parent.as_deref())
            .is_some()
        {
            return Err(ParseError::invalid(
                id,
                format!("duplicate bone '{}'", bone.name),
            ));
        }
    }

    for bone in bones {
        if let Some(parent) = bone.parent.as_deref() {
            if !parents.contains_key(parent) {
                return Err(ParseError::invalid(
                    id,
                    format!("bone '{}' has unknown parent '{}'", bone.name, parent),
                ));
            }
        }
    }

    for bone in bones {
        let mut seen = HashSet::new();
        let mut current = Some(bone.name.as_str());
        while let Some(name) = current {
            if !seen.insert(name) {
                return Err(ParseError::invalid(
                    id,
                    format!("bone '{}' is part of a parent cycle", bone.name),
                ));
            }
            current = parents.get(name).copied().flatten();
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::model_json;

    fn id() -> AssetId {
        AssetId::new("x", "geo/wolf.geo.json")
    }

    fn parse(json: &str) -> Result<GeoModel, ParseError> {
        ModelParser::new().parse(&id(), json.as_bytes())
    }

    fn with_bones(bones: &str) -> String {
        format!(
            r#"{{"minecraft:geometry": [{{"description": {{"identifier": "geometry.test"}}, "bones": {}}}]}}"#,
            bones
        )
    }

    #[test]
    fn test_parse_fixture() {
        let model = parse(&model_json("geometry.x.wolf")).unwrap();

        assert_eq!(model.identifier, "geometry.x.wolf");
        assert_eq!((model.texture_width, model.texture_height), (64, 32));
        assert_eq!(model.bones.len(), 2);
        assert_eq!(model.roots().count(), 1);
        assert_eq!(model.children("root").next().unwrap().name, "head");
        assert_eq!(model.cube_count(), 1);

        let head = model.bone("head").unwrap();
        assert_eq!(head.pivot, [0.0, 24.0, 0.0]);
        assert_eq!(head.cubes[0].uv, Uv::Box([0.0, 0.0]));
    }

    #[test]
    fn test_per_face_uv() {
        let model = parse(&with_bones(
            r#"[{"name": "a", "cubes": [{"origin": [0,0,0], "size": [1,1,1],
                "uv": {"north": {"uv": [0, 0], "uv_size": [1, 1]}, "up": {"uv": [2, 2]}}}]}]"#,
        ))
        .unwrap();

        let Uv::PerFace(faces) = &model.bones[0].cubes[0].uv else {
            panic!("expected per-face uv");
        };
        assert_eq!(faces.len(), 2);
        assert_eq!(faces[&Face::North].uv_size, [1.0, 1.0]);
        assert_eq!(faces[&Face::Up].uv_size, [0.0, 0.0]);
    }

    #[test]
    fn test_texture_size_defaults() {
        let model = parse(&with_bones("[]")).unwrap();
        assert_eq!((model.texture_width, model.texture_height), (16, 16));
        assert!(model.bones.is_empty());
    }

    #[test]
    fn test_empty_geometry_list_is_invalid() {
        let err = parse(r#"{"minecraft:geometry": []}"#).unwrap_err();
        assert!(matches!(err, ParseError::Invalid { .. }));
    }

    #[test]
    fn test_missing_geometry_key_is_syntax_error() {
        let err = parse(r#"{"format_version": "1.12.0"}"#).unwrap_err();
        assert!(matches!(err, ParseError::Syntax { .. }));
    }

    #[test]
    fn test_duplicate_bone_is_invalid() {
        let err = parse(&with_bones(r#"[{"name": "a"}, {"name": "a"}]"#)).unwrap_err();
        assert!(err.to_string().contains("duplicate bone"));
    }

    #[test]
    fn test_unknown_parent_is_invalid() {
        let err = parse(&with_bones(r#"[{"name": "a", "parent": "ghost"}]"#)).unwrap_err();
        assert!(err.to_string().contains("unknown parent"));
    }

    #[test]
    fn test_parent_cycle_is_invalid() {
        let err = parse(&with_bones(
            r#"[{"name": "a", "parent": "b"}, {"name": "b", "parent": "a"}]"#,
        ))
        .unwrap_err();
        assert!(err.to_string().contains("cycle"));
    }

    #[test]
    fn test_empty_identifier_is_invalid() {
        let err = parse(r#"{"minecraft:geometry": [{"description": {"identifier": " "}}]}"#)
            .unwrap_err();
        assert!(matches!(err, ParseError::Invalid { .. }));
    }
}
