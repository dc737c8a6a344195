//! Animation documents.
//!
//! Accepted shape:
//!
//! ```text
//! {
//!   "format_version": "1.8.0",
//!   "animations": {
//!     "<name>": {
//!       "loop": true | false | "hold_on_last_frame",
//!       "animation_length": 2.0,
//!       "bones": {
//!         "<bone>": {
//!           "rotation": [x, y, z] | value | { "<time>": [x, y, z] | { "pre": .., "post": .. } }
//!         }
//!       }
//!     }
//!   }
//! }
//! ```
//!
//! Components are numbers or expression strings. Numeric strings are folded
//! into constants.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Deserialize;
use tracing::debug;

use super::{AssetKind, DocumentParser, VariableRegistry};
use crate::error::ParseError;
use crate::identifier::AssetId;

/// One component of a vector value.
#[derive(Debug, Clone, PartialEq)]
pub enum KeyValue {
    /// A literal number.
    Constant(f64),

    /// An expression to be evaluated by the host.
    Expression(String),
}

impl KeyValue {
    /// The constant value, if this is not an expression.
    pub fn as_constant(&self) -> Option<f64> {
        match self {
            KeyValue::Constant(v) => Some(*v),
            KeyValue::Expression(_) => None,
        }
    }
}

/// A three-component value.
#[derive(Debug, Clone, PartialEq)]
pub struct Vector3 {
    pub x: KeyValue,
    pub y: KeyValue,
    pub z: KeyValue,
}

impl Vector3 {
    /// Vector with all three components set to `value`.
    pub fn uniform(value: KeyValue) -> Self {
        Self {
            x: value.clone(),
            y: value.clone(),
            z: value,
        }
    }

    fn components(&self) -> [&KeyValue; 3] {
        [&self.x, &self.y, &self.z]
    }
}

/// A value at a point in time.
#[derive(Debug, Clone, PartialEq)]
pub struct Keyframe {
    /// Seconds from the start of the animation.
    pub time: f64,
    pub value: Vector3,
}

/// One animated property of a bone.
#[derive(Debug, Clone, PartialEq)]
pub enum Channel {
    /// Same value for the whole animation.
    Static(Vector3),

    /// Keyframes sorted by time.
    Keyframes(Vec<Keyframe>),
}

impl Channel {
    /// Time of the last keyframe, or zero for static channels.
    pub fn end_time(&self) -> f64 {
        match self {
            Channel::Static(_) => 0.0,
            Channel::Keyframes(frames) => frames.last().map(|k| k.time).unwrap_or(0.0),
        }
    }

    fn values(&self) -> Vec<&Vector3> {
        match self {
            Channel::Static(v) => vec![v],
            Channel::Keyframes(frames) => frames.iter().map(|k| &k.value).collect(),
        }
    }
}

/// Animated channels for one bone.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoneAnimation {
    pub rotation: Option<Channel>,
    pub position: Option<Channel>,
    pub scale: Option<Channel>,
}

impl BoneAnimation {
    fn channels(&self) -> impl Iterator<Item = &Channel> {
        [&self.rotation, &self.position, &self.scale]
            .into_iter()
            .flatten()
    }
}

/// What happens when playback reaches the end.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LoopMode {
    /// Stop and return to the rest pose.
    #[default]
    PlayOnce,

    /// Restart from the beginning.
    Loop,

    /// Stop and keep the final pose.
    HoldOnLastFrame,
}

/// One named animation.
#[derive(Debug, Clone, PartialEq)]
pub struct Animation {
    pub loop_mode: LoopMode,

    /// Declared length in seconds, if any.
    pub length: Option<f64>,

    pub bones: BTreeMap<String, BoneAnimation>,
}

impl Animation {
    /// Declared length, or the time of the latest keyframe.
    pub fn duration(&self) -> f64 {
        self.length.unwrap_or_else(|| {
            self.bones
                .values()
                .flat_map(|b| b.channels())
                .map(Channel::end_time)
                .fold(0.0, f64::max)
        })
    }
}

/// All animations parsed from one file.
#[derive(Debug, Clone, PartialEq)]
pub struct AnimationSet {
    pub format_version: Option<String>,
    pub animations: BTreeMap<String, Animation>,
}

impl AnimationSet {
    /// Look up an animation by name.
    pub fn get(&self, name: &str) -> Option<&Animation> {
        self.animations.get(name)
    }

    /// Animation names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.animations.keys().map(String::as_str)
    }

    /// Number of animations in the set.
    pub fn len(&self) -> usize {
        self.animations.len()
    }

    /// Check if the set holds no animations.
    pub fn is_empty(&self) -> bool {
        self.animations.is_empty()
    }
}

// Wire types

#[derive(Deserialize)]
struct RawFile {
    format_version: Option<String>,
    animations: BTreeMap<String, RawAnimation>,
}

#[derive(Deserialize)]
struct RawAnimation {
    #[serde(rename = "loop", default)]
    loop_mode: Option<RawLoop>,
    animation_length: Option<f64>,
    #[serde(default)]
    bones: BTreeMap<String, RawBone>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawLoop {
    Flag(bool),
    Named(String),
}

#[derive(Deserialize)]
struct RawBone {
    rotation: Option<RawChannel>,
    position: Option<RawChannel>,
    scale: Option<RawChannel>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawValue {
    Number(f64),
    Text(String),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawChannel {
    Vector([RawValue; 3]),
    Uniform(RawValue),
    Keyframes(BTreeMap<String, RawKeyframe>),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawKeyframe {
    Vector([RawValue; 3]),
    Uniform(RawValue),
    Wrapped { vector: [RawValue; 3] },
    Split {
        pre: Option<[RawValue; 3]>,
        post: Option<[RawValue; 3]>,
    },
}

/// Parser for animation documents.
#[derive(Debug, Clone)]
pub struct AnimationParser {
    variables: Arc<VariableRegistry>,
}

impl AnimationParser {
    /// Create a parser that checks expressions against `variables`.
    pub fn new(variables: Arc<VariableRegistry>) -> Self {
        Self { variables }
    }

    fn convert_animation(
        &self,
        id: &AssetId,
        name: &str,
        raw: RawAnimation,
    ) -> Result<Animation, ParseError> {
        let loop_mode = match raw.loop_mode {
            None | Some(RawLoop::Flag(false)) => LoopMode::PlayOnce,
            Some(RawLoop::Flag(true)) => LoopMode::Loop,
            Some(RawLoop::Named(mode)) => match mode.as_str() {
                "hold_on_last_frame" => LoopMode::HoldOnLastFrame,
                "true" => LoopMode::Loop,
                "false" => LoopMode::PlayOnce,
                other => {
                    return Err(ParseError::invalid(
                        id,
                        format!("animation '{}' has unknown loop mode '{}'", name, other),
                    ))
                }
            },
        };

        if let Some(length) = raw.animation_length {
            if !length.is_finite() || length < 0.0 {
                return Err(ParseError::invalid(
                    id,
                    format!("animation '{}' has invalid length {}", name, length),
                ));
            }
        }

        let mut bones = BTreeMap::new();
        for (bone, raw_bone) in raw.bones {
            let converted = BoneAnimation {
                rotation: convert_channel(id, raw_bone.rotation)?,
                position: convert_channel(id, raw_bone.position)?,
                scale: convert_channel(id, raw_bone.scale)?,
            };
            bones.insert(bone, converted);
        }

        Ok(Animation {
            loop_mode,
            length: raw.animation_length,
            bones,
        })
    }

    fn report_unknown_queries(&self, id: &AssetId, set: &AnimationSet) {
        for (name, animation) in &set.animations {
            for channel in animation.bones.values().flat_map(|b| b.channels()) {
                for vector in channel.values() {
                    for component in vector.components() {
                        if let KeyValue::Expression(expr) = component {
                            for unknown in self.variables.unknown_references(expr) {
                                debug!(
                                    id = %id,
                                    animation = %name,
                                    variable = %unknown,
                                    "Expression references unregistered query variable"
                                );
                            }
                        }
                    }
                }
            }
        }
    }
}

impl DocumentParser for AnimationParser {
    type Document = AnimationSet;

    fn kind(&self) -> AssetKind {
        AssetKind::Animation
    }

    fn parse(&self, id: &AssetId, bytes: &[u8]) -> Result<AnimationSet, ParseError> {
        let raw: RawFile = serde_json::from_slice(bytes).map_err(|source| ParseError::Syntax {
            id: id.clone(),
            source,
        })?;

        let mut animations = BTreeMap::new();
        for (name, raw_animation) in raw.animations {
            let animation = self.convert_animation(id, &name, raw_animation)?;
            animations.insert(name, animation);
        }

        let set = AnimationSet {
            format_version: raw.format_version,
            animations,
        };
        self.report_unknown_queries(id, &set);

        debug!(id = %id, animations = set.len(), "Parsed animation document");
        Ok(set)
    }
}

fn convert_value(raw: RawValue) -> KeyValue {
    match raw {
        RawValue::Number(v) => KeyValue::Constant(v),
        RawValue::Text(text) => {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                KeyValue::Constant(0.0)
            } else if let Ok(v) = trimmed.parse::<f64>() {
                KeyValue::Constant(v)
            } else {
                KeyValue::Expression(trimmed.to_string())
            }
        }
    }
}

fn convert_vector(raw: [RawValue; 3]) -> Vector3 {
    let [x, y, z] = raw;
    Vector3 {
        x: convert_value(x),
        y: convert_value(y),
        z: convert_value(z),
    }
}

fn convert_channel(id: &AssetId, raw: Option<RawChannel>) -> Result<Option<Channel>, ParseError> {
    let Some(raw) = raw else {
        return Ok(None);
    };

    let channel = match raw {
        RawChannel::Vector(v) => Channel::Static(convert_vector(v)),
        RawChannel::Uniform(v) => Channel::Static(Vector3::uniform(convert_value(v))),
        RawChannel::Keyframes(frames) => {
            let mut keyframes = Vec::with_capacity(frames.len());
            for (time, frame) in frames {
                let parsed = time
                    .trim()
                    .parse::<f64>()
                    .ok()
                    .filter(|t| t.is_finite() && *t >= 0.0)
                    .ok_or_else(|| {
                        ParseError::invalid(id, format!("invalid keyframe time '{}'", time))
                    })?;

                let value = match frame {
                    RawKeyframe::Vector(v) | RawKeyframe::Wrapped { vector: v } => {
                        convert_vector(v)
                    }
                    RawKeyframe::Uniform(v) => Vector3::uniform(convert_value(v)),
                    RawKeyframe::Split { pre, post } => match post.or(pre) {
                        Some(v) => convert_vector(v),
                        None => {
                            return Err(ParseError::invalid(
                                id,
                                format!("keyframe at '{}' has neither pre nor post value", time),
                            ))
                        }
                    },
                };

                keyframes.push(Keyframe {
                    time: parsed,
                    value,
                });
            }
            keyframes.sort_by(|a, b| a.time.total_cmp(&b.time));
            Channel::Keyframes(keyframes)
        }
    };

    Ok(Some(channel))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::animation_json;

    fn parser() -> AnimationParser {
        AnimationParser::new(Arc::new(VariableRegistry::with_standard_queries()))
    }

    fn id() -> AssetId {
        AssetId::new("x", "animations/a.json")
    }

    fn parse(json: &str) -> Result<AnimationSet, ParseError> {
        parser().parse(&id(), json.as_bytes())
    }

    #[test]
    fn test_parse_fixture() {
        let set = parse(&animation_json("animation.x.walk")).unwrap();
        let walk = set.get("animation.x.walk").unwrap();

        assert_eq!(set.format_version.as_deref(), Some("1.8.0"));
        assert_eq!(walk.loop_mode, LoopMode::Loop);
        assert_eq!(walk.length, Some(2.0));

        let head = &walk.bones["head"];
        match head.rotation.as_ref().unwrap() {
            Channel::Keyframes(frames) => {
                assert_eq!(frames.len(), 2);
                assert_eq!(frames[0].time, 0.0);
                assert!(matches!(frames[1].value.x, KeyValue::Expression(_)));
            }
            other => panic!("expected keyframes, got {:?}", other),
        }
        assert!(matches!(head.position, Some(Channel::Static(_))));
        assert!(head.scale.is_none());
    }

    #[test]
    fn test_keyframes_sorted_numerically() {
        let set = parse(
            r#"{"animations": {"a": {"bones": {"b": {"position": {
                "10.0": [1, 1, 1], "2.5": [0, 0, 0], "0": [2, 2, 2]
            }}}}}}"#,
        )
        .unwrap();

        let Channel::Keyframes(frames) = set.get("a").unwrap().bones["b"].position.clone().unwrap()
        else {
            panic!("expected keyframes");
        };
        let times: Vec<f64> = frames.iter().map(|k| k.time).collect();
        assert_eq!(times, vec![0.0, 2.5, 10.0]);
    }

    #[test]
    fn test_post_value_wins_over_pre() {
        let set = parse(
            r#"{"animations": {"a": {"bones": {"b": {"rotation": {
                "1.0": {"pre": [1, 1, 1], "post": [9, 9, 9]},
                "2.0": {"pre": [3, 3, 3]}
            }}}}}}"#,
        )
        .unwrap();

        let Some(Channel::Keyframes(frames)) = &set.get("a").unwrap().bones["b"].rotation else {
            panic!("expected keyframes");
        };
        assert_eq!(frames[0].value.x, KeyValue::Constant(9.0));
        assert_eq!(frames[1].value.x, KeyValue::Constant(3.0));
    }

    #[test]
    fn test_uniform_and_numeric_strings() {
        let set = parse(
            r#"{"animations": {"a": {"bones": {"b": {"scale": "1.5", "position": [0, "", "q.anim_time"]}}}}}"#,
        )
        .unwrap();
        let bone = &set.get("a").unwrap().bones["b"];

        assert_eq!(
            bone.scale,
            Some(Channel::Static(Vector3::uniform(KeyValue::Constant(1.5))))
        );
        let Some(Channel::Static(position)) = &bone.position else {
            panic!("expected static position");
        };
        assert_eq!(position.y, KeyValue::Constant(0.0));
        assert_eq!(position.z, KeyValue::Expression("q.anim_time".to_string()));
    }

    #[test]
    fn test_loop_modes() {
        let set = parse(
            r#"{"animations": {
                "once": {},
                "looped": {"loop": true},
                "hold": {"loop": "hold_on_last_frame"}
            }}"#,
        )
        .unwrap();

        assert_eq!(set.get("once").unwrap().loop_mode, LoopMode::PlayOnce);
        assert_eq!(set.get("looped").unwrap().loop_mode, LoopMode::Loop);
        assert_eq!(set.get("hold").unwrap().loop_mode, LoopMode::HoldOnLastFrame);
    }

    #[test]
    fn test_duration_falls_back_to_last_keyframe() {
        let set = parse(
            r#"{"animations": {"a": {"bones": {
                "b": {"rotation": {"0": [0, 0, 0], "1.25": [0, 0, 0]}},
                "c": {"position": {"0.5": [0, 0, 0]}}
            }}}}"#,
        )
        .unwrap();

        assert_eq!(set.get("a").unwrap().duration(), 1.25);
    }

    #[test]
    fn test_malformed_json_is_syntax_error() {
        let err = parse("{ not json").unwrap_err();
        assert!(matches!(err, ParseError::Syntax { .. }));
        assert_eq!(err.id(), &id());
    }

    #[test]
    fn test_missing_animations_is_syntax_error() {
        let err = parse(r#"{"format_version": "1.8.0"}"#).unwrap_err();
        assert!(matches!(err, ParseError::Syntax { .. }));
    }

    #[test]
    fn test_bad_keyframe_time_is_invalid() {
        let err = parse(r#"{"animations": {"a": {"bones": {"b": {"rotation": {"soon": [0, 0, 0]}}}}}}"#)
            .unwrap_err();
        assert!(matches!(err, ParseError::Invalid { .. }));
    }

    #[test]
    fn test_unknown_loop_mode_is_invalid() {
        let err = parse(r#"{"animations": {"a": {"loop": "forever"}}}"#).unwrap_err();
        assert!(matches!(err, ParseError::Invalid { .. }));
    }

    #[test]
    fn test_negative_length_is_invalid() {
        let err = parse(r#"{"animations": {"a": {"animation_length": -1}}}"#).unwrap_err();
        assert!(matches!(err, ParseError::Invalid { .. }));
    }

    #[test]
    fn test_empty_animation_map_is_accepted() {
        let set = parse(r#"{"animations": {}}"#).unwrap();
        assert!(set.is_empty());
    }
}
