// crates/winedit-core/src/properties.rs
//
// The animatable clip properties.
//
// Design:
//   PropertyKey        - closed set of the five properties every clip carries.
//                        Exhaustive matches replace string-keyed lookups.
//   Property           - base value + keyframes.
//   AnimatedProperties - fixed record of five Properties; `get`/`get_mut`
//                        are the accessor table used by editors and the renderer.
//   ClipTransform      - the five evaluated values at one instant, handed to
//                        the renderer as a visual transform.
//
// Serialized shape matches the project file: `{ "opacity": { "value": 1,
// "keyframes": [...] }, ... }`. Never rename the serde names without a
// migration path; existing .wne files depend on them.

use serde::{Deserialize, Serialize};

use crate::interpolation::evaluate;
use crate::model::KeyframeId;

// ── Keys ──────────────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PropertyKey {
    Opacity,
    Scale,
    Rotation,
    PositionX,
    PositionY,
}

impl PropertyKey {
    pub const ALL: [PropertyKey; 5] = [
        PropertyKey::Opacity,
        PropertyKey::Scale,
        PropertyKey::Rotation,
        PropertyKey::PositionX,
        PropertyKey::PositionY,
    ];

    /// Wire name used in the project file and in log output.
    pub fn name(self) -> &'static str {
        match self {
            PropertyKey::Opacity   => "opacity",
            PropertyKey::Scale     => "scale",
            PropertyKey::Rotation  => "rotation",
            PropertyKey::PositionX => "positionX",
            PropertyKey::PositionY => "positionY",
        }
    }

    /// Natural resting value: fully opaque, unscaled, unrotated, centred.
    pub fn default_value(self) -> f64 {
        match self {
            PropertyKey::Opacity | PropertyKey::Scale => 1.0,
            PropertyKey::Rotation | PropertyKey::PositionX | PropertyKey::PositionY => 0.0,
        }
    }
}

impl std::fmt::Display for PropertyKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

// ── Keyframes ─────────────────────────────────────────────────────────────────

/// Easing applied to the segment that STARTS at the keyframe carrying it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Easing {
    #[default]
    Linear,
    EaseIn,
    EaseOut,
    EaseInOut,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Keyframe {
    pub id:     KeyframeId,
    /// Seconds relative to the owning clip's `start`.
    pub time:   f64,
    pub value:  f64,
    #[serde(default)]
    pub easing: Easing,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Property {
    /// Used verbatim whenever `keyframes` is empty.
    #[serde(rename = "value")]
    pub base_value: f64,
    #[serde(default)]
    pub keyframes:  Vec<Keyframe>,
}

impl Property {
    pub fn new(base_value: f64) -> Self {
        Self { base_value, keyframes: Vec::new() }
    }

    pub fn is_animated(&self) -> bool {
        !self.keyframes.is_empty()
    }

    /// Append a keyframe with a freshly minted id. List order is preserved;
    /// evaluation sorts by time on its own.
    pub fn push_keyframe(&mut self, time: f64, value: f64, easing: Easing) -> KeyframeId {
        let id = KeyframeId::new();
        self.keyframes.push(Keyframe { id: id.clone(), time, value, easing });
        id
    }

    /// Returns `true` if a keyframe with `id` existed.
    pub fn remove_keyframe(&mut self, id: &KeyframeId) -> bool {
        let before = self.keyframes.len();
        self.keyframes.retain(|k| &k.id != id);
        self.keyframes.len() != before
    }

    pub fn keyframe_mut(&mut self, id: &KeyframeId) -> Option<&mut Keyframe> {
        self.keyframes.iter_mut().find(|k| &k.id == id)
    }

    #[inline]
    pub fn value_at(&self, time: f64) -> f64 {
        evaluate(self, time)
    }
}

// ── Property set ──────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AnimatedProperties {
    pub opacity:    Property,
    pub scale:      Property,
    pub rotation:   Property,
    pub position_x: Property,
    pub position_y: Property,
}

impl Default for AnimatedProperties {
    fn default() -> Self {
        Self {
            opacity:    Property::new(PropertyKey::Opacity.default_value()),
            scale:      Property::new(PropertyKey::Scale.default_value()),
            rotation:   Property::new(PropertyKey::Rotation.default_value()),
            position_x: Property::new(PropertyKey::PositionX.default_value()),
            position_y: Property::new(PropertyKey::PositionY.default_value()),
        }
    }
}

impl AnimatedProperties {
    pub fn get(&self, key: PropertyKey) -> &Property {
        match key {
            PropertyKey::Opacity   => &self.opacity,
            PropertyKey::Scale     => &self.scale,
            PropertyKey::Rotation  => &self.rotation,
            PropertyKey::PositionX => &self.position_x,
            PropertyKey::PositionY => &self.position_y,
        }
    }

    pub fn get_mut(&mut self, key: PropertyKey) -> &mut Property {
        match key {
            PropertyKey::Opacity   => &mut self.opacity,
            PropertyKey::Scale     => &mut self.scale,
            PropertyKey::Rotation  => &mut self.rotation,
            PropertyKey::PositionX => &mut self.position_x,
            PropertyKey::PositionY => &mut self.position_y,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (PropertyKey, &Property)> {
        PropertyKey::ALL.into_iter().map(move |k| (k, self.get(k)))
    }

    /// Evaluate one property at `local_time` (seconds since clip start).
    #[inline]
    pub fn evaluate(&self, key: PropertyKey, local_time: f64) -> f64 {
        evaluate(self.get(key), local_time)
    }

    /// Evaluate all five properties at `local_time`.
    pub fn evaluate_all(&self, local_time: f64) -> ClipTransform {
        ClipTransform {
            opacity:    self.evaluate(PropertyKey::Opacity,   local_time),
            scale:      self.evaluate(PropertyKey::Scale,     local_time),
            rotation:   self.evaluate(PropertyKey::Rotation,  local_time),
            position_x: self.evaluate(PropertyKey::PositionX, local_time),
            position_y: self.evaluate(PropertyKey::PositionY, local_time),
        }
    }

    pub fn keyframe_count(&self) -> usize {
        self.iter().map(|(_, p)| p.keyframes.len()).sum()
    }
}

/// Evaluated per-frame visual transform for one clip.
/// Rotation is in degrees, positions in output pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClipTransform {
    pub opacity:    f64,
    pub scale:      f64,
    pub rotation:   f64,
    pub position_x: f64,
    pub position_y: f64,
}

impl Default for ClipTransform {
    fn default() -> Self {
        AnimatedProperties::default().evaluate_all(0.0)
    }
}
