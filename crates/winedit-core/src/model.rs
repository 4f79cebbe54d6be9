// crates/winedit-core/src/model.rs
//
// Track and Clip entities plus the invariants every mutation must preserve.
//
// Invariants (checked by `Clip::check_timing`, enforced by TimelineStore):
//   start    >= 0
//   duration >  0   (and finite)
//   offset   >= 0
//
// Ids are opaque strings. New ids are UUID v4, but any string loaded from a
// project file is accepted as-is so files from older builds keep their ids.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{EditError, EditResult};
use crate::properties::AnimatedProperties;

// ── Ids ───────────────────────────────────────────────────────────────────────

macro_rules! declare_ids {
    ( $( $(#[$meta:meta])* $name:ident ),* $(,)? ) => {
        $(
            $(#[$meta])*
            #[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
            #[serde(transparent)]
            pub struct $name(String);

            impl $name {
                /// Mint a fresh, globally unique id.
                pub fn new() -> Self {
                    Self(Uuid::new_v4().to_string())
                }

                pub fn as_str(&self) -> &str {
                    &self.0
                }
            }

            impl Default for $name {
                fn default() -> Self { Self::new() }
            }

            impl From<&str> for $name {
                fn from(s: &str) -> Self { Self(s.to_string()) }
            }

            impl From<String> for $name {
                fn from(s: String) -> Self { Self(s) }
            }

            impl std::fmt::Display for $name {
                fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                    f.write_str(&self.0)
                }
            }
        )*
    };
}

declare_ids! {
    /// Identifies a track; stable for the track's lifetime.
    TrackId,
    /// Identifies a placed clip; stable across moves. Only `split_clip` and
    /// `add_clip` mint new ones.
    ClipId,
    /// Identifies a keyframe within its property.
    KeyframeId,
    /// Identifies a template in the media bin.
    AssetId,
}

// ── Kinds ─────────────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackKind {
    Video,
    Audio,
}

impl TrackKind {
    pub fn label(self) -> &'static str {
        match self {
            TrackKind::Video => "Video",
            TrackKind::Audio => "Audio",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClipKind {
    Video,
    Image,
    Audio,
    Text,
}

impl ClipKind {
    /// The track kind a clip of this kind is placed on by default.
    /// Everything visual lands on a video track.
    pub fn track_kind(self) -> TrackKind {
        match self {
            ClipKind::Audio => TrackKind::Audio,
            ClipKind::Video | ClipKind::Image | ClipKind::Text => TrackKind::Video,
        }
    }

    /// Infer a clip kind from a file extension (case-insensitive).
    /// Unknown extensions are treated as video.
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_ascii_lowercase().as_str() {
            "mp3" | "wav" | "aac" | "flac" | "ogg" | "m4a" | "opus" => ClipKind::Audio,
            "png" | "jpg" | "jpeg" | "gif" | "webp" | "bmp" | "tif" | "tiff" => ClipKind::Image,
            _ => ClipKind::Video,
        }
    }
}

// ── Clip ──────────────────────────────────────────────────────────────────────

/// A placed instance of media or text on a track.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Clip {
    pub id:            ClipId,
    pub track_id:      TrackId,
    pub name:          String,
    #[serde(rename = "type")]
    pub kind:          ClipKind,
    /// Media URI or path; empty for text clips.
    #[serde(rename = "src", default)]
    pub source:        String,
    /// Timeline placement, seconds.
    pub start:         f64,
    pub duration:      f64,
    /// Where playback begins inside the source media, seconds.
    #[serde(rename = "offset", default)]
    pub source_offset: f64,
    #[serde(default)]
    pub properties:    AnimatedProperties,
}

impl Clip {
    #[inline]
    pub fn end(&self) -> f64 {
        self.start + self.duration
    }

    /// Half-open activity test: `start <= time < end`.
    #[inline]
    pub fn is_active_at(&self, time: f64) -> bool {
        time >= self.start && time < self.end()
    }

    /// Strictly-inside test used by split: `start < time < end`.
    #[inline]
    pub fn contains_strictly(&self, time: f64) -> bool {
        time > self.start && time < self.end()
    }

    /// Map a timeline time to the matching time inside the source media.
    #[inline]
    pub fn source_time_at(&self, timeline_time: f64) -> f64 {
        timeline_time - self.start + self.source_offset
    }

    pub fn check_timing(&self) -> EditResult<()> {
        check_timing(self.start, self.duration, self.source_offset)
    }
}

/// Shared validation for clip placement values.
pub fn check_timing(start: f64, duration: f64, source_offset: f64) -> EditResult<()> {
    if !start.is_finite() || start < 0.0 {
        return Err(EditError::InvalidTiming(format!("start must be >= 0, got {start}")));
    }
    if !duration.is_finite() || duration <= 0.0 {
        return Err(EditError::InvalidTiming(format!("duration must be > 0, got {duration}")));
    }
    if !source_offset.is_finite() || source_offset < 0.0 {
        return Err(EditError::InvalidTiming(format!("offset must be >= 0, got {source_offset}")));
    }
    Ok(())
}

// ── ClipDraft ─────────────────────────────────────────────────────────────────

/// The caller-supplied part of a new clip. Anything left `None` is filled in
/// by `TimelineStore::add_clip` from `EditorSettings`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ClipDraft {
    pub name:          Option<String>,
    pub kind:          Option<ClipKind>,
    pub source:        Option<String>,
    pub start:         Option<f64>,
    pub duration:      Option<f64>,
    pub source_offset: Option<f64>,
    pub properties:    Option<AnimatedProperties>,
}

impl ClipDraft {
    pub fn new(kind: ClipKind) -> Self {
        Self { kind: Some(kind), ..Self::default() }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn source(mut self, src: impl Into<String>) -> Self {
        self.source = Some(src.into());
        self
    }

    pub fn at(mut self, start: f64) -> Self {
        self.start = Some(start);
        self
    }

    pub fn lasting(mut self, duration: f64) -> Self {
        self.duration = Some(duration);
        self
    }

    pub fn offset(mut self, source_offset: f64) -> Self {
        self.source_offset = Some(source_offset);
        self
    }

    pub fn with_properties(mut self, properties: AnimatedProperties) -> Self {
        self.properties = Some(properties);
        self
    }
}

// ── Track ─────────────────────────────────────────────────────────────────────

/// An ordered lane of clips. Track order sets visual stacking; clip order
/// within a track is insertion order and carries no meaning for rendering.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub id:     TrackId,
    pub name:   String,
    #[serde(rename = "type")]
    pub kind:   TrackKind,
    #[serde(default)]
    pub clips:  Vec<Clip>,
    #[serde(rename = "isMuted", default)]
    pub muted:  bool,
    #[serde(rename = "isHidden", default)]
    pub hidden: bool,
    #[serde(rename = "isLocked", default)]
    pub locked: bool,
}

impl Track {
    pub fn new(kind: TrackKind, name: impl Into<String>) -> Self {
        Self {
            id:     TrackId::new(),
            name:   name.into(),
            kind,
            clips:  Vec::new(),
            muted:  false,
            hidden: false,
            locked: false,
        }
    }

    pub fn clip(&self, id: &ClipId) -> Option<&Clip> {
        self.clips.iter().find(|c| &c.id == id)
    }

    pub fn clip_index(&self, id: &ClipId) -> Option<usize> {
        self.clips.iter().position(|c| &c.id == id)
    }

    /// End of the last clip on this track, or 0 when empty.
    pub fn content_end(&self) -> f64 {
        self.clips.iter().map(Clip::end).fold(0.0_f64, f64::max)
    }

    /// Whether the renderer should draw / play this track's clips.
    /// Hidden hides any track; muted only silences audio tracks.
    pub fn is_rendered(&self) -> bool {
        !self.hidden && !(self.kind == TrackKind::Audio && self.muted)
    }
}
