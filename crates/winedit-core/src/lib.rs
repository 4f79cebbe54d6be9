// crates/winedit-core/src/lib.rs
//
// Pure timeline engine. No threads, no processes, no runtime handles.
// Everything here is plain data plus the operations that keep it consistent.
//
// Layering, leaves first:
//   interpolation  - easing curves + keyframe evaluation
//   properties     - the five animatable clip properties
//   model          - Track / Clip entities and their invariants
//   timeline       - TimelineStore: canonical state + all mutations
//   playback       - PlaybackClock: advances the cursor once per frame
//
// Around the core:
//   project   - .wne project file load/save
//   media_bin - asset pool of clip templates
//   render    - renderer / export queries over a track snapshot
//   commands  - EditorCommand, the only way the app shell mutates state

pub mod commands;
pub mod error;
pub mod helpers;
pub mod interpolation;
pub mod media_bin;
pub mod media_types;
pub mod model;
pub mod playback;
pub mod project;
pub mod properties;
pub mod render;
pub mod settings;
pub mod timeline;

pub use error::{EditError, EditResult};
pub use model::{AssetId, Clip, ClipDraft, ClipId, ClipKind, KeyframeId, Track, TrackId, TrackKind};
pub use properties::{AnimatedProperties, ClipTransform, Easing, Keyframe, Property, PropertyKey};
pub use settings::EditorSettings;
pub use timeline::{ClipUpdate, TimelineStore};
