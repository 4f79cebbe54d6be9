// crates/winedit-core/src/render.rs
//
// Read-only queries used by the renderer and by export.
//
//   active_clips - what is on screen / audible at one instant, with each
//                  clip's evaluated transform
//   needs_resync - drift check for media elements following the playhead
//   export_plan  - ordered list of source segments handed to the encoder

use crate::error::{EditError, EditResult};
use crate::model::{ClipId, ClipKind, TrackId, TrackKind};
use crate::properties::ClipTransform;
use crate::timeline::TimelineStore;

// ── Renderer view ─────────────────────────────────────────────────────────────

/// One clip as the renderer sees it at a given playhead time.
#[derive(Clone, Debug, PartialEq)]
pub struct ActiveClip {
    pub clip_id:     ClipId,
    pub track_id:    TrackId,
    /// Stacking position; lower indices are drawn first.
    pub track_index: usize,
    pub track_kind:  TrackKind,
    pub kind:        ClipKind,
    pub name:        String,
    pub source:      String,
    /// Seconds since the clip started.
    pub local_time:  f64,
    /// Where in the source media this frame comes from.
    pub source_time: f64,
    pub transform:   ClipTransform,
}

/// Clips with `start <= time < end` on tracks that are rendered (not hidden,
/// and for audio not muted), in track order.
pub fn active_clips(store: &TimelineStore, time: f64) -> Vec<ActiveClip> {
    store.tracks().iter().enumerate()
        .filter(|(_, t)| t.is_rendered())
        .flat_map(|(track_index, track)| {
            track.clips.iter()
                .filter(move |c| c.is_active_at(time))
                .map(move |c| {
                    let local_time = time - c.start;
                    ActiveClip {
                        clip_id:     c.id.clone(),
                        track_id:    track.id.clone(),
                        track_index,
                        track_kind:  track.kind,
                        kind:        c.kind,
                        name:        c.name.clone(),
                        source:      c.source.clone(),
                        local_time,
                        source_time: c.source_time_at(time),
                        transform:   c.properties.evaluate_all(local_time),
                    }
                })
        })
        .collect()
}

/// Whether a media element playing at `element_time` has drifted more than
/// `tolerance` seconds from where the playhead says it should be.
///
/// ```
/// use winedit_core::render::needs_resync;
/// assert!(!needs_resync(10.05, 10.0, 0.1));
/// assert!(needs_resync(10.25, 10.0, 0.2));
/// ```
#[inline]
pub fn needs_resync(element_time: f64, expected: f64, tolerance: f64) -> bool {
    (element_time - expected).abs() > tolerance
}

/// Drift tolerance configured for a track kind.
pub fn drift_tolerance(store: &TimelineStore, kind: TrackKind) -> f64 {
    match kind {
        TrackKind::Video => store.settings().video_drift_tolerance,
        TrackKind::Audio => store.settings().audio_drift_tolerance,
    }
}

// ── Export plan ───────────────────────────────────────────────────────────────

/// One trimmed source segment placed on the output timeline.
#[derive(Clone, Debug, PartialEq)]
pub struct ExportSegment {
    pub clip_id:       ClipId,
    pub source_path:   String,
    /// Seconds into the source where the segment begins.
    pub trim_start:    f64,
    pub trim_duration: f64,
    /// Output time at which the segment appears.
    pub placement:     f64,
}

/// Video-kind clips from visible video tracks, ordered by start time. Clips
/// sharing a start keep track order.
pub fn export_plan(store: &TimelineStore) -> EditResult<Vec<ExportSegment>> {
    let mut segments: Vec<ExportSegment> = store.tracks().iter()
        .filter(|t| t.kind == TrackKind::Video && !t.hidden)
        .flat_map(|t| t.clips.iter())
        .filter(|c| c.kind == ClipKind::Video)
        .map(|c| ExportSegment {
            clip_id:       c.id.clone(),
            source_path:   c.source.clone(),
            trim_start:    c.source_offset,
            trim_duration: c.duration,
            placement:     c.start,
        })
        .collect();
    segments.sort_by(|a, b| a.placement.total_cmp(&b.placement));

    if segments.is_empty() {
        return Err(EditError::Export("no video clips to export".into()));
    }
    Ok(segments)
}
