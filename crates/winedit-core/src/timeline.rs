// crates/winedit-core/src/timeline.rs
//
// TimelineStore: the single canonical copy of the edit, plus every operation
// that mutates it.
//
// Snapshot model:
//   `tracks` is an `Arc<Vec<Track>>`. A mutation clones the vector, edits the
//   clone, validates, and only then swaps the new Arc in. A failed operation
//   returns before the swap, so no caller ever observes a half-applied edit,
//   and a reader holding an old `snapshot()` keeps seeing the state it took.
//
// Ownership:
//   One controller owns the store and passes `&mut` to whoever needs to edit.
//   There is no global instance.

use std::sync::Arc;

use crate::error::{EditError, EditResult};
use crate::model::{check_timing, Clip, ClipDraft, ClipId, ClipKind, KeyframeId, Track, TrackId, TrackKind};
use crate::properties::{Easing, Property, PropertyKey};
use crate::settings::EditorSettings;

// ── ClipUpdate ────────────────────────────────────────────────────────────────

/// One explicit edit to an existing clip. Each variant touches exactly the
/// fields it names.
#[derive(Clone, Debug, PartialEq)]
pub enum ClipUpdate {
    /// Any subset of the placement fields. Validated as a whole.
    Timing {
        start:         Option<f64>,
        duration:      Option<f64>,
        source_offset: Option<f64>,
    },
    Rename(String),
    Source(String),
    SetBaseValue      { key: PropertyKey, value: f64 },
    /// `time` is relative to the clip start and must lie in `[0, duration]`.
    AddKeyframe       { key: PropertyKey, time: f64, value: f64, easing: Easing },
    RemoveKeyframe    { key: PropertyKey, keyframe_id: KeyframeId },
    SetKeyframeEasing { key: PropertyKey, keyframe_id: KeyframeId, easing: Easing },
    ReplaceProperty   { key: PropertyKey, property: Property },
}

// ── TimelineStore ─────────────────────────────────────────────────────────────

#[derive(Clone, Debug)]
pub struct TimelineStore {
    tracks:         Arc<Vec<Track>>,
    /// Set semantics, kept in insertion order.
    selection:      Vec<ClipId>,
    current_time:   f64,
    is_playing:     bool,
    /// Timeline length in seconds. Playback stops here.
    duration:       f64,
    zoom:           f64,
    dirty:          bool,
    project_loaded: bool,
    settings:       EditorSettings,
}

impl Default for TimelineStore {
    fn default() -> Self {
        Self::new(EditorSettings::default())
    }
}

impl TimelineStore {
    pub fn new(settings: EditorSettings) -> Self {
        Self {
            tracks:         Arc::new(default_tracks()),
            selection:      Vec::new(),
            current_time:   0.0,
            is_playing:     false,
            duration:       settings.default_timeline_duration,
            zoom:           settings.default_zoom,
            dirty:          false,
            project_loaded: false,
            settings,
        }
    }

    // ── Read access ───────────────────────────────────────────────────────────

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    /// Shared handle to the current track list. Never changes after it is taken.
    pub fn snapshot(&self) -> Arc<Vec<Track>> {
        Arc::clone(&self.tracks)
    }

    pub fn settings(&self) -> &EditorSettings { &self.settings }
    pub fn current_time(&self) -> f64 { self.current_time }
    pub fn is_playing(&self) -> bool { self.is_playing }
    pub fn duration(&self) -> f64 { self.duration }
    pub fn zoom(&self) -> f64 { self.zoom }
    pub fn is_dirty(&self) -> bool { self.dirty }
    pub fn is_project_loaded(&self) -> bool { self.project_loaded }
    pub fn selection(&self) -> &[ClipId] { &self.selection }

    pub fn is_selected(&self, id: &ClipId) -> bool {
        self.selection.contains(id)
    }

    pub fn track(&self, id: &TrackId) -> Option<&Track> {
        self.tracks.iter().find(|t| &t.id == id)
    }

    pub fn clip(&self, id: &ClipId) -> Option<&Clip> {
        self.find_clip(id).map(|(ti, ci)| &self.tracks[ti].clips[ci])
    }

    /// `(track index, clip index)` of the clip, if present.
    pub fn find_clip(&self, id: &ClipId) -> Option<(usize, usize)> {
        self.tracks.iter().enumerate().find_map(|(ti, t)| t.clip_index(id).map(|ci| (ti, ci)))
    }

    pub fn clip_count(&self) -> usize {
        self.tracks.iter().map(|t| t.clips.len()).sum()
    }

    pub fn selected_clips(&self) -> Vec<&Clip> {
        self.selection.iter().filter_map(|id| self.clip(id)).collect()
    }

    /// End of the last clip on any track, or 0 for an empty timeline.
    pub fn content_end(&self) -> f64 {
        self.tracks.iter().map(Track::content_end).fold(0.0_f64, f64::max)
    }

    /// First track of `kind` in stacking order.
    pub fn first_track_of(&self, kind: TrackKind) -> Option<&Track> {
        self.tracks.iter().find(|t| t.kind == kind)
    }

    // ── Internal ──────────────────────────────────────────────────────────────

    /// Run `f` against a private copy of the tracks and publish the copy only
    /// if `f` succeeds.
    fn edit<R>(&mut self, f: impl FnOnce(&mut Vec<Track>) -> EditResult<R>) -> EditResult<R> {
        let mut next = Vec::clone(&self.tracks);
        let out = f(&mut next)?;
        self.publish(next);
        Ok(out)
    }

    /// Swap in a new track vector and flag unsaved work.
    fn publish(&mut self, next: Vec<Track>) {
        self.tracks = Arc::new(next);
        self.dirty  = true;
    }

    fn prune_selection(&mut self) {
        let tracks = Arc::clone(&self.tracks);
        self.selection.retain(|id| tracks.iter().any(|t| t.clip_index(id).is_some()));
    }

    // ── Tracks ────────────────────────────────────────────────────────────────

    /// Append an empty track named after its kind and the new track count.
    pub fn add_track(&mut self, kind: TrackKind) -> TrackId {
        let name  = format!("{} Track {}", kind.label(), self.tracks.len() + 1);
        let track = Track::new(kind, name);
        let id    = track.id.clone();
        log::debug!("[timeline] add track {id} ({})", track.name);
        let mut next = Vec::clone(&self.tracks);
        next.push(track);
        self.publish(next);
        id
    }

    /// Remove a track and every clip on it. Returns `false` for an unknown id.
    pub fn remove_track(&mut self, id: &TrackId) -> bool {
        if self.track(id).is_none() {
            return false;
        }
        let mut next = Vec::clone(&self.tracks);
        next.retain(|t| &t.id != id);
        self.publish(next);
        self.prune_selection();
        log::debug!("[timeline] remove track {id}");
        true
    }

    pub fn rename_track(&mut self, id: &TrackId, name: impl Into<String>) -> bool {
        let name = name.into();
        self.edit_track(id, |t| t.name = name)
    }

    pub fn set_track_muted(&mut self, id: &TrackId, muted: bool) -> bool {
        self.edit_track(id, |t| t.muted = muted)
    }

    pub fn set_track_hidden(&mut self, id: &TrackId, hidden: bool) -> bool {
        self.edit_track(id, |t| t.hidden = hidden)
    }

    /// The flag is stored and round-tripped; edits to a locked track are not
    /// refused here, that is left to the interaction layer.
    pub fn set_track_locked(&mut self, id: &TrackId, locked: bool) -> bool {
        self.edit_track(id, |t| t.locked = locked)
    }

    fn edit_track(&mut self, id: &TrackId, f: impl FnOnce(&mut Track)) -> bool {
        self.edit(|tracks| {
            let track = tracks.iter_mut().find(|t| &t.id == id)
                .ok_or_else(|| EditError::TrackNotFound(id.clone()))?;
            f(track);
            Ok(())
        })
        .is_ok()
    }

    // ── Clips ─────────────────────────────────────────────────────────────────

    /// Build a clip from `draft`, filling gaps from settings, and append it to
    /// `track_id`. The clip always gets a fresh id.
    pub fn add_clip(&mut self, track_id: &TrackId, draft: ClipDraft) -> EditResult<ClipId> {
        if self.track(track_id).is_none() {
            log::warn!("[timeline] add_clip: track {track_id} not found");
            return Err(EditError::TrackNotFound(track_id.clone()));
        }

        let kind = draft.kind.unwrap_or(ClipKind::Video);
        let default_duration = match kind {
            ClipKind::Text => self.settings.default_text_duration,
            ClipKind::Video | ClipKind::Image | ClipKind::Audio => self.settings.default_media_duration,
        };
        let clip = Clip {
            id:            ClipId::new(),
            track_id:      track_id.clone(),
            name:          draft.name.unwrap_or_else(|| "New Clip".into()),
            kind,
            source:        draft.source.unwrap_or_default(),
            start:         draft.start.unwrap_or(0.0).max(0.0),
            duration:      draft.duration.unwrap_or(default_duration),
            source_offset: draft.source_offset.unwrap_or(0.0),
            properties:    draft.properties.unwrap_or_default(),
        };
        clip.check_timing()?;

        let id = clip.id.clone();
        log::debug!("[timeline] add clip {id} '{}' to {track_id} at {:.3}s", clip.name, clip.start);
        self.edit(|tracks| {
            let track = tracks.iter_mut().find(|t| &t.id == track_id)
                .ok_or_else(|| EditError::TrackNotFound(track_id.clone()))?;
            track.clips.push(clip);
            Ok(())
        })?;
        Ok(id)
    }

    /// Remove a clip from whichever track holds it. Returns `false` if absent.
    pub fn remove_clip(&mut self, id: &ClipId) -> bool {
        let Some((ti, ci)) = self.find_clip(id) else {
            return false;
        };
        let mut next = Vec::clone(&self.tracks);
        next[ti].clips.remove(ci);
        self.publish(next);
        self.prune_selection();
        log::debug!("[timeline] remove clip {id}");
        true
    }

    /// Apply one edit to a clip. `Ok(false)` when nothing changed: an unknown
    /// clip id, or a keyframe edit naming a keyframe the clip does not have.
    /// An invalid edit leaves the clip untouched and returns the error.
    pub fn update_clip(&mut self, id: &ClipId, update: ClipUpdate) -> EditResult<bool> {
        let Some((ti, ci)) = self.find_clip(id) else {
            return Ok(false);
        };
        log::debug!("[timeline] update clip {id}: {update:?}");
        let mut next = Vec::clone(&self.tracks);
        let changed = apply_update(&mut next[ti].clips[ci], update)
            .inspect_err(|e| log::warn!("[timeline] update clip {id} rejected: {e}"))?;
        if changed {
            self.publish(next);
        }
        Ok(changed)
    }

    /// Relocate a clip to `track_id` at `new_start` (clamped to >= 0).
    ///
    /// The destination is resolved before anything is detached, so a bad
    /// track id leaves the clip exactly where it was.
    pub fn move_clip(&mut self, id: &ClipId, track_id: &TrackId, new_start: f64) -> EditResult<()> {
        let Some(dest) = self.tracks.iter().position(|t| &t.id == track_id) else {
            log::warn!("[timeline] move_clip: track {track_id} not found");
            return Err(EditError::TrackNotFound(track_id.clone()));
        };
        let Some((src, ci)) = self.find_clip(id) else {
            return Err(EditError::ClipNotFound(id.clone()));
        };
        let start = if new_start.is_nan() { 0.0 } else { new_start.max(0.0) };
        check_timing(start, self.tracks[src].clips[ci].duration, 0.0)?;

        log::debug!("[timeline] move clip {id} → {track_id} at {start:.3}s");
        self.edit(|tracks| {
            if src == dest {
                tracks[src].clips[ci].start = start;
            } else {
                let mut clip = tracks[src].clips.remove(ci);
                clip.track_id = track_id.clone();
                clip.start    = start;
                tracks[dest].clips.push(clip);
            }
            Ok(())
        })
    }

    /// Cut a clip in two at timeline time `at`.
    ///
    /// The left fragment keeps the original id and position in the track;
    /// the right fragment gets a new id, is appended to the same track and
    /// starts `at - start` further into the source. Keyframes are copied into
    /// the right fragment with their times unchanged.
    ///
    /// `at` must lie strictly inside the clip; otherwise `InvalidRange` and
    /// nothing changes.
    pub fn split_clip(&mut self, id: &ClipId, at: f64) -> EditResult<ClipId> {
        let (ti, ci) = self.find_clip(id).ok_or_else(|| EditError::ClipNotFound(id.clone()))?;
        let clip = &self.tracks[ti].clips[ci];
        if !clip.contains_strictly(at) {
            log::warn!("[timeline] split of {id} at {at:.3}s is outside {:.3}..{:.3}", clip.start, clip.end());
            return Err(EditError::InvalidRange {
                clip_id: id.clone(),
                time:    at,
                start:   clip.start,
                end:     clip.end(),
            });
        }

        let split_offset = at - clip.start;
        let mut right = clip.clone();
        right.id            = ClipId::new();
        right.start         = at;
        right.duration      = clip.duration - split_offset;
        right.source_offset = clip.source_offset + split_offset;
        // Float noise can push a near-boundary fragment to zero.
        check_timing(right.start, right.duration, right.source_offset)?;
        check_timing(clip.start, split_offset, clip.source_offset)?;

        let right_id = right.id.clone();
        log::debug!("[timeline] split clip {id} at {at:.3}s → right {right_id}");
        self.edit(|tracks| {
            tracks[ti].clips[ci].duration = split_offset;
            tracks[ti].clips.push(right);
            Ok(())
        })?;
        Ok(right_id)
    }

    // ── Selection ─────────────────────────────────────────────────────────────

    /// Select a clip. `exclusive` replaces the selection; otherwise the id is
    /// added if not already present. Unknown ids are ignored (`false`).
    pub fn select_clip(&mut self, id: &ClipId, exclusive: bool) -> bool {
        if self.find_clip(id).is_none() {
            return false;
        }
        if exclusive {
            self.selection.clear();
        }
        if !self.selection.contains(id) {
            self.selection.push(id.clone());
        }
        true
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    /// Remove every selected clip. Returns how many were removed.
    pub fn delete_selected(&mut self) -> usize {
        let ids = std::mem::take(&mut self.selection);
        ids.iter().filter(|id| self.remove_clip(id)).count()
    }

    /// Split every selected clip the playhead is strictly inside. Clips the
    /// playhead does not cut are skipped. Returns the new right-hand ids.
    pub fn split_selected_at_playhead(&mut self) -> Vec<ClipId> {
        let at  = self.current_time;
        let ids: Vec<ClipId> = self.selected_clips().into_iter()
            .filter(|c| c.contains_strictly(at))
            .map(|c| c.id.clone())
            .collect();
        let mut rights = Vec::with_capacity(ids.len());
        for id in &ids {
            if let Ok(right) = self.split_clip(id, at) {
                rights.push(right);
            }
        }
        rights
    }

    // ── Transport and view ────────────────────────────────────────────────────

    /// Move the playhead. Clamped to >= 0 only; the playback clock handles the
    /// upper bound.
    pub fn seek(&mut self, t: f64) {
        self.current_time = if t.is_nan() { 0.0 } else { t.max(0.0) };
    }

    pub fn set_playing(&mut self, playing: bool) {
        if self.is_playing != playing {
            log::debug!("[timeline] playing = {playing}");
        }
        self.is_playing = playing;
    }

    pub fn set_zoom(&mut self, zoom: f64) {
        self.zoom = zoom.max(self.settings.min_zoom);
    }

    pub fn set_duration(&mut self, duration: f64) {
        self.duration = duration.max(0.0);
        self.dirty    = true;
    }

    // ── Project lifecycle ─────────────────────────────────────────────────────

    /// Back to a fresh two-track project.
    pub fn reset_project(&mut self) {
        self.tracks         = Arc::new(default_tracks());
        self.duration       = self.settings.default_timeline_duration;
        self.selection.clear();
        self.current_time   = 0.0;
        self.is_playing     = false;
        self.dirty          = false;
        self.project_loaded = true;
        log::info!("[timeline] new project");
    }

    /// Swap in a whole loaded project. Callers validate `tracks` first.
    pub(crate) fn replace_project(&mut self, tracks: Vec<Track>, duration: f64) {
        self.tracks         = Arc::new(tracks);
        self.duration       = duration.max(0.0);
        self.selection.clear();
        self.current_time   = 0.0;
        self.is_playing     = false;
        self.dirty          = false;
        self.project_loaded = true;
    }

    pub fn mark_saved(&mut self) {
        self.dirty = false;
    }
}

fn default_tracks() -> Vec<Track> {
    vec![
        Track::new(TrackKind::Video, "Video Track 1"),
        Track::new(TrackKind::Audio, "Audio Track 1"),
    ]
}

/// Returns whether the clip changed.
fn apply_update(clip: &mut Clip, update: ClipUpdate) -> EditResult<bool> {
    match update {
        ClipUpdate::Timing { start, duration, source_offset } => {
            let start         = start.unwrap_or(clip.start);
            let duration      = duration.unwrap_or(clip.duration);
            let source_offset = source_offset.unwrap_or(clip.source_offset);
            check_timing(start, duration, source_offset)?;
            clip.start         = start;
            clip.duration      = duration;
            clip.source_offset = source_offset;
        }
        ClipUpdate::Rename(name)  => clip.name   = name,
        ClipUpdate::Source(src)   => clip.source = src,
        ClipUpdate::SetBaseValue { key, value } => {
            clip.properties.get_mut(key).base_value = value;
        }
        ClipUpdate::AddKeyframe { key, time, value, easing } => {
            if !(0.0..=clip.duration).contains(&time) {
                return Err(EditError::InvalidRange {
                    clip_id: clip.id.clone(),
                    time,
                    start:   0.0,
                    end:     clip.duration,
                });
            }
            clip.properties.get_mut(key).push_keyframe(time, value, easing);
        }
        ClipUpdate::RemoveKeyframe { key, keyframe_id } => {
            return Ok(clip.properties.get_mut(key).remove_keyframe(&keyframe_id));
        }
        ClipUpdate::SetKeyframeEasing { key, keyframe_id, easing } => {
            let Some(k) = clip.properties.get_mut(key).keyframe_mut(&keyframe_id) else {
                return Ok(false);
            };
            k.easing = easing;
        }
        ClipUpdate::ReplaceProperty { key, property } => {
            *clip.properties.get_mut(key) = property;
        }
    }
    Ok(true)
}
