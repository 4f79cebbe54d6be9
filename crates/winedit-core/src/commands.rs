// crates/winedit-core/src/commands.rs
//
// Every user action in WinEdit is expressed as an EditorCommand.
// Front ends emit these; EditorApp::process_command applies them.
// Adding a new feature = add a variant here + one match arm in app.rs.

use std::path::PathBuf;
use uuid::Uuid;

use crate::model::{AssetId, ClipDraft, ClipId, TrackId, TrackKind};
use crate::timeline::ClipUpdate;

#[derive(Debug, Clone)]
pub enum EditorCommand {
    // ── Playback ─────────────────────────────────────────────────────────────
    Play,
    Pause,
    TogglePlay,
    Seek(f64),
    SeekToStart,
    SeekToEnd,

    // ── View ─────────────────────────────────────────────────────────────────
    SetZoom(f64),
    SetDuration(f64),

    // ── Tracks ───────────────────────────────────────────────────────────────
    AddTrack(TrackKind),
    RemoveTrack(TrackId),
    SetTrackMuted  { id: TrackId, muted: bool },
    SetTrackHidden { id: TrackId, hidden: bool },
    SetTrackLocked { id: TrackId, locked: bool },
    RenameTrack    { id: TrackId, name: String },

    // ── Clips ────────────────────────────────────────────────────────────────
    AddClip    { track_id: TrackId, draft: ClipDraft },
    RemoveClip(ClipId),
    UpdateClip { id: ClipId, update: ClipUpdate },
    MoveClip   { id: ClipId, track_id: TrackId, start: f64 },
    SplitClip  { id: ClipId, at: f64 },
    /// Edit → Split: cut every selected clip at the playhead.
    SplitSelectedAtPlayhead,
    /// Edit → Delete: remove every selected clip.
    DeleteSelected,

    // ── Selection ────────────────────────────────────────────────────────────
    SelectClip { id: ClipId, exclusive: bool },
    ClearSelection,

    // ── Media bin ────────────────────────────────────────────────────────────
    /// Add a file to the bin and queue a metadata probe for it.
    ImportFile(PathBuf),
    AddTextAsset(String),
    PlaceAsset(AssetId),

    // ── Project ──────────────────────────────────────────────────────────────
    NewProject,
    OpenProject(PathBuf),
    SaveProject(PathBuf),

    // ── Export ───────────────────────────────────────────────────────────────
    /// Build the export plan from the current timeline and hand it to the
    /// media worker. Settings supply size and frame rate.
    StartExport { output: PathBuf },
    /// Ask the running export job to stop. It discards its partial output
    /// and reports `ExportError { msg: "cancelled" }`.
    CancelExport(Uuid),
    /// Forget a finished / failed export once the user has seen it.
    ClearExportStatus,
}
