// crates/winedit-core/src/error.rs
//
// Error taxonomy for every fallible engine operation.
//
//   NotFound      → TrackNotFound / NoTrackOfKind / ClipNotFound / AssetNotFound
//   InvalidRange  → InvalidRange / InvalidTiming
//   ParseFailure  → Parse / Io
//   ExportFailure → Export
//
// Deletes against unknown ids are not errors; they return `false`.

use thiserror::Error;

use crate::model::{AssetId, ClipId, TrackId, TrackKind};

#[derive(Debug, Error)]
pub enum EditError {
    #[error("track {0} not found")]
    TrackNotFound(TrackId),

    /// Placement needs a track of this kind and the timeline has none.
    #[error("no {} track to place on", .0.label().to_lowercase())]
    NoTrackOfKind(TrackKind),

    #[error("clip {0} not found")]
    ClipNotFound(ClipId),

    #[error("asset {0} not found in the media bin")]
    AssetNotFound(AssetId),

    /// A time argument fell outside the clip's open interval `(start, end)`.
    #[error("time {time:.3}s is outside clip {clip_id} ({start:.3}s..{end:.3}s)")]
    InvalidRange {
        clip_id: ClipId,
        time:    f64,
        start:   f64,
        end:     f64,
    },

    /// A timing edit would break `start >= 0`, `duration > 0` or `offset >= 0`.
    #[error("invalid timing: {0}")]
    InvalidTiming(String),

    #[error("project file rejected: {0}")]
    Parse(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("export failed: {0}")]
    Export(String),
}

impl From<serde_json::Error> for EditError {
    fn from(e: serde_json::Error) -> Self {
        EditError::Parse(e.to_string())
    }
}

pub type EditResult<T> = Result<T, EditError>;
