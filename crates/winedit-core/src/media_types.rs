// crates/winedit-core/src/media_types.rs
//
// Types that flow across the channel between winedit-media and the app shell.
// No threads, no processes, just plain data.

use std::path::PathBuf;
use uuid::Uuid;

use crate::model::AssetId;

/// Sent by the export thread when the user cancels. The app shell treats it
/// as an aborted state rather than a failure.
pub const CANCELLED: &str = "cancelled";

/// Results sent from the MediaWorker background threads to the app shell.
#[derive(Clone, Debug, PartialEq)]
pub enum MediaResult {
    Duration       { id: AssetId, seconds: f64 },
    Error          { id: AssetId, msg: String },
    ExportProgress { job_id: Uuid, done: u64, total: u64 },
    ExportDone     { job_id: Uuid, path: PathBuf },
    ExportError    { job_id: Uuid, msg: String },
}

impl MediaResult {
    /// The export job this result belongs to, if any.
    pub fn job_id(&self) -> Option<Uuid> {
        match self {
            MediaResult::ExportProgress { job_id, .. }
            | MediaResult::ExportDone   { job_id, .. }
            | MediaResult::ExportError  { job_id, .. } => Some(*job_id),
            MediaResult::Duration { .. } | MediaResult::Error { .. } => None,
        }
    }
}
