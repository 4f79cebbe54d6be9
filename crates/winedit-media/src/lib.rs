// crates/winedit-media/src/lib.rs
//
// Background media work for WinEdit: metadata probing and export.
// Communicates with the app shell via channels only; the engine is never
// locked while a job runs.
//
// To add a new media capability:
//   1. Create a new module file here
//   2. Add `pub mod mymodule;` below
//   3. Call it from worker.rs (a new MediaWorker method)

pub mod export;
pub mod paths;
pub mod probe;
pub mod worker;

// Re-export the main public API so app imports stay short.
pub use worker::MediaWorker;
pub use winedit_core::media_types::MediaResult;

pub use export::{Encoder, ExportSpec, FfmpegCli};
pub use probe::{FfprobeCli, MetadataProbe};
