// crates/winedit-app/src/lib.rs
//
// Headless app shell: the single controller that owns the timeline store
// and turns EditorCommands into engine calls. The `winedit` binary is a thin
// CLI over this.

pub mod app;
pub mod helpers;
pub mod player;

pub use app::{EditorApp, ExportStatus};
