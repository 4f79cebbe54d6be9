// crates/winedit-core/src/helpers/mod.rs
//
// Small pure helpers shared by the app shell and the CLI.

pub mod time;
