// crates/winedit-app/src/helpers/mod.rs
//
// Shell-only helpers. Nothing here is reachable from the engine crates.

pub mod log;
