// crates/winedit-app/src/helpers/log.rs
//
// Logger setup for the `winedit` binary.
//
// Library crates only use the `log` facade; this is the one place a backend
// is installed.
//
//   verbosity 0 → warn, 1 → info, 2 → debug, 3+ → trace
//
// Console mode honours RUST_LOG over the verbosity default. File mode
// writes to the given path, or `winedit.log` in the OS temp directory.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::LevelFilter;

pub fn level_for(verbosity: u8) -> LevelFilter {
    match verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

pub fn default_log_path() -> PathBuf {
    std::env::temp_dir().join("winedit.log")
}

/// Install the global logger. `log_file`: `None` = console,
/// `Some(None)` = default file, `Some(Some(p))` = `p`.
pub fn init_logging(verbosity: u8, log_file: Option<Option<&Path>>) -> Result<()> {
    let level = level_for(verbosity);

    if let Some(path) = log_file {
        let path = path.map(Path::to_path_buf).unwrap_or_else(default_log_path);
        let file = std::fs::File::create(&path)
            .with_context(|| format!("creating log file {}", path.display()))?;

        env_logger::Builder::new()
            .filter_level(level)
            .format_timestamp_millis()
            .target(env_logger::Target::Pipe(Box::new(file)))
            .try_init()
            .context("logger already initialised")?;

        log::info!("[app] logging to {} (level: {level:?})", path.display());
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level.as_str()))
            .format_timestamp_millis()
            .try_init()
            .context("logger already initialised")?;
    }
    Ok(())
}
