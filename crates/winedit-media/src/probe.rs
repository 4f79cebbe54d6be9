// crates/winedit-media/src/probe.rs
//
// Media metadata probing. The worker only sees the `MetadataProbe` trait;
// the default implementation shells out to ffprobe.

use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{bail, Context, Result};

use crate::paths::ffprobe_exe;

pub trait MetadataProbe: Send + Sync {
    /// Duration of the media at `path`, in seconds.
    fn duration(&self, path: &Path) -> Result<f64>;
}

/// `ffprobe -show_entries format=duration`.
pub struct FfprobeCli {
    exe: PathBuf,
}

impl FfprobeCli {
    pub fn new(exe: PathBuf) -> Self {
        Self { exe }
    }

    /// Use `WINEDIT_FFPROBE`, falling back to `ffprobe` on PATH.
    pub fn from_env() -> Self {
        Self::new(ffprobe_exe())
    }
}

impl Default for FfprobeCli {
    fn default() -> Self {
        Self::from_env()
    }
}

impl MetadataProbe for FfprobeCli {
    fn duration(&self, path: &Path) -> Result<f64> {
        let out = Command::new(&self.exe)
            .args(["-v", "error", "-show_entries", "format=duration", "-of", "default=noprint_wrappers=1:nokey=1"])
            .arg(path)
            .output()
            .with_context(|| format!("spawning {}", self.exe.display()))?;

        if !out.status.success() {
            let stderr = String::from_utf8_lossy(&out.stderr);
            bail!("ffprobe failed: {}", stderr.lines().last().unwrap_or("unknown error"));
        }
        let seconds = parse_duration(&String::from_utf8_lossy(&out.stdout))?;
        log::debug!("[media] duration {seconds:.2}s ← {}", path.display());
        Ok(seconds)
    }
}

/// Parse ffprobe's bare `format=duration` output. Images and some streams
/// report `N/A`, which is an error here; callers keep the placeholder.
pub fn parse_duration(stdout: &str) -> Result<f64> {
    let line = stdout.lines().map(str::trim).find(|l| !l.is_empty())
        .context("ffprobe printed no duration")?;
    let seconds: f64 = line.parse()
        .with_context(|| format!("unparseable duration {line:?}"))?;
    if !seconds.is_finite() || seconds <= 0.0 {
        bail!("duration unknown ({seconds})");
    }
    Ok(seconds)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_seconds() {
        assert_eq!(parse_duration("12.480000\n").unwrap(), 12.48);
        assert_eq!(parse_duration("\n  3\n").unwrap(), 3.0);
    }

    #[test]
    fn rejects_missing_or_unknown_duration() {
        assert!(parse_duration("").is_err());
        assert!(parse_duration("N/A\n").is_err());
        assert!(parse_duration("0.000000").is_err());
    }

    #[test]
    fn missing_executable_is_an_error() {
        let probe = FfprobeCli::new(PathBuf::from("/nonexistent/winedit-ffprobe"));
        assert!(probe.duration(Path::new("a.mp4")).is_err());
    }
}
