// crates/winedit-media/src/paths.rs
//
// Locations of the external ffmpeg / ffprobe executables.
// An environment variable wins; otherwise the bare name is resolved on PATH.

use std::path::PathBuf;

pub const FFMPEG_ENV:  &str = "WINEDIT_FFMPEG";
pub const FFPROBE_ENV: &str = "WINEDIT_FFPROBE";

pub fn ffmpeg_exe() -> PathBuf {
    exe_from_env(FFMPEG_ENV, "ffmpeg")
}

pub fn ffprobe_exe() -> PathBuf {
    exe_from_env(FFPROBE_ENV, "ffprobe")
}

fn exe_from_env(var: &str, fallback: &str) -> PathBuf {
    std::env::var_os(var)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(fallback))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_variable_falls_back_to_bare_name() {
        assert_eq!(exe_from_env("WINEDIT_TEST_SURELY_UNSET_VAR", "ffmpeg"), PathBuf::from("ffmpeg"));
    }
}
