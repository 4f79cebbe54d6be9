// crates/winedit-core/src/settings.rs
//
// Editor-wide tunables. Every field has a serde default so a settings file
// only needs to name what it overrides, and files written by older builds
// keep loading after fields are added.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{EditError, EditResult};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorSettings {
    /// Duration given to new video/image/audio clips when none is supplied.
    pub default_media_duration:    f64,
    /// Duration given to new text clips when none is supplied.
    pub default_text_duration:     f64,
    /// Timeline length for a fresh project, and for files that omit it.
    pub default_timeline_duration: f64,
    pub default_zoom:              f64,
    pub min_zoom:                  f64,
    /// Seconds a renderer's video element may drift before it is re-seeked.
    pub video_drift_tolerance:     f64,
    pub audio_drift_tolerance:     f64,
    /// Written into the `version` field of saved project files.
    pub project_version:           String,
    pub export_fps:                u32,
    pub export_width:              u32,
    pub export_height:             u32,
    /// Export progress is reported every this many output frames.
    pub progress_interval_frames:  u64,
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            default_media_duration:    10.0,
            default_text_duration:     5.0,
            default_timeline_duration: 300.0,
            default_zoom:              50.0,
            min_zoom:                  1.0,
            video_drift_tolerance:     0.1,
            audio_drift_tolerance:     0.2,
            project_version:           "1.0".into(),
            export_fps:                30,
            export_width:              1280,
            export_height:             720,
            progress_interval_frames:  15,
        }
    }
}

impl EditorSettings {
    /// Read settings from a JSON file. A missing file is not an error and
    /// yields the defaults; an unreadable or malformed one is.
    pub fn load(path: &Path) -> EditResult<Self> {
        let text = match std::fs::read_to_string(path) {
            Ok(t) => t,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::debug!("[settings] {} not found, using defaults", path.display());
                return Ok(Self::default());
            }
            Err(e) => return Err(EditError::Io(e)),
        };
        let settings: Self = serde_json::from_str(&text)
            .map_err(|e| EditError::Parse(format!("{}: {e}", path.display())))?;
        log::info!("[settings] loaded {}", path.display());
        Ok(settings)
    }

    /// Default settings location: `<config dir>/settings.json`.
    pub fn default_path() -> Option<PathBuf> {
        config_dir().map(|d| d.join("settings.json"))
    }
}

/// Per-user configuration directory for WinEdit.
///
/// Windows: `%APPDATA%\WinEdit`. Elsewhere: `$XDG_CONFIG_HOME/winedit`,
/// falling back to `~/.config/winedit`.
pub fn config_dir() -> Option<PathBuf> {
    if cfg!(windows) {
        return std::env::var_os("APPDATA").map(|p| PathBuf::from(p).join("WinEdit"));
    }
    if let Some(xdg) = std::env::var_os("XDG_CONFIG_HOME").filter(|v| !v.is_empty()) {
        return Some(PathBuf::from(xdg).join("winedit"));
    }
    std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config").join("winedit"))
}
