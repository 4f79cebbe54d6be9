// crates/winedit-core/src/project.rs
//
// Project file (.wne) load/save.
//
// Format: pretty JSON, `{ "version": "1.0", "duration": 300, "tracks": [...] }`
// with tracks and clips in the camelCase shape defined by the model types.
//
// Loading is all-or-nothing: the file is parsed and validated in full before
// the store is touched, so a rejected file leaves the open project as it was.

use std::collections::HashSet;
use std::io::Write;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{EditError, EditResult};
use crate::model::Track;
use crate::timeline::TimelineStore;

pub const PROJECT_EXTENSION: &str = "wne";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProjectFile {
    pub version:  String,
    /// Missing or zero falls back to the default timeline length on load.
    #[serde(default)]
    pub duration: f64,
    pub tracks:   Vec<Track>,
}

impl ProjectFile {
    pub fn from_json(text: &str) -> EditResult<Self> {
        let file: Self = serde_json::from_str(text)?;
        file.validate()?;
        Ok(file)
    }

    pub fn to_json(&self) -> EditResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check every invariant the store relies on. Any violation rejects the
    /// whole file.
    pub fn validate(&self) -> EditResult<()> {
        if !self.duration.is_finite() || self.duration < 0.0 {
            return Err(EditError::Parse(format!("invalid duration {}", self.duration)));
        }
        let mut track_ids = HashSet::new();
        let mut clip_ids  = HashSet::new();
        for track in &self.tracks {
            if !track_ids.insert(track.id.as_str()) {
                return Err(EditError::Parse(format!("duplicate track id {}", track.id)));
            }
            for clip in &track.clips {
                if !clip_ids.insert(clip.id.as_str()) {
                    return Err(EditError::Parse(format!("duplicate clip id {}", clip.id)));
                }
                clip.check_timing()
                    .map_err(|e| EditError::Parse(format!("clip {}: {e}", clip.id)))?;
            }
        }
        Ok(())
    }
}

impl TimelineStore {
    /// Capture the current edit as a project file.
    pub fn to_project_file(&self) -> ProjectFile {
        ProjectFile {
            version:  self.settings().project_version.clone(),
            duration: self.duration(),
            tracks:   self.tracks().to_vec(),
        }
    }

    /// Replace the open project with `file`. Playhead, play state and
    /// selection are reset.
    pub fn apply_project_file(&mut self, file: ProjectFile) -> EditResult<()> {
        file.validate()?;
        let duration = if file.duration > 0.0 {
            file.duration
        } else {
            self.settings().default_timeline_duration
        };
        let mut tracks = file.tracks;
        // A clip's owner is the track that lists it.
        for track in &mut tracks {
            for clip in &mut track.clips {
                clip.track_id = track.id.clone();
            }
        }
        self.replace_project(tracks, duration);
        Ok(())
    }

    pub fn load_project(&mut self, path: &Path) -> EditResult<()> {
        let text = std::fs::read_to_string(path)?;
        let file = ProjectFile::from_json(&text).inspect_err(|e| {
            log::warn!("[project] rejected {}: {e}", path.display());
        })?;
        let (tracks, version) = (file.tracks.len(), file.version.clone());
        self.apply_project_file(file)?;
        log::info!(
            "[project] loaded {} (v{version}, {tracks} tracks, {} clips)",
            path.display(), self.clip_count(),
        );
        Ok(())
    }

    /// Write the project to `path` through a temp file in the same directory,
    /// so an interrupted save never leaves a truncated project behind.
    pub fn save_project(&mut self, path: &Path) -> EditResult<()> {
        let json = self.to_project_file().to_json()?;
        let dir  = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(json.as_bytes())?;
        tmp.flush()?;
        tmp.persist(path).map_err(|e| EditError::Io(e.error))?;
        self.mark_saved();
        log::info!("[project] saved {}", path.display());
        Ok(())
    }
}
