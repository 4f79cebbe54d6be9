// crates/winedit-core/src/media_bin.rs
//
// The media bin: templates for clips that have not been placed yet.
//
// The pool is independent of the timeline. Placing an asset copies its
// fields into a brand-new clip, so later edits on either side (a probed
// duration arriving, a clip being trimmed) never reach the other.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{EditError, EditResult};
use crate::model::{AssetId, ClipDraft, ClipId, ClipKind};
use crate::settings::EditorSettings;
use crate::timeline::TimelineStore;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    pub id:       AssetId,
    pub name:     String,
    pub kind:     ClipKind,
    /// Empty for text assets.
    pub src:      String,
    pub duration: f64,
    /// `false` until a metadata probe has reported a real duration.
    #[serde(default)]
    pub probed:   bool,
}

#[derive(Clone, Debug, Default)]
pub struct AssetPool {
    assets: Vec<Asset>,
}

impl AssetPool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn assets(&self) -> &[Asset] {
        &self.assets
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    pub fn get(&self, id: &AssetId) -> Option<&Asset> {
        self.assets.iter().find(|a| &a.id == id)
    }

    pub fn clear(&mut self) {
        self.assets.clear();
    }

    /// Add a media file. The kind comes from the extension and the duration
    /// is a placeholder until a probe reports back. Importing the same path
    /// twice returns the existing asset.
    pub fn import_path(&mut self, path: &Path, settings: &EditorSettings) -> AssetId {
        let src = path.to_string_lossy().into_owned();
        if let Some(existing) = self.assets.iter().find(|a| a.src == src) {
            return existing.id.clone();
        }
        let kind = path.extension()
            .and_then(|e| e.to_str())
            .map(ClipKind::from_extension)
            .unwrap_or(ClipKind::Video);
        let name = path.file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| src.clone());

        let asset = Asset {
            id:       AssetId::new(),
            name,
            kind,
            src,
            duration: settings.default_media_duration,
            probed:   false,
        };
        log::debug!("[media] bin import {} as {:?} ({})", asset.src, asset.kind, asset.id);
        let id = asset.id.clone();
        self.assets.push(asset);
        id
    }

    pub fn add_text(&mut self, name: impl Into<String>, settings: &EditorSettings) -> AssetId {
        let asset = Asset {
            id:       AssetId::new(),
            name:     name.into(),
            kind:     ClipKind::Text,
            src:      String::new(),
            duration: settings.default_text_duration,
            probed:   true,
        };
        let id = asset.id.clone();
        self.assets.push(asset);
        id
    }

    /// Record a probed duration. Clips already placed from this asset are
    /// value copies and are left alone. Non-positive durations are ignored.
    pub fn set_duration(&mut self, id: &AssetId, seconds: f64) -> bool {
        if !seconds.is_finite() || seconds <= 0.0 {
            return false;
        }
        match self.assets.iter_mut().find(|a| &a.id == id) {
            Some(asset) => {
                asset.duration = seconds;
                asset.probed   = true;
                true
            }
            None => false,
        }
    }

    /// Copy an asset onto the first track of the matching kind at time 0.
    pub fn place(&self, id: &AssetId, store: &mut TimelineStore) -> EditResult<ClipId> {
        let asset = self.get(id).ok_or_else(|| EditError::AssetNotFound(id.clone()))?;
        let track_kind = asset.kind.track_kind();
        let track = store.first_track_of(track_kind)
            .map(|t| t.id.clone())
            .ok_or(EditError::NoTrackOfKind(track_kind))?;
        store.add_clip(&track, asset.to_draft())
    }
}

impl Asset {
    pub fn to_draft(&self) -> ClipDraft {
        ClipDraft::new(self.kind)
            .named(self.name.clone())
            .source(self.src.clone())
            .at(0.0)
            .lasting(self.duration)
    }
}
