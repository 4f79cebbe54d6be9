// crates/winedit-app/src/app.rs
//
// EditorApp: owns the TimelineStore, the playback clock, the media bin and
// the media worker. Every mutation arrives as an EditorCommand and goes
// through `process_command`; background results come back through
// `poll_media`.

use std::path::PathBuf;
use std::time::Instant;

use uuid::Uuid;

use winedit_core::commands::EditorCommand;
use winedit_core::media_bin::AssetPool;
use winedit_core::media_types::{MediaResult, CANCELLED};
use winedit_core::playback::PlaybackClock;
use winedit_core::render::export_plan;
use winedit_core::{EditError, EditResult, EditorSettings, TimelineStore};
use winedit_media::{ExportSpec, MediaWorker};

/// What the user last saw of the export job.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ExportStatus {
    pub job:       Option<Uuid>,
    /// `(frames done, frames total)`.
    pub progress:  Option<(u64, u64)>,
    pub done:      Option<PathBuf>,
    pub error:     Option<String>,
    pub cancelled: bool,
}

impl ExportStatus {
    pub fn is_running(&self) -> bool {
        self.job.is_some() && self.done.is_none() && self.error.is_none() && !self.cancelled
    }

    /// Progress as a fraction in `[0, 1]`.
    pub fn fraction(&self) -> f64 {
        match self.progress {
            Some((done, total)) if total > 0 => (done as f64 / total as f64).min(1.0),
            _ => 0.0,
        }
    }
}

pub struct EditorApp {
    pub store:    TimelineStore,
    pub clock:    PlaybackClock,
    pub bin:      AssetPool,
    pub media:    MediaWorker,
    pub export:   ExportStatus,
    settings:     EditorSettings,
}

impl EditorApp {
    pub fn new(settings: EditorSettings) -> Self {
        Self::with_worker(settings, MediaWorker::new())
    }

    pub fn with_worker(settings: EditorSettings, media: MediaWorker) -> Self {
        Self {
            store:    TimelineStore::new(settings.clone()),
            clock:    PlaybackClock::new(),
            bin:      AssetPool::new(),
            media,
            export:   ExportStatus::default(),
            settings,
        }
    }

    pub fn settings(&self) -> &EditorSettings {
        &self.settings
    }

    /// Apply one command. Rejected user input is logged and returned; unknown
    /// ids on idempotent commands are not errors.
    pub fn process_command(&mut self, cmd: EditorCommand) -> EditResult<()> {
        let result = self.apply(cmd);
        if let Err(e) = &result {
            log::warn!("[app] {e}");
        }
        result
    }

    fn apply(&mut self, cmd: EditorCommand) -> EditResult<()> {
        match cmd {
            // ── Playback ─────────────────────────────────────────────────────
            EditorCommand::Play => self.clock.play(&mut self.store, Instant::now()),
            EditorCommand::Pause => self.clock.pause(&mut self.store),
            EditorCommand::TogglePlay => self.clock.toggle(&mut self.store, Instant::now()),
            EditorCommand::Seek(t) => self.clock.seek(&mut self.store, t),
            EditorCommand::SeekToStart => self.clock.seek(&mut self.store, 0.0),
            EditorCommand::SeekToEnd => {
                let end = self.store.duration();
                self.clock.seek(&mut self.store, end);
            }

            // ── View ─────────────────────────────────────────────────────────
            EditorCommand::SetZoom(z) => self.store.set_zoom(z),
            EditorCommand::SetDuration(d) => self.store.set_duration(d),

            // ── Tracks ───────────────────────────────────────────────────────
            EditorCommand::AddTrack(kind) => {
                self.store.add_track(kind);
            }
            EditorCommand::RemoveTrack(id) => {
                self.store.remove_track(&id);
            }
            EditorCommand::SetTrackMuted { id, muted } => {
                self.store.set_track_muted(&id, muted);
            }
            EditorCommand::SetTrackHidden { id, hidden } => {
                self.store.set_track_hidden(&id, hidden);
            }
            EditorCommand::SetTrackLocked { id, locked } => {
                self.store.set_track_locked(&id, locked);
            }
            EditorCommand::RenameTrack { id, name } => {
                self.store.rename_track(&id, name);
            }

            // ── Clips ────────────────────────────────────────────────────────
            EditorCommand::AddClip { track_id, draft } => {
                self.store.add_clip(&track_id, draft)?;
            }
            EditorCommand::RemoveClip(id) => {
                self.store.remove_clip(&id);
            }
            EditorCommand::UpdateClip { id, update } => {
                self.store.update_clip(&id, update)?;
            }
            EditorCommand::MoveClip { id, track_id, start } => {
                self.store.move_clip(&id, &track_id, start)?;
            }
            EditorCommand::SplitClip { id, at } => {
                self.store.split_clip(&id, at)?;
            }
            EditorCommand::SplitSelectedAtPlayhead => {
                let cut = self.store.split_selected_at_playhead();
                log::debug!("[app] split {} selected clip(s) at playhead", cut.len());
            }
            EditorCommand::DeleteSelected => {
                let n = self.store.delete_selected();
                log::debug!("[app] deleted {n} selected clip(s)");
            }

            // ── Selection ────────────────────────────────────────────────────
            EditorCommand::SelectClip { id, exclusive } => {
                self.store.select_clip(&id, exclusive);
            }
            EditorCommand::ClearSelection => self.store.clear_selection(),

            // ── Media bin ────────────────────────────────────────────────────
            EditorCommand::ImportFile(path) => {
                let before = self.bin.len();
                let id = self.bin.import_path(&path, &self.settings);
                if self.bin.len() > before {
                    self.media.probe(id, path);
                }
            }
            EditorCommand::AddTextAsset(name) => {
                self.bin.add_text(name, &self.settings);
            }
            EditorCommand::PlaceAsset(id) => {
                self.bin.place(&id, &mut self.store)?;
            }

            // ── Project ──────────────────────────────────────────────────────
            EditorCommand::NewProject => {
                self.store.reset_project();
                self.bin.clear();
                self.clock = PlaybackClock::new();
            }
            EditorCommand::OpenProject(path) => {
                self.store.load_project(&path)?;
                self.clock = PlaybackClock::new();
            }
            EditorCommand::SaveProject(path) => {
                self.store.save_project(&path)?;
            }

            // ── Export ───────────────────────────────────────────────────────
            EditorCommand::StartExport { output } => {
                self.start_export(output)?;
            }
            EditorCommand::CancelExport(job_id) => self.media.cancel_export(job_id),
            EditorCommand::ClearExportStatus => self.export = ExportStatus::default(),
        }
        Ok(())
    }

    /// Build the plan from the current timeline and hand it to the worker.
    /// Returns the new job id.
    pub fn start_export(&mut self, output: PathBuf) -> EditResult<Uuid> {
        if self.export.is_running() {
            return Err(EditError::Export("an export is already running".into()));
        }
        let segments = export_plan(&self.store)?;
        let spec = ExportSpec {
            job_id:            Uuid::new_v4(),
            segments,
            duration:          self.store.duration(),
            width:             self.settings.export_width,
            height:            self.settings.export_height,
            fps:               self.settings.export_fps,
            output,
            progress_interval: self.settings.progress_interval_frames,
        };
        let job_id = spec.job_id;
        self.export = ExportStatus { job: Some(job_id), ..ExportStatus::default() };
        log::info!("[export] starting job {job_id} → {}", spec.output.display());
        self.media.start_export(spec);
        Ok(job_id)
    }

    /// Drain every pending background result without blocking.
    pub fn poll_media(&mut self) {
        while let Ok(result) = self.media.rx.try_recv() {
            self.ingest(result);
        }
    }

    pub fn ingest(&mut self, result: MediaResult) {
        match result {
            MediaResult::Duration { id, seconds } => {
                if self.bin.set_duration(&id, seconds) {
                    log::debug!("[media] asset {id} duration {seconds:.2}s");
                }
            }
            MediaResult::Error { id, msg } => {
                log::warn!("[media] asset {id}: {msg}");
            }

            // ── Export results ───────────────────────────────────────────────
            // All three arms guard on `export.job == Some(job_id)` so a stale
            // result from a previously cancelled job never clobbers a freshly
            // started one.
            MediaResult::ExportProgress { job_id, done, total } => {
                if self.export.job == Some(job_id) {
                    self.export.progress = Some((done, total));
                }
            }
            MediaResult::ExportDone { job_id, path } => {
                if self.export.job == Some(job_id) {
                    if let Some((_, total)) = self.export.progress {
                        self.export.progress = Some((total, total));
                    }
                    self.export.done = Some(path);
                }
            }
            MediaResult::ExportError { job_id, msg } => {
                if self.export.job == Some(job_id) {
                    if msg == CANCELLED {
                        self.export.cancelled = true;
                    } else {
                        self.export.error = Some(msg);
                    }
                }
            }
        }
    }
}

impl Drop for EditorApp {
    fn drop(&mut self) {
        self.media.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use std::sync::atomic::AtomicBool;
    use std::sync::Arc;

    use winedit_core::model::{ClipDraft, ClipKind, TrackKind};
    use winedit_core::timeline::ClipUpdate;
    use winedit_media::{Encoder, MetadataProbe};

    struct FixedProbe;

    impl MetadataProbe for FixedProbe {
        fn duration(&self, _: &Path) -> anyhow::Result<f64> {
            Ok(7.0)
        }
    }

    struct InstantEncoder;

    impl Encoder for InstantEncoder {
        fn encode(&self, _: &ExportSpec, dest: &Path, _: &AtomicBool, on_frame: &mut dyn FnMut(u64)) -> anyhow::Result<()> {
            on_frame(1);
            std::fs::write(dest, b"mp4")?;
            Ok(())
        }
    }

    fn app() -> EditorApp {
        let worker = MediaWorker::with_backends(Arc::new(FixedProbe), Arc::new(InstantEncoder));
        EditorApp::with_worker(EditorSettings::default(), worker)
    }

    fn drain_until<F: Fn(&EditorApp) -> bool>(app: &mut EditorApp, done: F) {
        let deadline = Instant::now() + std::time::Duration::from_secs(5);
        while !done(app) {
            assert!(Instant::now() < deadline, "timed out waiting for media results");
            if let Ok(r) = app.media.rx.recv_timeout(std::time::Duration::from_millis(50)) {
                app.ingest(r);
            }
        }
    }

    #[test]
    fn commands_drive_the_store() {
        let mut app = app();
        let v = app.store.tracks()[0].id.clone();
        app.process_command(EditorCommand::AddClip {
            track_id: v.clone(),
            draft:    ClipDraft::new(ClipKind::Video).lasting(6.0),
        }).unwrap();
        let id = app.store.tracks()[0].clips[0].id.clone();

        app.process_command(EditorCommand::SelectClip { id: id.clone(), exclusive: true }).unwrap();
        app.process_command(EditorCommand::Seek(2.0)).unwrap();
        app.process_command(EditorCommand::SplitSelectedAtPlayhead).unwrap();
        assert_eq!(app.store.clip_count(), 2);

        app.process_command(EditorCommand::UpdateClip {
            id:     id.clone(),
            update: ClipUpdate::Rename("Opening".into()),
        }).unwrap();
        assert_eq!(app.store.clip(&id).unwrap().name, "Opening");

        app.process_command(EditorCommand::DeleteSelected).unwrap();
        assert_eq!(app.store.clip_count(), 1);
        assert!(app.store.clip(&id).is_none());
    }

    #[test]
    fn rejected_input_is_surfaced() {
        let mut app = app();
        let v = app.store.tracks()[0].id.clone();
        app.process_command(EditorCommand::AddClip { track_id: v, draft: ClipDraft::new(ClipKind::Video) }).unwrap();
        let id = app.store.tracks()[0].clips[0].id.clone();

        let err = app.process_command(EditorCommand::SplitClip { id: id.clone(), at: 50.0 });
        assert!(matches!(err, Err(EditError::InvalidRange { .. })));
        let err = app.process_command(EditorCommand::MoveClip {
            id, track_id: "missing".into(), start: 0.0,
        });
        assert!(matches!(err, Err(EditError::TrackNotFound(_))));
        // Unknown ids on deletes are quiet no-ops.
        assert!(app.process_command(EditorCommand::RemoveClip("nope".into())).is_ok());
    }

    #[test]
    fn import_probes_and_updates_the_bin() {
        let mut app = app();
        app.process_command(EditorCommand::ImportFile(PathBuf::from("shot.mp4"))).unwrap();
        let id = app.bin.assets()[0].id.clone();
        drain_until(&mut app, |a| a.bin.get(&id).is_some_and(|x| x.probed));
        assert_eq!(app.bin.get(&id).unwrap().duration, 7.0);

        app.process_command(EditorCommand::PlaceAsset(id)).unwrap();
        assert_eq!(app.store.tracks()[0].clips[0].duration, 7.0);
    }

    #[test]
    fn new_project_clears_bin_and_tracks() {
        let mut app = app();
        app.process_command(EditorCommand::AddTextAsset("Title".into())).unwrap();
        app.process_command(EditorCommand::AddTrack(TrackKind::Video)).unwrap();
        app.process_command(EditorCommand::NewProject).unwrap();
        assert!(app.bin.is_empty());
        assert_eq!(app.store.tracks().len(), 2);
    }

    #[test]
    fn open_failure_keeps_current_project() {
        let dir = tempfile::tempdir().unwrap();
        let bad = dir.path().join("bad.wne");
        std::fs::write(&bad, "{}").unwrap();

        let mut app = app();
        app.process_command(EditorCommand::AddTrack(TrackKind::Audio)).unwrap();
        let err = app.process_command(EditorCommand::OpenProject(bad));
        assert!(matches!(err, Err(EditError::Parse(_))));
        assert_eq!(app.store.tracks().len(), 3);
    }

    #[test]
    fn export_round_trip_through_worker() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("render.mp4");
        let mut app = app();
        app.store.set_duration(1.0);
        let v = app.store.tracks()[0].id.clone();
        app.store.add_clip(&v, ClipDraft::new(ClipKind::Video).source("a.mp4").lasting(1.0)).unwrap();

        app.process_command(EditorCommand::StartExport { output: out.clone() }).unwrap();
        assert!(app.export.is_running());
        drain_until(&mut app, |a| !a.export.is_running());

        assert_eq!(app.export.done.as_deref(), Some(out.as_path()));
        assert_eq!(app.export.fraction(), 1.0);
        assert!(out.exists());

        app.process_command(EditorCommand::ClearExportStatus).unwrap();
        assert_eq!(app.export, ExportStatus::default());
    }

    #[test]
    fn export_with_nothing_to_render_fails_fast() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app();
        let err = app.process_command(EditorCommand::StartExport { output: dir.path().join("x.mp4") });
        assert!(matches!(err, Err(EditError::Export(_))));
        assert!(app.export.job.is_none());
    }

    #[test]
    fn stale_export_results_are_ignored() {
        let mut app = app();
        let current = Uuid::new_v4();
        app.export.job = Some(current);
        app.ingest(MediaResult::ExportError { job_id: Uuid::new_v4(), msg: "old".into() });
        assert!(app.export.error.is_none());
        app.ingest(MediaResult::ExportError { job_id: current, msg: CANCELLED.into() });
        assert!(app.export.cancelled);
        assert!(app.export.error.is_none());
    }
}
