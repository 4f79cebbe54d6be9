// crates/winedit-media/src/worker.rs
//
// MediaWorker: owns the probe and export threads.
// All public API the app shell calls lives here.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use crossbeam_channel::{bounded, Receiver, Sender};
use parking_lot::{Condvar, Mutex};
use uuid::Uuid;

use winedit_core::media_types::MediaResult;
use winedit_core::AssetId;

use crate::export::{export_timeline, Encoder, ExportSpec, FfmpegCli};
use crate::probe::{FfprobeCli, MetadataProbe};

/// Maximum probe subprocesses running at once.
const PROBE_CONCURRENCY: u32 = 4;

pub struct MediaWorker {
    /// Shared result channel: probe results and export progress / outcome.
    pub rx:   Receiver<MediaResult>,
    tx:       Sender<MediaResult>,
    shutdown: Arc<AtomicBool>,
    /// Limits concurrent probe threads: (active_count, Condvar).
    probe_sem: Arc<(Mutex<u32>, Condvar)>,
    /// Per-job cancel flags, keyed by job_id so cancellation is targeted.
    /// Inserted by start_export, removed when the job thread exits.
    export_cancels: Arc<Mutex<HashMap<Uuid, Arc<AtomicBool>>>>,
    probe:    Arc<dyn MetadataProbe>,
    encoder:  Arc<dyn Encoder>,
}

impl Default for MediaWorker {
    fn default() -> Self {
        Self::new()
    }
}

impl MediaWorker {
    /// Worker backed by the ffprobe / ffmpeg executables.
    pub fn new() -> Self {
        Self::with_backends(Arc::new(FfprobeCli::from_env()), Arc::new(FfmpegCli::from_env()))
    }

    pub fn with_backends(probe: Arc<dyn MetadataProbe>, encoder: Arc<dyn Encoder>) -> Self {
        let (tx, rx) = bounded(512);
        Self {
            rx,
            tx,
            shutdown:       Arc::new(AtomicBool::new(false)),
            probe_sem:      Arc::new((Mutex::new(0), Condvar::new())),
            export_cancels: Arc::new(Mutex::new(HashMap::new())),
            probe,
            encoder,
        }
    }

    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::Relaxed);
        for flag in self.export_cancels.lock().values() {
            flag.store(true, Ordering::Relaxed);
        }
        log::debug!("[media] worker shutdown");
    }

    pub fn is_shut_down(&self) -> bool {
        self.shutdown.load(Ordering::Relaxed)
    }

    /// Probe `path` in the background and report `Duration` or `Error` for `id`.
    pub fn probe(&self, id: AssetId, path: PathBuf) {
        let tx    = self.tx.clone();
        let sd    = Arc::clone(&self.shutdown);
        let sem   = Arc::clone(&self.probe_sem);
        let probe = Arc::clone(&self.probe);

        thread::spawn(move || {
            {
                let (lock, cvar) = &*sem;
                let mut count = lock.lock();
                while *count >= PROBE_CONCURRENCY {
                    cvar.wait(&mut count);
                }
                *count += 1;
            }
            // RAII release guard: decrements count and wakes next waiter on drop
            struct SemGuard(Arc<(Mutex<u32>, Condvar)>);
            impl Drop for SemGuard {
                fn drop(&mut self) {
                    let (lock, cvar) = &*self.0;
                    *lock.lock() -= 1;
                    cvar.notify_one();
                }
            }
            let _guard = SemGuard(sem);

            if sd.load(Ordering::Relaxed) { return; }
            let result = match probe.duration(&path) {
                Ok(seconds) => MediaResult::Duration { id, seconds },
                Err(e) => {
                    log::error!("[media] probe {} failed: {e:#}", path.display());
                    MediaResult::Error { id, msg: format!("{e:#}") }
                }
            };
            if sd.load(Ordering::Relaxed) { return; }
            let _ = tx.send(result);
        });
    }

    /// Spawn a background thread to export `spec`.
    ///
    /// Each job has its own cancel flag keyed by job_id, so several exports
    /// could run side by side; the app shell only ever starts one.
    pub fn start_export(&self, spec: ExportSpec) {
        let job_id  = spec.job_id;
        let cancel  = Arc::new(AtomicBool::new(false));
        let tx      = self.tx.clone();
        let sd      = Arc::clone(&self.shutdown);
        let encoder = Arc::clone(&self.encoder);

        // Register before spawning so an immediate cancel_export finds it.
        self.export_cancels.lock().insert(job_id, Arc::clone(&cancel));

        let cancels_ref = Arc::clone(&self.export_cancels);
        thread::spawn(move || {
            if sd.load(Ordering::Relaxed) {
                let _ = tx.send(MediaResult::ExportError {
                    job_id,
                    msg: "worker shutting down".into(),
                });
            } else {
                export_timeline(spec, encoder.as_ref(), cancel, tx);
            }
            cancels_ref.lock().remove(&job_id);
        });
    }

    /// Signal the export job identified by `job_id` to stop. It discards its
    /// partial output and sends `ExportError { msg: "cancelled" }`.
    pub fn cancel_export(&self, job_id: Uuid) {
        if let Some(flag) = self.export_cancels.lock().get(&job_id) {
            log::info!("[export] cancel requested for job {job_id}");
            flag.store(true, Ordering::Relaxed);
        }
    }

    /// Number of export jobs still running.
    pub fn active_exports(&self) -> usize {
        self.export_cancels.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use std::time::Duration;

    use anyhow::{bail, Result};
    use crossbeam_channel::RecvTimeoutError;
    use winedit_core::media_types::CANCELLED;
    use winedit_core::render::ExportSegment;
    use winedit_core::ClipId;

    const WAIT: Duration = Duration::from_secs(5);

    struct FixedProbe;

    impl MetadataProbe for FixedProbe {
        fn duration(&self, path: &Path) -> Result<f64> {
            if path.ends_with("broken.mp4") {
                bail!("not a media file");
            }
            Ok(12.5)
        }
    }

    /// Blocks until cancelled, reporting frame 1 first so the test knows it started.
    struct StallingEncoder;

    impl Encoder for StallingEncoder {
        fn encode(&self, _: &ExportSpec, _: &Path, cancel: &AtomicBool, on_frame: &mut dyn FnMut(u64)) -> Result<()> {
            on_frame(1);
            while !cancel.load(Ordering::Relaxed) {
                thread::sleep(Duration::from_millis(5));
            }
            bail!(CANCELLED)
        }
    }

    struct InstantEncoder;

    impl Encoder for InstantEncoder {
        fn encode(&self, _: &ExportSpec, dest: &Path, _: &AtomicBool, on_frame: &mut dyn FnMut(u64)) -> Result<()> {
            on_frame(30);
            std::fs::write(dest, b"mp4")?;
            Ok(())
        }
    }

    fn worker(encoder: Arc<dyn Encoder>) -> MediaWorker {
        MediaWorker::with_backends(Arc::new(FixedProbe), encoder)
    }

    fn spec(output: PathBuf) -> ExportSpec {
        ExportSpec {
            job_id:   Uuid::new_v4(),
            segments: vec![ExportSegment {
                clip_id:       ClipId::new(),
                source_path:   "a.mp4".into(),
                trim_start:    0.0,
                trim_duration: 1.0,
                placement:     0.0,
            }],
            duration: 1.0,
            width:    640,
            height:   360,
            fps:      30,
            output,
            progress_interval: 15,
        }
    }

    fn wait_for<F: Fn(&MediaResult) -> bool>(w: &MediaWorker, pred: F) -> MediaResult {
        loop {
            match w.rx.recv_timeout(WAIT) {
                Ok(r) if pred(&r) => return r,
                Ok(_) => continue,
                Err(RecvTimeoutError::Timeout) => panic!("timed out waiting for media result"),
                Err(RecvTimeoutError::Disconnected) => panic!("worker channel closed"),
            }
        }
    }

    #[test]
    fn probe_reports_duration_or_error() {
        let w = worker(Arc::new(InstantEncoder));
        let ok  = AssetId::from("ok");
        let bad = AssetId::from("bad");
        w.probe(ok.clone(), PathBuf::from("clip.mp4"));
        w.probe(bad.clone(), PathBuf::from("broken.mp4"));

        let mut seen = Vec::new();
        for _ in 0..2 {
            seen.push(w.rx.recv_timeout(WAIT).unwrap());
        }
        assert!(seen.contains(&MediaResult::Duration { id: ok, seconds: 12.5 }));
        assert!(seen.iter().any(|r| matches!(r, MediaResult::Error { id, .. } if id == &bad)));
    }

    #[test]
    fn export_runs_to_completion() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out.mp4");
        let w = worker(Arc::new(InstantEncoder));
        let s = spec(out.clone());
        let job = s.job_id;
        w.start_export(s);

        let done = wait_for(&w, |r| matches!(r, MediaResult::ExportDone { .. } | MediaResult::ExportError { .. }));
        assert_eq!(done, MediaResult::ExportDone { job_id: job, path: out.clone() });
        assert_eq!(std::fs::read(&out).unwrap(), b"mp4");
    }

    #[test]
    fn cancel_stops_the_matching_job() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out.mp4");
        let w = worker(Arc::new(StallingEncoder));
        let s = spec(out.clone());
        let job = s.job_id;
        w.start_export(s);

        wait_for(&w, |r| matches!(r, MediaResult::ExportProgress { .. }));
        w.cancel_export(Uuid::new_v4()); // unrelated id: ignored
        w.cancel_export(job);

        let end = wait_for(&w, |r| matches!(r, MediaResult::ExportError { .. }));
        assert_eq!(end, MediaResult::ExportError { job_id: job, msg: CANCELLED.into() });
        assert!(!out.exists());
    }

    #[test]
    fn export_after_shutdown_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        let w = worker(Arc::new(InstantEncoder));
        w.shutdown();
        assert!(w.is_shut_down());
        w.start_export(spec(dir.path().join("out.mp4")));
        let end = wait_for(&w, |r| matches!(r, MediaResult::ExportError { .. }));
        assert!(matches!(end, MediaResult::ExportError { msg, .. } if msg.contains("shutting down")));
    }
}
