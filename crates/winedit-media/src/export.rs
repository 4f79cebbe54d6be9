// crates/winedit-media/src/export.rs
//
// Timeline export to a single H.264 MP4.
//
// Design:
//   • `ExportSpec`        - the complete job description handed from the app.
//   • `Encoder`           - renders a spec to a given file; the worker only
//                           sees this trait.
//   • `FfmpegCli`         - default Encoder: one ffmpeg process with an
//                           overlay filter graph.
//   • `export_timeline()` - blocking function meant to run on its own thread;
//                           called from MediaWorker::start_export. Sends
//                           ExportProgress every `progress_interval` frames and
//                           ExportError / ExportDone on exit.
//
// Filter graph:
//   A black `color` source spanning the timeline is the base layer. Each
//   segment is trimmed out of its input at `trim_start` for `trim_duration`,
//   its timestamps shifted to `placement`, and overlaid while
//   `placement <= t <= placement + trim_duration`. Later segments are laid
//   over earlier ones.
//
// Output safety:
//   The encoder writes into a temp file beside the destination. Only a
//   successful, uncancelled run persists it to `output`; every other exit
//   drops the temp file, so a failed export never leaves a partial MP4.
//
// Cancellation:
//   `cancel` is an Arc<AtomicBool>. FfmpegCli polls it every CANCEL_POLL
//   whether or not ffmpeg is printing progress, and kills the process once it
//   is set. ExportError { msg: "cancelled" } is then sent.

use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use crossbeam_channel::{RecvTimeoutError, Sender};
use uuid::Uuid;

use winedit_core::helpers::time::frame_count;
use winedit_core::media_types::{MediaResult, CANCELLED};
use winedit_core::render::ExportSegment;

use crate::paths::ffmpeg_exe;

// ── Public types ──────────────────────────────────────────────────────────────

/// Complete description of an export job.
#[derive(Clone, Debug)]
pub struct ExportSpec {
    /// Identifies this job in every progress / done / error result.
    pub job_id:            Uuid,
    /// Segments ordered by placement.
    pub segments:          Vec<ExportSegment>,
    /// Output length in seconds; the black base layer spans all of it.
    pub duration:          f64,
    pub width:             u32,
    pub height:            u32,
    pub fps:               u32,
    /// Destination file, including extension (`.mp4`).
    pub output:            PathBuf,
    /// Send a progress update every this many output frames.
    pub progress_interval: u64,
}

impl ExportSpec {
    pub fn total_frames(&self) -> u64 {
        frame_count(self.duration, self.fps).max(1)
    }
}

pub trait Encoder: Send + Sync {
    /// Render `spec` into `dest`, calling `on_frame` with the number of
    /// frames written so far. Must return promptly once `cancel` is set.
    fn encode(
        &self,
        spec:     &ExportSpec,
        dest:     &Path,
        cancel:   &AtomicBool,
        on_frame: &mut dyn FnMut(u64),
    ) -> Result<()>;
}

// ── Filter graph ──────────────────────────────────────────────────────────────

/// Distinct source paths in first-use order; the index is the ffmpeg input.
pub fn unique_inputs(segments: &[ExportSegment]) -> Vec<&str> {
    let mut inputs: Vec<&str> = Vec::new();
    for s in segments {
        if !inputs.contains(&s.source_path.as_str()) {
            inputs.push(&s.source_path);
        }
    }
    inputs
}

/// Build the `-filter_complex` graph. The final label is always `[out]`.
pub fn build_filter_graph(spec: &ExportSpec) -> String {
    let inputs = unique_inputs(&spec.segments);
    let mut graph = format!(
        "color=c=black:s={}x{}:r={}:d={}[bg]",
        spec.width, spec.height, spec.fps, spec.duration,
    );
    if spec.segments.is_empty() {
        graph.push_str(";[bg]null[out]");
        return graph;
    }

    let mut last = "bg".to_string();
    for (i, seg) in spec.segments.iter().enumerate() {
        let input = inputs.iter().position(|p| *p == seg.source_path).unwrap_or(0);
        let end   = seg.placement + seg.trim_duration;
        let next  = if i + 1 == spec.segments.len() { "out".to_string() } else { format!("tmp{i}") };
        graph.push_str(&format!(
            ";[{input}:v]trim=start={}:duration={},setpts=PTS-STARTPTS+{}/TB,scale={}:{}[v{i}]",
            seg.trim_start, seg.trim_duration, seg.placement, spec.width, spec.height,
        ));
        graph.push_str(&format!(
            ";[{last}][v{i}]overlay=enable='between(t,{},{end})':eof_action=pass[{next}]",
            seg.placement,
        ));
        last = next;
    }
    graph
}

/// Full ffmpeg argument list for rendering `spec` into `dest`.
pub fn build_args(spec: &ExportSpec, dest: &Path) -> Vec<String> {
    let mut args: Vec<String> = vec!["-y".into(), "-hide_banner".into(), "-loglevel".into(), "error".into()];
    for input in unique_inputs(&spec.segments) {
        args.push("-i".into());
        args.push(input.to_string());
    }
    args.extend([
        "-filter_complex".into(), build_filter_graph(spec),
        "-map".into(), "[out]".into(),
        "-c:v".into(), "libx264".into(),
        "-preset".into(), "fast".into(),
        "-pix_fmt".into(), "yuv420p".into(),
        "-r".into(), spec.fps.to_string(),
        "-f".into(), "mp4".into(),
        "-progress".into(), "pipe:1".into(),
        "-nostats".into(),
    ]);
    args.push(dest.to_string_lossy().into_owned());
    args
}

/// Frames written so far, from one `-progress` line (`frame=123`).
pub fn parse_progress_frame(line: &str) -> Option<u64> {
    line.trim().strip_prefix("frame=")?.trim().parse().ok()
}

// ── ffmpeg CLI encoder ────────────────────────────────────────────────────────

pub struct FfmpegCli {
    exe: PathBuf,
}

impl FfmpegCli {
    pub fn new(exe: PathBuf) -> Self {
        Self { exe }
    }

    /// Use `WINEDIT_FFMPEG`, falling back to `ffmpeg` on PATH.
    pub fn from_env() -> Self {
        Self::new(ffmpeg_exe())
    }
}

impl Default for FfmpegCli {
    fn default() -> Self {
        Self::from_env()
    }
}

impl Encoder for FfmpegCli {
    fn encode(
        &self,
        spec:     &ExportSpec,
        dest:     &Path,
        cancel:   &AtomicBool,
        on_frame: &mut dyn FnMut(u64),
    ) -> Result<()> {
        let args = build_args(spec, dest);
        log::debug!("[export] {} {}", self.exe.display(), args.join(" "));

        let mut child = Command::new(&self.exe)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .with_context(|| format!("spawning {}", self.exe.display()))?;

        // Drain stderr on its own thread so a chatty ffmpeg never blocks on a
        // full pipe while we sit on stdout.
        let stderr = child.stderr.take();
        let stderr_reader = thread::spawn(move || {
            let mut buf = String::new();
            if let Some(mut s) = stderr {
                let _ = s.read_to_string(&mut buf);
            }
            buf
        });

        let status = drive_child(&mut child, cancel, on_frame)?;
        let stderr = stderr_reader.join().unwrap_or_default();
        if cancel.load(Ordering::Relaxed) {
            bail!(CANCELLED);
        }
        if !status.success() {
            bail!("ffmpeg exited with {status}: {}", stderr.lines().last().unwrap_or(""));
        }
        Ok(())
    }
}

/// How often a running encoder process checks the cancel flag.
const CANCEL_POLL: Duration = Duration::from_millis(100);

/// Forward `frame=` progress lines from `child`'s stdout to `on_frame` until
/// the child closes stdout, then reap it. Stdout is read on its own thread so
/// the cancel flag is seen within `CANCEL_POLL` even while the child is
/// silent; on cancel the child is killed and `CANCELLED` is returned.
fn drive_child(child: &mut Child, cancel: &AtomicBool, on_frame: &mut dyn FnMut(u64)) -> Result<ExitStatus> {
    let stdout = child.stdout.take().context("encoder stdout not captured")?;
    let (frame_tx, frame_rx) = crossbeam_channel::unbounded();
    let reader = thread::spawn(move || {
        for line in BufReader::new(stdout).lines() {
            let Ok(line) = line else { break };
            if let Some(frame) = parse_progress_frame(&line) {
                if frame_tx.send(frame).is_err() {
                    break;
                }
            }
        }
    });

    loop {
        if cancel.load(Ordering::Relaxed) {
            let _ = child.kill();
            let _ = child.wait();
            let _ = reader.join();
            bail!(CANCELLED);
        }
        match frame_rx.recv_timeout(CANCEL_POLL) {
            Ok(frame) => on_frame(frame),
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }
    let _ = reader.join();
    child.wait().context("waiting for encoder")
}

// ── Public entry point ────────────────────────────────────────────────────────

/// Run `spec` through `encoder`. Blocking; run this on a dedicated thread.
pub fn export_timeline(
    spec:    ExportSpec,
    encoder: &dyn Encoder,
    cancel:  Arc<AtomicBool>,
    tx:      Sender<MediaResult>,
) {
    let job_id = spec.job_id;
    match run_export(&spec, encoder, &cancel, &tx) {
        Ok(path) => {
            log::info!("[export] job {job_id} done → {}", path.display());
            let _ = tx.send(MediaResult::ExportDone { job_id, path });
        }
        Err(e) if cancel.load(Ordering::Relaxed) => {
            log::info!("[export] job {job_id} cancelled ({e})");
            let _ = tx.send(MediaResult::ExportError { job_id, msg: CANCELLED.into() });
        }
        Err(e) => {
            log::error!("[export] job {job_id} failed: {e:#}");
            let _ = tx.send(MediaResult::ExportError { job_id, msg: format!("{e:#}") });
        }
    }
}

fn run_export(
    spec:    &ExportSpec,
    encoder: &dyn Encoder,
    cancel:  &AtomicBool,
    tx:      &Sender<MediaResult>,
) -> Result<PathBuf> {
    if spec.segments.is_empty() {
        bail!("no video clips to export");
    }
    let dir = match spec.output.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let tmp = tempfile::Builder::new()
        .prefix(".winedit-export-")
        .suffix(".mp4")
        .tempfile_in(&dir)
        .with_context(|| format!("creating temp file in {}", dir.display()))?;

    let job_id   = spec.job_id;
    let total    = spec.total_frames();
    let interval = spec.progress_interval.max(1);
    let mut next_report = 0u64;
    let mut on_frame = |done: u64| {
        if done >= next_report {
            let _ = tx.send(MediaResult::ExportProgress { job_id, done: done.min(total), total });
            next_report = done + interval;
        }
    };

    log::info!("[export] job {job_id}: {} segments, {total} frames → {}", spec.segments.len(), spec.output.display());
    encoder.encode(spec, tmp.path(), cancel, &mut on_frame)?;
    if cancel.load(Ordering::Relaxed) {
        bail!(CANCELLED);
    }

    let _ = tx.send(MediaResult::ExportProgress { job_id, done: total, total });
    tmp.persist(&spec.output)
        .map_err(|e| e.error)
        .with_context(|| format!("writing {}", spec.output.display()))?;
    Ok(spec.output.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::unbounded;
    use winedit_core::ClipId;

    fn segment(src: &str, trim_start: f64, trim_duration: f64, placement: f64) -> ExportSegment {
        ExportSegment {
            clip_id:     ClipId::new(),
            source_path: src.into(),
            trim_start,
            trim_duration,
            placement,
        }
    }

    fn spec(output: PathBuf, segments: Vec<ExportSegment>) -> ExportSpec {
        ExportSpec {
            job_id: Uuid::new_v4(),
            segments,
            duration: 2.0,
            width: 1280,
            height: 720,
            fps: 30,
            output,
            progress_interval: 15,
        }
    }

    /// Writes one byte per frame and reports every frame.
    struct FakeEncoder {
        fail_at: Option<u64>,
    }

    impl Encoder for FakeEncoder {
        fn encode(&self, spec: &ExportSpec, dest: &Path, cancel: &AtomicBool, on_frame: &mut dyn FnMut(u64)) -> Result<()> {
            let total = spec.total_frames();
            let mut bytes = Vec::new();
            for frame in 1..=total {
                if cancel.load(Ordering::Relaxed) {
                    bail!(CANCELLED);
                }
                if Some(frame) == self.fail_at {
                    std::fs::write(dest, &bytes)?;
                    bail!("encoder exploded at frame {frame}");
                }
                bytes.push(0u8);
                on_frame(frame);
            }
            std::fs::write(dest, &bytes)?;
            Ok(())
        }
    }

    #[test]
    fn filter_graph_trims_shifts_and_overlays() {
        let s = spec(PathBuf::from("out.mp4"), vec![
            segment("a.mp4", 1.0, 3.0, 0.0),
            segment("b.mp4", 0.0, 2.0, 3.0),
            segment("a.mp4", 5.0, 1.0, 5.0),
        ]);
        let g = build_filter_graph(&s);
        assert!(g.starts_with("color=c=black:s=1280x720:r=30:d=2[bg]"));
        assert!(g.contains("[0:v]trim=start=1:duration=3,setpts=PTS-STARTPTS+0/TB"));
        assert!(g.contains("[1:v]trim=start=0:duration=2,setpts=PTS-STARTPTS+3/TB"));
        assert!(g.contains("[0:v]trim=start=5:duration=1,setpts=PTS-STARTPTS+5/TB"));
        assert!(g.contains("[bg][v0]overlay=enable='between(t,0,3)':eof_action=pass[tmp0]"));
        assert!(g.contains("[tmp1][v2]overlay=enable='between(t,5,6)':eof_action=pass[out]"));
        assert!(!g.ends_with(';'));
    }

    #[test]
    fn args_list_each_source_once() {
        let s = spec(PathBuf::from("out.mp4"), vec![
            segment("a.mp4", 0.0, 1.0, 0.0),
            segment("a.mp4", 2.0, 1.0, 1.0),
        ]);
        let args = build_args(&s, Path::new("tmp.mp4"));
        assert_eq!(args.iter().filter(|a| *a == "-i").count(), 1);
        assert_eq!(args.last().map(String::as_str), Some("tmp.mp4"));
        assert!(args.windows(2).any(|w| w[0] == "-progress" && w[1] == "pipe:1"));
    }

    #[test]
    fn progress_lines() {
        assert_eq!(parse_progress_frame("frame=42"), Some(42));
        assert_eq!(parse_progress_frame("fps=29.97"), None);
        assert_eq!(parse_progress_frame("frame=N/A"), None);
    }

    #[cfg(unix)]
    #[test]
    fn child_progress_lines_reach_on_frame() {
        let mut child = Command::new("sh")
            .args(["-c", "printf 'frame=3\\nfps=30\\nframe=7\\n'"])
            .stdout(Stdio::piped())
            .spawn()
            .unwrap();
        let mut frames = Vec::new();
        let status = drive_child(&mut child, &AtomicBool::new(false), &mut |f| frames.push(f)).unwrap();
        assert!(status.success());
        assert_eq!(frames, vec![3, 7]);
    }

    #[cfg(unix)]
    #[test]
    fn cancel_kills_a_silent_child() {
        let mut child = Command::new("sleep")
            .arg("30")
            .stdout(Stdio::piped())
            .spawn()
            .unwrap();
        let cancel = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&cancel);
        let setter = thread::spawn(move || {
            thread::sleep(Duration::from_millis(200));
            flag.store(true, Ordering::Relaxed);
        });

        let started = std::time::Instant::now();
        let err = drive_child(&mut child, &cancel, &mut |_| {}).unwrap_err();
        setter.join().unwrap();
        assert_eq!(err.to_string(), CANCELLED);
        assert!(started.elapsed() < Duration::from_secs(5));
        assert!(child.try_wait().unwrap().is_some());
    }

    #[test]
    fn successful_export_persists_output() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("final.mp4");
        let s = spec(out.clone(), vec![segment("a.mp4", 0.0, 2.0, 0.0)]);
        let job = s.job_id;
        let (tx, rx) = unbounded();

        export_timeline(s, &FakeEncoder { fail_at: None }, Arc::new(AtomicBool::new(false)), tx);

        let results: Vec<_> = rx.try_iter().collect();
        let progress: Vec<u64> = results.iter().filter_map(|r| match r {
            MediaResult::ExportProgress { done, .. } => Some(*done),
            _ => None,
        }).collect();
        assert_eq!(progress.first(), Some(&1));
        assert_eq!(progress.last(), Some(&60));
        assert!(progress.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(results.last(), Some(&MediaResult::ExportDone { job_id: job, path: out.clone() }));
        assert_eq!(std::fs::read(&out).unwrap().len(), 60);
        // Only the final file remains.
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn failed_export_discards_partial_output() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("final.mp4");
        let s = spec(out.clone(), vec![segment("a.mp4", 0.0, 2.0, 0.0)]);
        let (tx, rx) = unbounded();

        export_timeline(s, &FakeEncoder { fail_at: Some(10) }, Arc::new(AtomicBool::new(false)), tx);

        match rx.try_iter().last() {
            Some(MediaResult::ExportError { msg, .. }) => assert!(msg.contains("exploded")),
            other => panic!("unexpected {other:?}"),
        }
        assert!(!out.exists());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn cancelled_export_reports_sentinel() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("final.mp4");
        let s = spec(out.clone(), vec![segment("a.mp4", 0.0, 2.0, 0.0)]);
        let (tx, rx) = unbounded();

        export_timeline(s, &FakeEncoder { fail_at: None }, Arc::new(AtomicBool::new(true)), tx);

        match rx.try_iter().last() {
            Some(MediaResult::ExportError { msg, .. }) => assert_eq!(msg, CANCELLED),
            other => panic!("unexpected {other:?}"),
        }
        assert!(!out.exists());
    }

    #[test]
    fn empty_plan_is_rejected_before_encoding() {
        let dir = tempfile::tempdir().unwrap();
        let s = spec(dir.path().join("final.mp4"), Vec::new());
        let (tx, rx) = unbounded();
        export_timeline(s, &FakeEncoder { fail_at: None }, Arc::new(AtomicBool::new(false)), tx);
        assert!(matches!(rx.try_iter().last(), Some(MediaResult::ExportError { .. })));
    }
}
