// crates/winedit-app/src/main.rs
//
// `winedit` command line: inspect, play back, sample and export .wne projects
// without a display.

use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};

use winedit_app::helpers::log::init_logging;
use winedit_app::player::run_playback;
use winedit_app::EditorApp;
use winedit_core::commands::EditorCommand;
use winedit_core::helpers::time::{format_clock, format_timecode};
use winedit_core::render::active_clips;
use winedit_core::{EditorSettings, TimelineStore};

#[derive(Parser, Debug)]
#[command(name = "winedit", author, version, about = "Headless WinEdit timeline tools", long_about = None)]
struct Args {
    /// Increase logging verbosity (default: warn, -v: info, -vv: debug, -vvv+: trace)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count, global = true)]
    verbosity: u8,

    /// Log to a file instead of the console (default: winedit.log in the temp dir)
    #[arg(short = 'l', long = "log-file", value_name = "LOG_FILE", global = true)]
    log_file: Option<Option<PathBuf>>,

    /// Settings file (default: settings.json in the user config directory)
    #[arg(short = 's', long = "settings", value_name = "FILE", global = true)]
    settings: Option<PathBuf>,

    #[command(subcommand)]
    command: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Print the tracks and clips of a project
    Info {
        project: PathBuf,
    },
    /// Play a project in real time, logging what is on screen once a second
    Play {
        project: PathBuf,
        /// Frame rate of the playback loop
        #[arg(long, default_value_t = 30)]
        fps: u32,
        /// Start time in seconds
        #[arg(long, default_value_t = 0.0)]
        from: f64,
    },
    /// Print the renderer's view of a project at one instant
    Sample {
        project: PathBuf,
        /// Timeline time in seconds
        time: f64,
    },
    /// Render the visible video tracks to an MP4
    Export {
        project: PathBuf,
        output:  PathBuf,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbosity, args.log_file.as_ref().map(|p| p.as_deref()))?;
    log::debug!("[app] args: {args:?}");

    let settings = load_settings(args.settings.as_deref())?;
    let mut app  = EditorApp::new(settings);

    match args.command {
        Cmd::Info { project } => {
            open(&mut app, &project)?;
            print_info(&app.store);
        }
        Cmd::Play { project, fps, from } => {
            open(&mut app, &project)?;
            app.process_command(EditorCommand::Seek(from))?;
            play(&mut app, fps);
        }
        Cmd::Sample { project, time } => {
            open(&mut app, &project)?;
            print_sample(&app.store, time);
        }
        Cmd::Export { project, output } => {
            open(&mut app, &project)?;
            export(&mut app, output)?;
        }
    }
    Ok(())
}

fn load_settings(explicit: Option<&Path>) -> Result<EditorSettings> {
    let path = match explicit {
        Some(p) => p.to_path_buf(),
        None => match EditorSettings::default_path() {
            Some(p) => p,
            None => return Ok(EditorSettings::default()),
        },
    };
    EditorSettings::load(&path).with_context(|| format!("reading settings {}", path.display()))
}

fn open(app: &mut EditorApp, project: &Path) -> Result<()> {
    app.process_command(EditorCommand::OpenProject(project.to_path_buf()))
        .with_context(|| format!("opening {}", project.display()))
}

fn print_info(store: &TimelineStore) {
    let fps = store.settings().export_fps;
    println!(
        "duration {}  ({} tracks, {} clips, content ends at {})",
        format_timecode(store.duration(), fps),
        store.tracks().len(),
        store.clip_count(),
        format_timecode(store.content_end(), fps),
    );
    for (i, track) in store.tracks().iter().enumerate() {
        let mut flags = String::new();
        if track.muted  { flags.push_str(" muted"); }
        if track.hidden { flags.push_str(" hidden"); }
        if track.locked { flags.push_str(" locked"); }
        println!("[{i}] {} ({}){flags}", track.name, track.kind.label());

        let mut clips: Vec<_> = track.clips.iter().collect();
        clips.sort_by(|a, b| a.start.total_cmp(&b.start));
        for c in clips {
            let animated = c.properties.keyframe_count();
            println!(
                "    {} → {}  {:<24} {:?}  offset {:.2}s{}",
                format_timecode(c.start, fps),
                format_timecode(c.end(), fps),
                c.name,
                c.kind,
                c.source_offset,
                if animated > 0 { format!("  {animated} keyframes") } else { String::new() },
            );
        }
    }
}

fn print_sample(store: &TimelineStore, time: f64) {
    let view = active_clips(store, time);
    println!("t = {}  ({} active)", format_clock(time), view.len());
    for c in view {
        let t = c.transform;
        println!(
            "  [{}] {:<24} src {:>8.3}s  opacity {:.3} scale {:.3} rot {:.1} pos ({:.1}, {:.1})",
            c.track_index, c.name, c.source_time, t.opacity, t.scale, t.rotation, t.position_x, t.position_y,
        );
    }
}

fn play(app: &mut EditorApp, fps: u32) {
    let cancel = AtomicBool::new(false);
    let mut last_report = f64::NEG_INFINITY;
    let frames = run_playback(&mut app.store, &mut app.clock, fps, &cancel, |store| {
        let now = store.current_time();
        if now - last_report >= 1.0 || !store.is_playing() {
            last_report = now;
            let names: Vec<String> = active_clips(store, now).into_iter()
                .map(|c| format!("{} (α {:.2})", c.name, c.transform.opacity))
                .collect();
            log::info!("[playback] {}  {}", format_clock(now), names.join(", "));
        }
    });
    println!("played {frames} frames, stopped at {}", format_clock(app.store.current_time()));
}

fn export(app: &mut EditorApp, output: PathBuf) -> Result<()> {
    let job = app.start_export(output)?;
    println!("export job {job} started");

    let mut last_pct = None;
    while app.export.is_running() {
        match app.media.rx.recv_timeout(Duration::from_millis(250)) {
            Ok(result) => app.ingest(result),
            Err(crossbeam_channel::RecvTimeoutError::Timeout) => continue,
            Err(crossbeam_channel::RecvTimeoutError::Disconnected) => bail!("media worker went away"),
        }
        let pct = (app.export.fraction() * 100.0).round() as u32;
        if last_pct != Some(pct) {
            println!("rendering… {pct}%");
            last_pct = Some(pct);
        }
    }

    if let Some(path) = &app.export.done {
        println!("wrote {}", path.display());
        Ok(())
    } else if app.export.cancelled {
        bail!("export cancelled")
    } else {
        bail!("export failed: {}", app.export.error.as_deref().unwrap_or("unknown error"))
    }
}
