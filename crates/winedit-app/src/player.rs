// crates/winedit-app/src/player.rs
//
// Headless frame loop for the playback clock.
//
// Stands in for a display's vsync callback: sleeps until the next frame
// boundary, ticks the clock, hands the store to `on_frame`, and repeats
// until the clock reports Stopped or `cancel` is raised. The cancel flag is
// only read between ticks.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use winedit_core::playback::{PlaybackClock, TickOutcome};
use winedit_core::TimelineStore;

/// Run the clock in real time at `fps` until playback stops or `cancel` is
/// set. Returns the number of frames delivered to `on_frame`.
pub fn run_playback(
    store:    &mut TimelineStore,
    clock:    &mut PlaybackClock,
    fps:      u32,
    cancel:   &AtomicBool,
    mut on_frame: impl FnMut(&TimelineStore),
) -> u64 {
    let frame = Duration::from_secs_f64(1.0 / f64::from(fps.max(1)));
    if !store.is_playing() {
        clock.play(store, Instant::now());
    }

    let mut frames   = 0u64;
    let mut deadline = Instant::now() + frame;
    loop {
        if cancel.load(Ordering::Relaxed) {
            clock.pause(store);
            log::debug!("[playback] loop cancelled at {:.3}s", store.current_time());
            break;
        }
        let now = Instant::now();
        if deadline > now {
            std::thread::sleep(deadline - now);
        }
        deadline += frame;

        let outcome = clock.tick(store, Instant::now());
        on_frame(store);
        frames += 1;
        if outcome == TickOutcome::Stopped {
            break;
        }
    }
    frames
}
