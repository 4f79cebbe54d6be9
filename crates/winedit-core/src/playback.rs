// crates/winedit-core/src/playback.rs
//
// PlaybackClock: advances the store's playhead once per frame while playing.
//
// States: Stopped / Playing, mirrored by `TimelineStore::is_playing`.
// The clock never sleeps or spawns anything. The caller's frame loop calls
// `tick` and keeps scheduling frames for as long as it returns `Reschedule`.
// Pausing or seeking between ticks is picked up on the next tick.

use std::time::Instant;

use crate::timeline::TimelineStore;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    /// Still playing; schedule another tick.
    Reschedule,
    /// Playback ended or was stopped; do not schedule another tick.
    Stopped,
}

#[derive(Clone, Debug, Default)]
pub struct PlaybackClock {
    /// Wall time of the previous tick. `None` while stopped.
    last_tick: Option<Instant>,
}

impl PlaybackClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_armed(&self) -> bool {
        self.last_tick.is_some()
    }

    /// Start playing from the current playhead. At or past the end, playback
    /// restarts from 0.
    pub fn play(&mut self, store: &mut TimelineStore, now: Instant) {
        if store.current_time() >= store.duration() {
            store.seek(0.0);
        }
        store.set_playing(true);
        self.last_tick = Some(now);
        log::debug!("[playback] play from {:.3}s", store.current_time());
    }

    pub fn pause(&mut self, store: &mut TimelineStore) {
        store.set_playing(false);
        self.last_tick = None;
        log::debug!("[playback] pause at {:.3}s", store.current_time());
    }

    pub fn toggle(&mut self, store: &mut TimelineStore, now: Instant) {
        if store.is_playing() {
            self.pause(store);
        } else {
            self.play(store, now);
        }
    }

    /// Reseed the playhead without changing the play state.
    pub fn seek(&mut self, store: &mut TimelineStore, t: f64) {
        store.seek(t);
    }

    /// One frame: advance by the wall time elapsed since the previous tick.
    pub fn tick(&mut self, store: &mut TimelineStore, now: Instant) -> TickOutcome {
        if !store.is_playing() {
            self.last_tick = None;
            return TickOutcome::Stopped;
        }
        // Playing but never armed (state set directly on the store): this
        // tick only arms the clock.
        let prev  = self.last_tick.unwrap_or(now);
        let delta = now.saturating_duration_since(prev).as_secs_f64();
        self.last_tick = Some(now);
        self.advance(store, delta)
    }

    /// Advance by an explicit `delta` seconds. Used by `tick`, and directly by
    /// offline callers that step at a fixed frame rate.
    pub fn advance(&mut self, store: &mut TimelineStore, delta: f64) -> TickOutcome {
        if !store.is_playing() {
            self.last_tick = None;
            return TickOutcome::Stopped;
        }
        let next = store.current_time() + delta.max(0.0);
        if next >= store.duration() {
            store.seek(store.duration());
            store.set_playing(false);
            self.last_tick = None;
            log::debug!("[playback] reached end at {:.3}s", store.duration());
            TickOutcome::Stopped
        } else {
            store.seek(next);
            TickOutcome::Reschedule
        }
    }
}
