// crates/winedit-core/src/helpers/time.rs
//
// Time formatting and frame arithmetic used by the CLI readouts and the
// export progress banner.

/// Format seconds as `MM:SS:FF` at `fps` frames per second.
///
/// Negative input is treated as zero.
///
/// ```
/// use winedit_core::helpers::time::format_timecode;
/// assert_eq!(format_timecode(0.0, 30),  "00:00:00");
/// assert_eq!(format_timecode(61.5, 30), "01:01:15");
/// assert_eq!(format_timecode(2.5, 24),  "00:02:12");
/// ```
pub fn format_timecode(s: f64, fps: u32) -> String {
    let s   = s.max(0.0);
    let fps = fps.max(1);
    let m   = (s / 60.0) as u32;
    let sc  = (s % 60.0) as u32;
    let fr  = ((s * fps as f64) as u64 % fps as u64) as u32;
    format!("{m:02}:{sc:02}:{fr:02}")
}

/// Format seconds as a transport clock, `M:SS.t` (tenths).
///
/// ```
/// use winedit_core::helpers::time::format_clock;
/// assert_eq!(format_clock(0.0),   "0:00.0");
/// assert_eq!(format_clock(75.25), "1:15.2");
/// ```
pub fn format_clock(secs: f64) -> String {
    let tenths = (secs.max(0.0) * 10.0) as u64;
    let m      = tenths / 600;
    let s      = (tenths / 10) % 60;
    let t      = tenths % 10;
    format!("{m}:{s:02}.{t}")
}

/// Index of the frame that is on screen at `secs`.
///
/// ```
/// use winedit_core::helpers::time::frame_index;
/// assert_eq!(frame_index(1.0, 30), 30);
/// assert_eq!(frame_index(-1.0, 30), 0);
/// ```
pub fn frame_index(secs: f64, fps: u32) -> u64 {
    (secs.max(0.0) * fps as f64).floor() as u64
}

/// Number of frames needed to cover `secs`, rounding up so a trailing
/// partial frame is still rendered.
pub fn frame_count(secs: f64, fps: u32) -> u64 {
    (secs.max(0.0) * fps as f64).ceil() as u64
}
