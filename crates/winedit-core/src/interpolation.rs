// crates/winedit-core/src/interpolation.rs
//
// Keyframe evaluation for animated clip properties.
//
// Organised into sections:
//   - Easing curves
//   - Evaluation
//
// Everything here is a pure function of its arguments. The renderer calls
// `evaluate` once per property per frame, so nothing allocates beyond the
// sorted view of the keyframe list.

use crate::properties::{Easing, Keyframe, Property};

// ── Easing curves ─────────────────────────────────────────────────────────────
//
// All curves map progress `t` ∈ [0.0, 1.0] to eased progress in [0.0, 1.0].
// Inputs are NOT clamped: evaluation only ever passes progress from a
// bracketing keyframe pair, which is already inside the unit interval.

/// No easing: progress passes through unchanged.
///
/// ```
/// use winedit_core::interpolation::linear;
/// assert_eq!(linear(0.25), 0.25);
/// ```
#[inline]
pub fn linear(t: f64) -> f64 {
    t
}

/// Quadratic ease in. Starts slow and accelerates.
///
/// ```
/// use winedit_core::interpolation::ease_in;
/// assert_eq!(ease_in(0.5), 0.25);
/// ```
#[inline]
pub fn ease_in(t: f64) -> f64 {
    t * t
}

/// Quadratic ease out. Decelerates into the end value.
///
/// ```
/// use winedit_core::interpolation::ease_out;
/// assert_eq!(ease_out(0.5), 0.75);
/// ```
#[inline]
pub fn ease_out(t: f64) -> f64 {
    t * (2.0 - t)
}

/// Piecewise quadratic ease in/out, symmetric around `t = 0.5`.
#[inline]
pub fn ease_in_out(t: f64) -> f64 {
    if t < 0.5 {
        2.0 * t * t
    } else {
        -1.0 + (4.0 - 2.0 * t) * t
    }
}

impl Easing {
    /// Apply this easing curve to normalized progress `t`.
    #[inline]
    pub fn apply(self, t: f64) -> f64 {
        match self {
            Easing::Linear    => linear(t),
            Easing::EaseIn    => ease_in(t),
            Easing::EaseOut   => ease_out(t),
            Easing::EaseInOut => ease_in_out(t),
        }
    }
}

// ── Evaluation ────────────────────────────────────────────────────────────────

/// Evaluate `property` at `time` seconds, relative to the owning clip's start.
///
/// - No keyframes → `base_value`, verbatim.
/// - Before the first keyframe / after the last → that keyframe's value (flat hold).
/// - Between two keyframes → the EARLIER keyframe's easing shapes the segment.
///
/// Keyframes are ordered by time with a stable sort, so two keyframes sharing a
/// timestamp keep their list order and the later one wins for `time` at or
/// beyond that instant.
///
/// ```
/// use winedit_core::interpolation::evaluate;
/// use winedit_core::properties::{Easing, Property};
///
/// let mut p = Property::new(0.0);
/// p.push_keyframe(0.0, 0.0, Easing::Linear);
/// p.push_keyframe(10.0, 10.0, Easing::Linear);
/// assert_eq!(evaluate(&p, 5.0), 5.0);
/// assert_eq!(evaluate(&p, -5.0), 0.0);
/// assert_eq!(evaluate(&p, 15.0), 10.0);
/// ```
pub fn evaluate(property: &Property, time: f64) -> f64 {
    let mut sorted: Vec<&Keyframe> = property.keyframes.iter().collect();
    sorted.sort_by(|a, b| a.time.total_cmp(&b.time));

    let (Some(first), Some(last)) = (sorted.first(), sorted.last()) else {
        return property.base_value;
    };

    if time <= first.time {
        return first.value;
    }
    if time >= last.time {
        return last.value;
    }

    for pair in sorted.windows(2) {
        let (k1, k2) = (pair[0], pair[1]);
        if time >= k1.time && time < k2.time {
            let progress = (time - k1.time) / (k2.time - k1.time);
            let eased    = k1.easing.apply(progress);
            return k1.value + (k2.value - k1.value) * eased;
        }
    }

    // Only reachable for a NaN `time`, which matches no segment.
    property.base_value
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn ramp(easing: Easing) -> Property {
        let mut p = Property::new(0.0);
        p.push_keyframe(0.0, 0.0, easing);
        p.push_keyframe(10.0, 10.0, Easing::Linear);
        p
    }

    #[test]
    fn easing_endpoints_are_fixed() {
        for e in [Easing::Linear, Easing::EaseIn, Easing::EaseOut, Easing::EaseInOut] {
            assert!((e.apply(0.0)).abs() < EPS, "{e:?} at 0");
            assert!((e.apply(1.0) - 1.0).abs() < EPS, "{e:?} at 1");
        }
    }

    #[test]
    fn ease_in_out_is_continuous_at_midpoint() {
        let below = ease_in_out(0.5 - 1e-9);
        let at    = ease_in_out(0.5);
        assert!((below - at).abs() < 1e-6);
        assert!((at - 0.5).abs() < EPS);
    }

    #[test]
    fn no_keyframes_returns_base_value() {
        let p = Property::new(1.0);
        for t in [-100.0, 0.0, 3.5, 1e9] {
            assert_eq!(evaluate(&p, t), 1.0);
        }
    }

    #[test]
    fn linear_ramp_midpoint_and_clamps() {
        let p = ramp(Easing::Linear);
        assert!((evaluate(&p, 5.0) - 5.0).abs() < EPS);
        assert_eq!(evaluate(&p, -5.0), 0.0);
        assert_eq!(evaluate(&p, 15.0), 10.0);
        assert_eq!(evaluate(&p, 0.0), 0.0);
        assert_eq!(evaluate(&p, 10.0), 10.0);
    }

    #[test]
    fn earlier_keyframe_easing_governs_segment() {
        // k1 = easeIn → progress 0.5 eases to 0.25
        let p = ramp(Easing::EaseIn);
        assert!((evaluate(&p, 5.0) - 2.5).abs() < EPS);

        // Easing on the LAST keyframe has no effect on the segment before it.
        let mut q = Property::new(0.0);
        q.push_keyframe(0.0, 0.0, Easing::Linear);
        q.push_keyframe(10.0, 10.0, Easing::EaseIn);
        assert!((evaluate(&q, 5.0) - 5.0).abs() < EPS);
    }

    #[test]
    fn ease_out_and_in_out_segments() {
        assert!((evaluate(&ramp(Easing::EaseOut), 5.0) - 7.5).abs() < EPS);
        assert!((evaluate(&ramp(Easing::EaseInOut), 2.5) - 1.25).abs() < EPS);
        assert!((evaluate(&ramp(Easing::EaseInOut), 7.5) - 8.75).abs() < EPS);
    }

    #[test]
    fn unsorted_keyframes_are_ordered_by_time() {
        let mut p = Property::new(0.0);
        p.push_keyframe(10.0, 100.0, Easing::Linear);
        p.push_keyframe(0.0, 0.0, Easing::Linear);
        p.push_keyframe(5.0, 50.0, Easing::Linear);
        assert!((evaluate(&p, 2.5) - 25.0).abs() < EPS);
        assert!((evaluate(&p, 7.5) - 75.0).abs() < EPS);
    }

    #[test]
    fn three_keyframes_pick_the_bracketing_pair() {
        let mut p = Property::new(0.0);
        p.push_keyframe(0.0, 1.0, Easing::Linear);
        p.push_keyframe(2.0, 0.0, Easing::Linear);
        p.push_keyframe(4.0, 1.0, Easing::Linear);
        assert!((evaluate(&p, 1.0) - 0.5).abs() < EPS);
        assert!((evaluate(&p, 3.0) - 0.5).abs() < EPS);
        assert_eq!(evaluate(&p, 2.0), 0.0);
    }

    #[test]
    fn duplicate_timestamps_keep_list_order() {
        let mut p = Property::new(0.0);
        p.push_keyframe(0.0, 0.0, Easing::Linear);
        p.push_keyframe(5.0, 1.0, Easing::Linear);
        p.push_keyframe(5.0, 2.0, Easing::Linear);
        p.push_keyframe(10.0, 4.0, Easing::Linear);
        // Approaching 5 from below interpolates toward the first of the pair.
        assert!((evaluate(&p, 2.5) - 0.5).abs() < EPS);
        // At 5 the later keyframe of the pair starts the next segment.
        assert_eq!(evaluate(&p, 5.0), 2.0);
        assert!((evaluate(&p, 7.5) - 3.0).abs() < EPS);
    }

    #[test]
    fn single_keyframe_holds_everywhere() {
        let mut p = Property::new(9.0);
        p.push_keyframe(3.0, 0.4, Easing::EaseInOut);
        assert_eq!(evaluate(&p, 0.0), 0.4);
        assert_eq!(evaluate(&p, 3.0), 0.4);
        assert_eq!(evaluate(&p, 30.0), 0.4);
    }

    #[test]
    fn results_stay_within_bracketing_values() {
        for e in [Easing::Linear, Easing::EaseIn, Easing::EaseOut, Easing::EaseInOut] {
            let mut p = Property::new(0.0);
            p.push_keyframe(1.0, 2.0, e);
            p.push_keyframe(3.0, -4.0, Easing::Linear);
            for i in 0..=200 {
                let t = 1.0 + 2.0 * (i as f64 / 200.0);
                let v = evaluate(&p, t);
                assert!((-4.0 - EPS..=2.0 + EPS).contains(&v), "{e:?} at {t}: {v}");
            }
        }
    }
}
