//! Heading smoothing across the ±180° seam.
//!
//! A linear filter fed `179°, -179°` sees a 358° jump and swings the estimate
//! through zero.  [`CyclicAngleTracker`] unwraps each sample onto the
//! shortest path from the previous one, filters the continuous signal, and
//! wraps the result back into `[-180, 180)`.

use tagpose_types::FilterParams;

use crate::one_euro::OneEuroFilter;

/// Wrap an angle in degrees into `[-180, 180)`.
pub fn wrap_degrees(angle: f64) -> f64 {
    let wrapped = (angle + 180.0).rem_euclid(360.0) - 180.0;
    // rem_euclid may round up to the modulus itself.
    if wrapped >= 180.0 { wrapped - 360.0 } else { wrapped }
}

/// Unwraps, filters and re-wraps a heading signal in degrees.
#[derive(Debug, Clone, PartialEq)]
pub struct CyclicAngleTracker {
    filter: OneEuroFilter,
    /// Last unwrapped, *unfiltered* heading. `None` before the first sample.
    anchor: Option<f64>,
}

impl CyclicAngleTracker {
    pub fn new(params: FilterParams) -> Self {
        Self {
            filter: OneEuroFilter::new(params),
            anchor: None,
        }
    }

    /// Continuity reference used to unwrap the next sample.
    pub fn anchor(&self) -> Option<f64> {
        self.anchor
    }

    /// The inner scalar filter operating on the unwrapped signal.
    pub fn filter(&self) -> &OneEuroFilter {
        &self.filter
    }

    /// Smooth `raw_degrees` observed at `timestamp` (seconds).
    ///
    /// The first sample is returned wrapped and does not touch the inner
    /// filter.  Afterwards the anchor advances to the unfiltered unwrapped
    /// value, so filter lag never shifts the continuity reference.
    pub fn smooth(&mut self, raw_degrees: f64, timestamp: f64) -> f64 {
        let Some(anchor) = self.anchor else {
            self.anchor = Some(raw_degrees);
            return wrap_degrees(raw_degrees);
        };

        let mut delta = wrap_degrees(raw_degrees) - wrap_degrees(anchor);
        if delta > 180.0 {
            delta -= 360.0;
        } else if delta < -180.0 {
            delta += 360.0;
        }
        let unwrapped = anchor + delta;

        let filtered = self.filter.apply(unwrapped, timestamp);
        self.anchor = Some(unwrapped);
        wrap_degrees(filtered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Shortest angular distance between two headings, in degrees.
    fn angular_gap(a: f64, b: f64) -> f64 {
        wrap_degrees(b - a).abs()
    }

    #[test]
    fn wrap_degrees_canonical_range() {
        assert_eq!(wrap_degrees(0.0), 0.0);
        assert_eq!(wrap_degrees(180.0), -180.0);
        assert_eq!(wrap_degrees(-180.0), -180.0);
        assert!((wrap_degrees(190.0) + 170.0).abs() < 1e-12);
        assert!((wrap_degrees(-190.0) - 170.0).abs() < 1e-12);
        assert!((wrap_degrees(725.0) - 5.0).abs() < 1e-12);
        let tiny = wrap_degrees(-1e-15 - 180.0);
        assert!((-180.0..180.0).contains(&tiny));
    }

    #[test]
    fn first_sample_bypasses_filter() {
        let mut tracker = CyclicAngleTracker::new(FilterParams::default());
        assert!((tracker.smooth(200.0, 0.0) + 160.0).abs() < 1e-12);
        assert_eq!(tracker.anchor(), Some(200.0));
        assert!(!tracker.filter().has_prior());
    }

    #[test]
    fn seam_crossing_has_no_discontinuity() {
        let mut tracker = CyclicAngleTracker::new(FilterParams::default());
        let outputs: Vec<f64> = [179.0, -179.0, 179.0, -179.0]
            .iter()
            .enumerate()
            .map(|(i, &raw)| tracker.smooth(raw, i as f64))
            .collect();

        for out in &outputs {
            assert!((-180.0..180.0).contains(out), "out of range: {out}");
        }
        for pair in outputs.windows(2) {
            let gap = angular_gap(pair[0], pair[1]);
            assert!(gap < 10.0, "jump of {gap}° between {} and {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn unwrap_takes_shortest_path() {
        let mut tracker = CyclicAngleTracker::new(FilterParams::default());
        tracker.smooth(170.0, 0.0);
        tracker.smooth(-170.0, 1.0);
        // -170 is 20° past 170 going counter-clockwise.
        assert!((tracker.anchor().unwrap() - 190.0).abs() < 1e-12);
        tracker.smooth(0.0, 2.0);
        // -170 → 0 is +170, shorter than going -190.
        assert!((tracker.anchor().unwrap() - 360.0).abs() < 1e-12);
        tracker.smooth(-30.0, 3.0);
        assert!((tracker.anchor().unwrap() - 330.0).abs() < 1e-12);
    }

    #[test]
    fn anchor_tracks_unfiltered_value() {
        let mut tracker = CyclicAngleTracker::new(FilterParams::new(0.5, 0.0, 1.0));
        tracker.smooth(0.0, 0.0);
        tracker.smooth(0.0, 0.1);
        let out = tracker.smooth(40.0, 0.2);
        assert!(out < 40.0, "filter should lag, got {out}");
        assert_eq!(tracker.anchor(), Some(40.0));
    }

    #[test]
    fn continuous_rotation_accumulates_past_the_seam() {
        let mut tracker = CyclicAngleTracker::new(FilterParams::new(0.0, 0.0, 1.0));
        let mut raw = 150.0;
        for step in 0..10 {
            tracker.smooth(wrap_degrees(raw), step as f64 * 0.1);
            raw += 15.0;
        }
        // Pass-through filter: anchor is the unwrapped running sum.
        assert!((tracker.anchor().unwrap() - 285.0).abs() < 1e-9);
    }
}
