//! Adaptive scalar low-pass filter ("One Euro" filter, Casiez et al. 2012).
//!
//! Smooths a single real-valued signal sampled at irregular timestamps.  The
//! cutoff frequency grows with the estimated speed of the signal:
//!
//! ```text
//! cutoff = min_cutoff + beta * |dx_hat|
//! ```
//!
//! so the output is heavily smoothed while the marker is still (low jitter)
//! and follows closely while it moves (low lag).
//!
//! # Example
//!
//! ```rust
//! use tagpose_perception::one_euro::OneEuroFilter;
//! use tagpose_types::FilterParams;
//!
//! let mut filter = OneEuroFilter::new(FilterParams::new(1.0, 0.0, 1.0));
//! assert_eq!(filter.apply(0.0, 0.0), 0.0); // first sample passes through
//!
//! let out = filter.apply(10.0, 1.0);
//! assert!(out > 0.0 && out < 10.0);
//! ```

use std::f64::consts::PI;

use tagpose_types::FilterParams;
use tracing::trace;

/// Substitute for a non-positive time step (seconds).
///
/// Repeated or backwards timestamps are clamped to this value instead of
/// being rejected, so clock jitter never stalls the filter.
pub const MIN_DT: f64 = 1e-6;

/// Smoothing factor of a first-order low-pass filter with the given cutoff
/// frequency, sampled `dt` seconds after the previous sample.
///
/// Non-positive (or `NaN`) cutoffs yield `1.0`: the input passes through.
pub fn alpha(dt: f64, cutoff: f64) -> f64 {
    if !(cutoff > 0.0) {
        return 1.0;
    }
    let tau = 1.0 / (2.0 * PI * cutoff);
    1.0 / (1.0 + tau / dt)
}

/// Memory of an [`OneEuroFilter`] between samples.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScalarFilterState {
    pub last_value: f64,
    pub last_derivative: f64,
    pub last_timestamp: f64,
}

/// Single-signal adaptive low-pass filter.
#[derive(Debug, Clone, PartialEq)]
pub struct OneEuroFilter {
    params: FilterParams,
    /// `None` until the first sample; never reverts afterwards.
    state: Option<ScalarFilterState>,
}

impl OneEuroFilter {
    pub fn new(params: FilterParams) -> Self {
        Self {
            params,
            state: None,
        }
    }

    pub fn params(&self) -> FilterParams {
        self.params
    }

    /// Current state, or `None` before the first sample.
    pub fn state(&self) -> Option<ScalarFilterState> {
        self.state
    }

    pub fn has_prior(&self) -> bool {
        self.state.is_some()
    }

    /// Filter `value` observed at `timestamp` (seconds) and return the
    /// smoothed estimate.
    ///
    /// The first sample initialises the state and is returned unchanged.
    pub fn apply(&mut self, value: f64, timestamp: f64) -> f64 {
        let Some(prev) = self.state else {
            self.state = Some(ScalarFilterState {
                last_value: value,
                last_derivative: 0.0,
                last_timestamp: timestamp,
            });
            return value;
        };

        let mut dt = timestamp - prev.last_timestamp;
        if dt <= 0.0 {
            trace!(dt, "non-increasing timestamp, clamping dt");
            dt = MIN_DT;
        }

        let dx = (value - prev.last_value) / dt;
        let alpha_d = alpha(dt, self.params.d_cutoff);
        let dx_hat = alpha_d * dx + (1.0 - alpha_d) * prev.last_derivative;

        let cutoff = self.params.min_cutoff + self.params.beta * dx_hat.abs();
        let a = alpha(dt, cutoff);
        let x_hat = a * value + (1.0 - a) * prev.last_value;

        self.state = Some(ScalarFilterState {
            last_value: x_hat,
            last_derivative: dx_hat,
            last_timestamp: timestamp,
        });
        x_hat
    }
}
