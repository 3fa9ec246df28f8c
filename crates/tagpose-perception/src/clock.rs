//! Time sources for stamping detection frames.
//!
//! The filters only ever see explicit timestamps.  A [`Clock`] is consulted
//! at the boundary, once per frame, when the detector did not supply a
//! capture time of its own.

use std::cell::Cell;

use chrono::Utc;

/// A source of "now" in seconds.
pub trait Clock {
    fn now_secs(&self) -> f64;
}

/// Wall-clock time as seconds since the Unix epoch.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_secs(&self) -> f64 {
        let now = Utc::now();
        now.timestamp() as f64 + f64::from(now.timestamp_subsec_nanos()) * 1e-9
    }
}

/// A clock that only moves when told to. Intended for tests and replays.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Cell<f64>,
}

impl ManualClock {
    pub fn new(start_secs: f64) -> Self {
        Self {
            now: Cell::new(start_secs),
        }
    }

    pub fn set(&self, secs: f64) {
        self.now.set(secs);
    }

    pub fn advance(&self, secs: f64) {
        self.now.set(self.now.get() + secs);
    }
}

impl Clock for ManualClock {
    fn now_secs(&self) -> f64 {
        self.now.get()
    }
}
