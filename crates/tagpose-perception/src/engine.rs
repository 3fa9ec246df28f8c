//! Pose Smoothing Engine.
//!
//! Turns one frame of raw marker observations into smoothed poses:
//!
//! 1. look up (or create) the marker's [`MarkerFilters`],
//! 2. read the heading off the rotation vector,
//! 3. smooth x, y, z and yaw, all keyed to the observation timestamp,
//! 4. compute the distance from the *smoothed* translation.
//!
//! Output order follows input order.  Markers absent from a frame produce
//! nothing and keep their state (unless an [`EvictionPolicy`] says
//! otherwise).  The engine is single-writer: callers feeding it from several
//! threads must serialise access to [`PoseSmoothingEngine::process`].
//!
//! # Example
//!
//! ```rust
//! use tagpose_perception::engine::PoseSmoothingEngine;
//! use tagpose_types::{RawObservation, SmoothingConfig};
//!
//! let mut engine = PoseSmoothingEngine::new(SmoothingConfig::default()).unwrap();
//! let poses = engine.process(&[RawObservation::new(3, [0.0; 3], [1.0, 2.0, 2.0], 0.0)]);
//!
//! assert_eq!(poses.len(), 1);
//! assert!((poses[0].distance - 3.0).abs() < 1e-12);
//! ```

use tagpose_types::{
    Detection, EvictionPolicy, Position, PoseError, RawObservation, SmoothedPose, SmoothingConfig,
};
use tracing::{debug, trace, warn};

use crate::bank::{MarkerFilterBank, MarkerFilters};
use crate::clock::Clock;
use crate::rotation;

/// Running counters, useful for end-of-run summaries.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct EngineStats {
    pub frames: u64,
    pub accepted: u64,
    pub rejected: u64,
    pub evicted: u64,
}

/// Per-session smoothing engine owning every marker's filter state.
#[derive(Debug, Clone)]
pub struct PoseSmoothingEngine {
    config: SmoothingConfig,
    bank: MarkerFilterBank,
    stats: EngineStats,
}

impl PoseSmoothingEngine {
    /// Create an engine after validating `config`.
    pub fn new(config: SmoothingConfig) -> Result<Self, PoseError> {
        config.validate()?;
        Ok(Self {
            bank: MarkerFilterBank::new(config.position, config.yaw),
            config,
            stats: EngineStats::default(),
        })
    }

    pub fn config(&self) -> &SmoothingConfig {
        &self.config
    }

    pub fn bank(&self) -> &MarkerFilterBank {
        &self.bank
    }

    pub fn stats(&self) -> EngineStats {
        self.stats
    }

    /// Smooth one frame of observations.
    ///
    /// Observations with non-finite components are dropped before they can
    /// touch filter state; they produce no output.  Callers must supply at
    /// most one observation per marker per frame.
    pub fn process(&mut self, observations: &[RawObservation]) -> Vec<SmoothedPose> {
        self.stats.frames += 1;

        let mut accepted = Vec::with_capacity(observations.len());
        for obs in observations {
            match obs.validate() {
                Ok(()) => accepted.push(obs),
                Err(e) => {
                    warn!(marker_id = %obs.marker_id, error = %e, "rejecting observation");
                    self.stats.rejected += 1;
                }
            }
        }
        self.evict_stale(&accepted);

        let poses: Vec<SmoothedPose> = accepted
            .into_iter()
            .map(|obs| {
                let filters = self.bank.entry(obs.marker_id, obs.timestamp);
                smooth_observation(filters, obs)
            })
            .collect();
        self.stats.accepted += poses.len() as u64;
        trace!(observed = observations.len(), emitted = poses.len(), "frame processed");
        poses
    }

    /// Stamp every detection with a single reading of `clock`, then
    /// [`process`](Self::process) them as one frame.
    pub fn process_detections(
        &mut self,
        detections: &[Detection],
        clock: &dyn Clock,
    ) -> Vec<SmoothedPose> {
        let now = clock.now_secs();
        let observations: Vec<RawObservation> =
            detections.iter().map(|d| d.at(now)).collect();
        self.process(&observations)
    }

    /// Frame time is the newest timestamp among `accepted`; rejected
    /// observations never drive eviction.
    fn evict_stale(&mut self, accepted: &[&RawObservation]) {
        let EvictionPolicy::UnseenFor { secs } = self.config.eviction else {
            return;
        };
        let frame_time = accepted
            .iter()
            .map(|o| o.timestamp)
            .fold(f64::NEG_INFINITY, f64::max);
        if !frame_time.is_finite() {
            return;
        }

        let evicted = self.bank.evict_unseen_since(frame_time - secs);
        if evicted > 0 {
            debug!(evicted, frame_time, "evicted stale markers");
            self.stats.evicted += evicted as u64;
        }
    }
}

fn smooth_observation(filters: &mut MarkerFilters, obs: &RawObservation) -> SmoothedPose {
    let raw_yaw = rotation::yaw_degrees(obs.rotation_vector);
    let [x, y, z] = filters.smooth_translation(obs.translation_vector, obs.timestamp);
    let yaw_degrees = filters.smooth_yaw(raw_yaw, obs.timestamp);

    SmoothedPose {
        marker_id: obs.marker_id,
        position: Position { x, y, z },
        yaw_degrees,
        distance: (x * x + y * y + z * z).sqrt(),
        raw_rotation_vector: obs.rotation_vector,
        smoothed_translation_vector: [x, y, z],
    }
}
