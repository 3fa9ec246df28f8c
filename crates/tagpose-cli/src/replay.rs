//! Frame replay: JSON-lines detections in, gated position messages out.
//!
//! Each input line is one camera frame:
//!
//! ```text
//! {"timestamp": 12.04, "detections": [{"marker_id": 3, "rotation_vector": [0,0,1.2], "translation_vector": [0.1,0.2,0.9]}]}
//! ```
//!
//! `timestamp` may be omitted, in which case the frame is stamped with the
//! pipeline's [`Clock`] when it is read.

use std::io::BufRead;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::Deserialize;
use tagpose_middleware::{PosePublisher, TrackRegistry, publish_stable};
use tagpose_perception::PoseSmoothingEngine;
use tagpose_perception::clock::Clock;
use tagpose_perception::rotation;
use tagpose_types::{Detection, PoseError, RawObservation, SmoothedPose};
use tracing::{info, warn};

/// One line of replay input.
#[derive(Debug, Clone, Deserialize)]
pub struct FrameRecord {
    #[serde(default)]
    pub timestamp: Option<f64>,
    #[serde(default)]
    pub detections: Vec<Detection>,
}

pub fn parse_frame(line: &str) -> Result<FrameRecord, PoseError> {
    serde_json::from_str(line).map_err(|e| PoseError::Serialization(e.to_string()))
}

/// Totals reported when a replay finishes.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReplaySummary {
    pub frames: u64,
    pub malformed_lines: u64,
    pub published: u64,
    pub rejected_samples: u64,
}

/// Engine → track gating → publisher, one frame at a time.
pub struct Pipeline<P: PosePublisher> {
    engine: PoseSmoothingEngine,
    tracks: TrackRegistry,
    publisher: P,
    clock: Box<dyn Clock>,
    min_ticks: u64,
    topic_prefix: String,
    debug: bool,
    summary: ReplaySummary,
}

impl<P: PosePublisher> Pipeline<P> {
    pub fn new(
        engine: PoseSmoothingEngine,
        publisher: P,
        clock: Box<dyn Clock>,
        min_ticks: u64,
        topic_prefix: impl Into<String>,
    ) -> Self {
        Self {
            engine,
            tracks: TrackRegistry::new(),
            publisher,
            clock,
            min_ticks,
            topic_prefix: topic_prefix.into(),
            debug: false,
            summary: ReplaySummary::default(),
        }
    }

    /// Log every smoothed pose with its raw Euler angles.
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn summary(&self) -> ReplaySummary {
        ReplaySummary {
            rejected_samples: self.engine.stats().rejected,
            ..self.summary
        }
    }

    /// Smooth one frame, update the track registry and publish every stable
    /// track.  Returns the smoothed poses of this frame.
    pub fn run_frame(&mut self, frame: &FrameRecord) -> Result<Vec<SmoothedPose>, PoseError> {
        let poses = match frame.timestamp {
            Some(t) => {
                let observations: Vec<RawObservation> =
                    frame.detections.iter().map(|d| d.at(t)).collect();
                self.engine.process(&observations)
            }
            None => self
                .engine
                .process_detections(&frame.detections, self.clock.as_ref()),
        };
        self.summary.frames += 1;

        if self.debug {
            for pose in &poses {
                let (roll, pitch, _) = rotation::euler_degrees(pose.raw_rotation_vector);
                info!(
                    marker_id = %pose.marker_id,
                    x = pose.position.x,
                    y = pose.position.y,
                    z = pose.position.z,
                    roll,
                    pitch,
                    yaw = pose.yaw_degrees,
                    "pose"
                );
            }
        }

        self.tracks.apply_frame(&poses);
        let published = publish_stable(
            &self.tracks,
            self.min_ticks,
            &self.topic_prefix,
            &mut self.publisher,
        )?;
        self.summary.published += published as u64;
        Ok(poses)
    }

    /// Replay every line of `reader` until EOF or until `shutdown` is set.
    ///
    /// Malformed lines (bad JSON or invalid UTF-8) are logged and skipped;
    /// they never reach the engine.  Read and publisher failures abort the
    /// replay.
    pub fn run<R: BufRead>(
        &mut self,
        mut reader: R,
        shutdown: &AtomicBool,
    ) -> Result<ReplaySummary, PoseError> {
        let mut buf = Vec::new();
        let mut line_no = 0usize;
        loop {
            if shutdown.load(Ordering::SeqCst) {
                info!("shutdown requested, stopping replay");
                break;
            }
            buf.clear();
            let read = reader
                .read_until(b'\n', &mut buf)
                .map_err(|e| PoseError::Io(e.to_string()))?;
            if read == 0 {
                break;
            }
            line_no += 1;

            let line = match std::str::from_utf8(&buf) {
                Ok(line) => line.trim(),
                Err(e) => {
                    warn!(line = line_no, error = %e, "skipping non UTF-8 frame");
                    self.summary.malformed_lines += 1;
                    continue;
                }
            };
            if line.is_empty() {
                continue;
            }
            match parse_frame(line) {
                Ok(frame) => {
                    self.run_frame(&frame)?;
                }
                Err(e) => {
                    warn!(line = line_no, error = %e, "skipping malformed frame");
                    self.summary.malformed_lines += 1;
                }
            }
        }
        Ok(self.summary())
    }
}
