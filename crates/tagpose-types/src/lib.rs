use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Identity of a physical fiducial marker (and the robot carrying it).
///
/// Assigned externally by the marker dictionary; the pose core treats it as
/// an opaque key.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
#[serde(transparent)]
pub struct MarkerId(pub u32);

impl std::fmt::Display for MarkerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for MarkerId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

/// A marker pose as delivered by the pose solver, before a timestamp has
/// been attached.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub marker_id: MarkerId,
    /// Axis-angle rotation (direction = axis, magnitude = angle in radians).
    pub rotation_vector: [f64; 3],
    /// Marker origin in the camera frame (metres).
    pub translation_vector: [f64; 3],
}

impl Detection {
    /// Attach a frame timestamp (seconds) to this detection.
    pub fn at(self, timestamp: f64) -> RawObservation {
        RawObservation {
            marker_id: self.marker_id,
            rotation_vector: self.rotation_vector,
            translation_vector: self.translation_vector,
            timestamp,
        }
    }
}

/// One timestamped 6-DOF sample for one marker in one frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawObservation {
    pub marker_id: MarkerId,
    pub rotation_vector: [f64; 3],
    pub translation_vector: [f64; 3],
    /// Frame time in seconds.
    pub timestamp: f64,
}

impl RawObservation {
    pub fn new(
        marker_id: impl Into<MarkerId>,
        rotation_vector: [f64; 3],
        translation_vector: [f64; 3],
        timestamp: f64,
    ) -> Self {
        Self {
            marker_id: marker_id.into(),
            rotation_vector,
            translation_vector,
            timestamp,
        }
    }

    /// Reject samples carrying `NaN` or infinite components.
    ///
    /// A single non-finite value written into a filter's prior would poison
    /// that marker's state for the rest of the process lifetime, so such
    /// samples must never reach the filter bank.
    pub fn validate(&self) -> Result<(), PoseError> {
        let field = if !self.timestamp.is_finite() {
            Some("timestamp")
        } else if self.rotation_vector.iter().any(|v| !v.is_finite()) {
            Some("rotation_vector")
        } else if self.translation_vector.iter().any(|v| !v.is_finite()) {
            Some("translation_vector")
        } else {
            None
        };

        match field {
            Some(field) => Err(PoseError::NonFiniteSample {
                marker_id: self.marker_id,
                field: field.to_string(),
            }),
            None => Ok(()),
        }
    }
}

/// Cartesian position in the camera frame (metres).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// Filtered pose of one marker for one frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SmoothedPose {
    pub marker_id: MarkerId,
    pub position: Position,
    /// Smoothed heading in degrees, always in `[-180, 180)`.
    pub yaw_degrees: f64,
    /// Euclidean norm of the smoothed translation.
    pub distance: f64,
    /// Rotation vector exactly as observed (not smoothed).
    pub raw_rotation_vector: [f64; 3],
    pub smoothed_translation_vector: [f64; 3],
}

/// Tuning constants for one adaptive low-pass filter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FilterParams {
    /// Baseline cutoff frequency (Hz). Lower values smooth harder at rest.
    /// Values `<= 0` turn the filter into a pass-through.
    pub min_cutoff: f64,
    /// Speed coefficient. Higher values reduce lag during fast motion.
    pub beta: f64,
    /// Cutoff frequency (Hz) used when smoothing the derivative estimate.
    pub d_cutoff: f64,
}

impl FilterParams {
    pub fn new(min_cutoff: f64, beta: f64, d_cutoff: f64) -> Self {
        Self {
            min_cutoff,
            beta,
            d_cutoff,
        }
    }

    /// Check that the constants cannot inject `NaN` into filter state.
    ///
    /// Non-positive cutoffs are accepted; they mean "no smoothing".
    pub fn validate(&self, name: &str) -> Result<(), PoseError> {
        if self.min_cutoff.is_nan() || self.d_cutoff.is_nan() {
            return Err(PoseError::InvalidConfig(format!("{name}: cutoff must not be NaN")));
        }
        if !self.beta.is_finite() || self.beta < 0.0 {
            return Err(PoseError::InvalidConfig(format!(
                "{name}: beta must be finite and >= 0, got {}",
                self.beta
            )));
        }
        Ok(())
    }
}

impl Default for FilterParams {
    fn default() -> Self {
        Self::new(0.5, 0.01, 5.0)
    }
}

/// What to do with filter state for markers that stop being observed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum EvictionPolicy {
    /// Keep every marker's state for the lifetime of the engine. A marker
    /// that reappears resumes from its old state.
    #[default]
    Never,
    /// Drop a marker's state once it has not been observed for `secs`
    /// seconds of frame time. A marker that reappears later restarts cold.
    UnseenFor { secs: f64 },
}

/// Construction-time configuration of the smoothing engine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SmoothingConfig {
    #[serde(default)]
    pub position: FilterParams,
    #[serde(default)]
    pub yaw: FilterParams,
    /// Legacy history-length hint. Not used by the filtering math.
    #[serde(default = "default_history_len")]
    pub history_len: usize,
    #[serde(default)]
    pub eviction: EvictionPolicy,
}

fn default_history_len() -> usize {
    5
}

impl SmoothingConfig {
    pub fn validate(&self) -> Result<(), PoseError> {
        self.position.validate("position")?;
        self.yaw.validate("yaw")?;
        if let EvictionPolicy::UnseenFor { secs } = self.eviction
            && (secs.is_nan() || secs < 0.0)
        {
            return Err(PoseError::InvalidConfig(format!(
                "eviction: secs must be >= 0, got {secs}"
            )));
        }
        Ok(())
    }
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self {
            position: FilterParams::default(),
            yaw: FilterParams::default(),
            history_len: default_history_len(),
            eviction: EvictionPolicy::default(),
        }
    }
}

/// Planar position message consumed by the arena dashboard and the
/// neighbourhood service.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PositionMessage {
    /// Arena X (camera X, sign flipped).
    pub x: f64,
    /// Arena Y (camera Y, sign flipped).
    pub y: f64,
    /// Heading in radians.
    pub orientation: f64,
    pub robot_id: MarkerId,
}

impl From<&SmoothedPose> for PositionMessage {
    fn from(pose: &SmoothedPose) -> Self {
        Self {
            x: -pose.position.x,
            y: -pose.position.y,
            orientation: pose.yaw_degrees.to_radians(),
            robot_id: pose.marker_id,
        }
    }
}

/// Topic a marker's position is published on, e.g. `robot/7/position`.
pub fn position_topic(prefix: &str, marker_id: MarkerId) -> String {
    format!("{prefix}{marker_id}/position")
}

/// Errors raised around the filtering core: configuration, input validation
/// and publication. The filters themselves never fail.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PoseError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Non-finite {field} for marker {marker_id}")]
    NonFiniteSample { marker_id: MarkerId, field: String },

    #[error("Serialization Error: {0}")]
    Serialization(String),

    #[error("Channel Error: {0}")]
    Channel(String),

    #[error("I/O Error: {0}")]
    Io(String),
}
