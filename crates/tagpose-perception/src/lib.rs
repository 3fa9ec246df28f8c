//! `tagpose-perception` – temporal smoothing of fiducial marker poses.
//!
//! Turns jittery per-frame 6-DOF marker observations into stable position
//! and heading signals a control loop can act on.
//!
//! # Modules
//!
//! - [`one_euro`] – [`OneEuroFilter`][one_euro::OneEuroFilter]: adaptive
//!   low-pass filter for a single scalar signal.
//! - [`angle`] – [`CyclicAngleTracker`][angle::CyclicAngleTracker]: unwraps a
//!   heading so it can be filtered across the ±180° seam.
//! - [`rotation`] – Rodrigues rotation matrix, yaw and Euler extraction.
//! - [`bank`] – [`MarkerFilterBank`][bank::MarkerFilterBank]: per-marker
//!   filter state, created lazily.
//! - [`engine`] – [`PoseSmoothingEngine`][engine::PoseSmoothingEngine]:
//!   processes one frame of observations into smoothed poses.
//! - [`clock`] – injectable time sources for stamping frames.

pub mod angle;
pub mod bank;
pub mod clock;
pub mod engine;
pub mod one_euro;
pub mod rotation;

pub use engine::{EngineStats, PoseSmoothingEngine};
