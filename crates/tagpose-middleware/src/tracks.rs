//! Stable-track gating.
//!
//! A marker seen for a single frame is often a false detection.  The
//! [`TrackRegistry`] counts consecutive sightings and only exposes tracks
//! that have survived more than `min_ticks` frames.

use std::collections::{BTreeMap, HashSet};

use tagpose_types::{MarkerId, SmoothedPose};

/// Latest pose of one marker plus its consecutive-sighting count.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Track {
    pub pose: SmoothedPose,
    pub ticks: u64,
}

#[derive(Debug, Default, Clone)]
pub struct TrackRegistry {
    tracks: BTreeMap<MarkerId, Track>,
}

impl TrackRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record this frame's pose for its marker and bump its tick count.
    pub fn update(&mut self, pose: SmoothedPose) {
        self.tracks
            .entry(pose.marker_id)
            .and_modify(|track| {
                track.pose = pose;
                track.ticks += 1;
            })
            .or_insert(Track { pose, ticks: 1 });
    }

    /// Forget every track not in `observed`.
    pub fn retain_only(&mut self, observed: &[MarkerId]) {
        let observed: HashSet<MarkerId> = observed.iter().copied().collect();
        self.tracks.retain(|id, _| observed.contains(id));
    }

    /// Apply one frame: update every pose, then drop tracks that were not
    /// part of it.
    pub fn apply_frame(&mut self, poses: &[SmoothedPose]) {
        for pose in poses {
            self.update(*pose);
        }
        let observed: Vec<MarkerId> = poses.iter().map(|p| p.marker_id).collect();
        self.retain_only(&observed);
    }

    /// Tracks seen in more than `min_ticks` consecutive frames, by marker id.
    pub fn stable(&self, min_ticks: u64) -> impl Iterator<Item = &Track> {
        self.tracks.values().filter(move |t| t.ticks > min_ticks)
    }

    pub fn get(&self, marker_id: MarkerId) -> Option<&Track> {
        self.tracks.get(&marker_id)
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tagpose_types::Position;

    fn pose(id: u32, x: f64) -> SmoothedPose {
        SmoothedPose {
            marker_id: MarkerId(id),
            position: Position { x, y: 0.0, z: 1.0 },
            yaw_degrees: 0.0,
            distance: 1.0,
            raw_rotation_vector: [0.0; 3],
            smoothed_translation_vector: [x, 0.0, 1.0],
        }
    }

    #[test]
    fn update_counts_ticks_and_keeps_latest_pose() {
        let mut reg = TrackRegistry::new();
        reg.update(pose(1, 0.1));
        reg.update(pose(1, 0.2));
        let track = reg.get(MarkerId(1)).unwrap();
        assert_eq!(track.ticks, 2);
        assert_eq!(track.pose.position.x, 0.2);
    }

    #[test]
    fn stable_requires_strictly_more_than_min_ticks() {
        let mut reg = TrackRegistry::new();
        for _ in 0..5 {
            reg.apply_frame(&[pose(1, 0.0)]);
        }
        assert_eq!(reg.stable(5).count(), 0);
        reg.apply_frame(&[pose(1, 0.0)]);
        assert_eq!(reg.stable(5).count(), 1);
    }

    #[test]
    fn missing_marker_loses_its_ticks() {
        let mut reg = TrackRegistry::new();
        for _ in 0..3 {
            reg.apply_frame(&[pose(1, 0.0), pose(2, 0.0)]);
        }
        reg.apply_frame(&[pose(1, 0.0)]);
        assert!(reg.get(MarkerId(2)).is_none());

        reg.apply_frame(&[pose(1, 0.0), pose(2, 0.0)]);
        assert_eq!(reg.get(MarkerId(2)).unwrap().ticks, 1);
        assert_eq!(reg.get(MarkerId(1)).unwrap().ticks, 5);
    }

    #[test]
    fn stable_tracks_are_ordered_by_id() {
        let mut reg = TrackRegistry::new();
        reg.apply_frame(&[pose(8, 0.0), pose(3, 0.0), pose(5, 0.0)]);
        let ids: Vec<u32> = reg.stable(0).map(|t| t.pose.marker_id.0).collect();
        assert_eq!(ids, vec![3, 5, 8]);
    }

    #[test]
    fn empty_frame_clears_registry() {
        let mut reg = TrackRegistry::new();
        reg.apply_frame(&[pose(1, 0.0)]);
        reg.apply_frame(&[]);
        assert!(reg.is_empty());
    }
}
