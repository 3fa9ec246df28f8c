//! Per-marker filter state.
//!
//! Every marker id owns three independent [`OneEuroFilter`]s (one per
//! translation axis) and one [`CyclicAngleTracker`] for heading.  Entries are
//! created on first sight and are never shared between ids.

use std::collections::HashMap;

use tagpose_types::{FilterParams, MarkerId};
use tracing::debug;

use crate::angle::CyclicAngleTracker;
use crate::one_euro::OneEuroFilter;

/// The filters belonging to one marker.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerFilters {
    position: [OneEuroFilter; 3],
    yaw: CyclicAngleTracker,
    /// Timestamp of the most recent sample fed to this entry.
    last_seen: f64,
}

impl MarkerFilters {
    fn new(position: FilterParams, yaw: FilterParams, first_seen: f64) -> Self {
        Self {
            position: [
                OneEuroFilter::new(position),
                OneEuroFilter::new(position),
                OneEuroFilter::new(position),
            ],
            yaw: CyclicAngleTracker::new(yaw),
            last_seen: first_seen,
        }
    }

    /// Smooth each translation axis through its own filter.
    pub fn smooth_translation(&mut self, translation: [f64; 3], timestamp: f64) -> [f64; 3] {
        self.last_seen = timestamp;
        let [fx, fy, fz] = &mut self.position;
        [
            fx.apply(translation[0], timestamp),
            fy.apply(translation[1], timestamp),
            fz.apply(translation[2], timestamp),
        ]
    }

    /// Smooth a heading in degrees; the result is in `[-180, 180)`.
    pub fn smooth_yaw(&mut self, raw_degrees: f64, timestamp: f64) -> f64 {
        self.last_seen = timestamp;
        self.yaw.smooth(raw_degrees, timestamp)
    }

    pub fn position_filters(&self) -> &[OneEuroFilter; 3] {
        &self.position
    }

    pub fn yaw_tracker(&self) -> &CyclicAngleTracker {
        &self.yaw
    }

    pub fn last_seen(&self) -> f64 {
        self.last_seen
    }
}

/// Arena of [`MarkerFilters`] keyed by marker id.
#[derive(Debug, Clone)]
pub struct MarkerFilterBank {
    position_params: FilterParams,
    yaw_params: FilterParams,
    entries: HashMap<MarkerId, MarkerFilters>,
}

impl MarkerFilterBank {
    pub fn new(position_params: FilterParams, yaw_params: FilterParams) -> Self {
        Self {
            position_params,
            yaw_params,
            entries: HashMap::new(),
        }
    }

    /// Look up the filters for `marker_id`, creating them on first sight.
    pub fn entry(&mut self, marker_id: MarkerId, timestamp: f64) -> &mut MarkerFilters {
        let (position, yaw) = (self.position_params, self.yaw_params);
        self.entries.entry(marker_id).or_insert_with(|| {
            debug!(%marker_id, "creating filter bank entry");
            MarkerFilters::new(position, yaw, timestamp)
        })
    }

    pub fn get(&self, marker_id: MarkerId) -> Option<&MarkerFilters> {
        self.entries.get(&marker_id)
    }

    pub fn contains(&self, marker_id: MarkerId) -> bool {
        self.entries.contains_key(&marker_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Ids with resident state, in ascending order.
    pub fn marker_ids(&self) -> Vec<MarkerId> {
        let mut ids: Vec<MarkerId> = self.entries.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Drop the state of one marker. Returns `true` if it existed.
    pub fn remove(&mut self, marker_id: MarkerId) -> bool {
        self.entries.remove(&marker_id).is_some()
    }

    /// Drop every entry last fed strictly before `cutoff` seconds.
    ///
    /// Returns the number of entries removed.
    pub fn evict_unseen_since(&mut self, cutoff: f64) -> usize {
        let before = self.entries.len();
        self.entries.retain(|marker_id, filters| {
            let keep = filters.last_seen >= cutoff;
            if !keep {
                debug!(%marker_id, last_seen = filters.last_seen, "evicting stale filter state");
            }
            keep
        });
        before - self.entries.len()
    }
}
