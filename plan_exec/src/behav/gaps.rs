//! Finding the vehicles that block a lane

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::cmp::Ordering;

use util::maths::wrap;

use super::{BehavPlanner, BehavParams};
use crate::world::{TrackedVehicle, WorldModel};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A vehicle relevant to a decision, copied out of the world model.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Blocker {
    pub id: i64,

    /// Extrapolated position of the vehicle when we reach the end of the committed path
    pub future_s_m: f64,

    /// Signed distance from the end of the committed path to `future_s_m`, positive ahead
    pub gap_m: f64,

    pub speed_ms: f64,
}

/// The nearest vehicles either side of us in a lane.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct LaneGap {
    pub front: Option<Blocker>,
    pub rear: Option<Blocker>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl LaneGap {
    /// Whether the gap is large enough to move into.
    pub fn is_safe(&self, params: &BehavParams) -> bool {
        let front_ok = self.front.map_or(true, |b| b.gap_m > params.far_gap_m);
        let rear_ok = self.rear.map_or(true, |b| -b.gap_m > params.rear_gap_m);

        front_ok && rear_ok
    }
}

impl BehavPlanner {
    /// Find the nearest vehicles ahead of and behind the end of the committed path in `lane`.
    ///
    /// Vehicles level with the end of the path are neither.
    pub fn scan_lane(&self, lane: usize, world: &WorldModel) -> LaneGap {
        let mut gap = LaneGap::default();

        for b in self.blockers_in_lane(lane, world) {
            if b.gap_m > 0.0 {
                if gap.front.map_or(true, |f| b.gap_m < f.gap_m) {
                    gap.front = Some(b);
                }
            } else if b.gap_m < 0.0 && gap.rear.map_or(true, |r| b.gap_m > r.gap_m) {
                gap.rear = Some(b);
            }
        }

        gap
    }

    /// The slowest vehicle strictly ahead in `lane` and closer than `within_m`.
    pub(super) fn slowest_ahead(
        &self,
        lane: usize,
        within_m: f64,
        world: &WorldModel,
    ) -> Option<Blocker> {
        self.blockers_in_lane(lane, world)
            .filter(|b| b.gap_m > 0.0 && b.gap_m < within_m)
            .min_by(|a, b| a.speed_ms.partial_cmp(&b.speed_ms).unwrap_or(Ordering::Equal))
    }

    fn blockers_in_lane<'a>(
        &'a self,
        lane: usize,
        world: &'a WorldModel,
    ) -> impl Iterator<Item = Blocker> + 'a {
        let end_s_m = world.path_end_s();
        let dt_s = world.horizon_dt(self.params.tick_s);

        world
            .vehicles
            .iter()
            .filter(move |v| v.is_in_lane(lane, self.params.lane_width_m))
            .map(move |v| self.blocker(v, end_s_m, dt_s))
    }

    fn blocker(&self, vehicle: &TrackedVehicle, end_s_m: f64, dt_s: f64) -> Blocker {
        let future_s_m = vehicle.future_s(dt_s);

        // Shortest signed distance around the loop
        let half_track_m = 0.5 * self.track_length_m;
        let gap_m = wrap(future_s_m - end_s_m + half_track_m, self.track_length_m) - half_track_m;

        Blocker {
            id: vehicle.id,
            future_s_m,
            gap_m,
            speed_ms: vehicle.speed_ms(),
        }
    }
}
