//! Behaviour planner state machine

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::{debug, info};
use serde::Serialize;

use super::BehavParams;
use crate::world::WorldModel;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The behaviour planner.
pub struct BehavPlanner {
    pub(super) params: BehavParams,

    /// Length of the road loop, used to measure gaps across the wrap point
    pub(super) track_length_m: f64,
}

/// Decisions carried from one cycle to the next.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct EgoState {
    /// Lane we are in or moving into, 0 is the leftmost lane
    pub current_lane: usize,

    /// Speed the trajectory generator ramps towards
    pub speed_target_ms: f64,

    pub maneuver: Maneuver,

    /// Speed at the last point of the most recently generated trajectory
    pub speed_at_path_end_ms: f64,
}

/// Summary of the decisions made in one call to [`BehavPlanner::plan`].
#[derive(Debug, Copy, Clone, Default)]
pub struct StatusReport {
    /// The lane change that was in progress finished this cycle
    pub maneuver_completed: bool,

    /// The vehicle that forced a slowdown, if any
    pub blocker_id: Option<i64>,

    /// Safety of the left lane, if it was evaluated
    pub left_safe: Option<bool>,

    /// Safety of the right lane, if it was evaluated
    pub right_safe: Option<bool>,

    /// A lane change was started this cycle
    pub lane_change_started: bool,

    /// Our lane was clear and the speed target was reset to the limit
    pub relaxed: bool,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub enum Maneuver {
    KeepLane,
    ChangingLeft,
    ChangingRight,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl EgoState {
    /// Initial state, keeping `lane` from a standstill.
    pub fn new(lane: usize, speed_target_ms: f64) -> Self {
        Self {
            current_lane: lane,
            speed_target_ms,
            maneuver: Maneuver::KeepLane,
            speed_at_path_end_ms: 0.0,
        }
    }
}

impl BehavPlanner {
    pub fn new(params: BehavParams, track_length_m: f64) -> Self {
        Self {
            params,
            track_length_m,
        }
    }

    pub fn params(&self) -> &BehavParams {
        &self.params
    }

    /// Run one cycle of the behaviour planner.
    ///
    /// Processing involves:
    ///  1. Completing any lane change whose path end has reached the new lane
    ///  2. Slowing down for the slowest vehicle close ahead, and if that is too slow, moving into
    ///     the first safe adjacent lane (left before right)
    ///  3. Clamping the speed target to vehicles close ahead in the (possibly new) lane
    ///  4. Relaxing the speed target to the limit if that lane is clear
    pub fn plan(&self, mut state: EgoState, world: &WorldModel) -> (EgoState, StatusReport) {
        let mut report = StatusReport::default();
        let limit_ms = self.params.speed_limit_ms;

        if state.maneuver != Maneuver::KeepLane
            && self.in_complete_band(state.current_lane, world.path_end_d())
        {
            info!(
                "{:?} complete, now in lane {}",
                state.maneuver, state.current_lane
            );
            state.maneuver = Maneuver::KeepLane;
            report.maneuver_completed = true;
        }

        // Slowdown. Only one lane decision can come out of this per cycle, as the maneuver
        // leaves KeepLane as soon as a change starts.
        if let Some(blocker) = self.slowest_ahead(state.current_lane, self.params.near_gap_m, world)
        {
            state.speed_target_ms = state.speed_target_ms.min(blocker.speed_ms);
            report.blocker_id = Some(blocker.id);

            debug!(
                "Vehicle {} is {:.1} m ahead at {:.2} m/s, speed target now {:.2} m/s",
                blocker.id, blocker.gap_m, blocker.speed_ms, state.speed_target_ms
            );

            if state.maneuver == Maneuver::KeepLane
                && state.speed_target_ms < limit_ms - self.params.lane_change_speed_deficit_ms
            {
                self.change_lane(&mut state, world, &mut report);
            }
        }

        // Clamp over the lane we are now targeting
        if let Some(blocker) = self.slowest_ahead(state.current_lane, self.params.near_gap_m, world)
        {
            state.speed_target_ms = state.speed_target_ms.min(blocker.speed_ms);
        }

        if self
            .slowest_ahead(state.current_lane, self.params.far_gap_m, world)
            .is_none()
        {
            state.speed_target_ms = limit_ms;
            report.relaxed = true;
        }

        state.speed_target_ms = state.speed_target_ms.max(0.0).min(limit_ms);

        (state, report)
    }

    /// Move into the first safe adjacent lane, if there is one.
    fn change_lane(&self, state: &mut EgoState, world: &WorldModel, report: &mut StatusReport) {
        let lane = state.current_lane;

        if let Some(left) = lane.checked_sub(1) {
            let safe = self.scan_lane(left, world).is_safe(&self.params);
            report.left_safe = Some(safe);

            if safe {
                self.start_change(state, left, Maneuver::ChangingLeft, report);
                return;
            }
        }

        let right = lane + 1;
        if right < self.params.lane_count {
            let safe = self.scan_lane(right, world).is_safe(&self.params);
            report.right_safe = Some(safe);

            if safe {
                self.start_change(state, right, Maneuver::ChangingRight, report);
                return;
            }
        }

        debug!("No safe lane to move into from lane {}, staying", lane);
    }

    fn start_change(
        &self,
        state: &mut EgoState,
        lane: usize,
        maneuver: Maneuver,
        report: &mut StatusReport,
    ) {
        info!(
            "{:?} from lane {} to lane {} (speed target {:.2} m/s)",
            maneuver, state.current_lane, lane, state.speed_target_ms
        );

        state.current_lane = lane;
        state.maneuver = maneuver;
        report.lane_change_started = true;
    }

    fn in_complete_band(&self, lane: usize, d_m: f64) -> bool {
        let left_m = lane as f64 * self.params.lane_width_m;
        let [min_m, max_m] = self.params.maneuver_complete_band_m;

        d_m > left_m + min_m && d_m < left_m + max_m
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::world::{EgoPose, PathTail, TrackedVehicle};
    use nalgebra::Vector2;

    const TRACK_LENGTH_M: f64 = 6945.554;

    fn params() -> BehavParams {
        BehavParams {
            tick_s: 0.02,
            speed_limit_ms: 22.1,
            lane_width_m: 4.0,
            lane_count: 3,
            near_gap_m: 30.0,
            far_gap_m: 50.0,
            rear_gap_m: 10.0,
            lane_change_speed_deficit_ms: 2.232,
            maneuver_complete_band_m: [1.8, 2.2],
        }
    }

    fn planner() -> BehavPlanner {
        BehavPlanner::new(params(), TRACK_LENGTH_M)
    }

    fn car(id: i64, s_m: f64, lane: usize, speed_ms: f64) -> TrackedVehicle {
        TrackedVehicle {
            id,
            position_m: Vector2::zeros(),
            velocity_ms: Vector2::new(speed_ms, 0.0),
            s_m,
            d_m: 4.0 * lane as f64 + 2.0,
        }
    }

    /// A world with no committed path left, so the path end is the ego itself.
    fn world(s_m: f64, d_m: f64, vehicles: Vec<TrackedVehicle>) -> WorldModel {
        WorldModel {
            ego: EgoPose {
                position_m: Vector2::zeros(),
                s_m,
                d_m,
                yaw_rad: 0.0,
                speed_ms: 20.0,
            },
            tail: PathTail::default(),
            vehicles,
        }
    }

    fn keep(lane: usize, speed_target_ms: f64) -> EgoState {
        EgoState::new(lane, speed_target_ms)
    }

    #[test]
    fn test_relax_when_lane_clears() {
        let p = planner();

        // Blocker 40 m ahead is outside the near gap but inside the far gap
        let w = world(100.0, 6.0, vec![car(1, 140.0, 1, 15.0)]);
        let (state, report) = p.plan(keep(1, 15.0), &w);
        assert_eq!(state.speed_target_ms, 15.0);
        assert!(!report.relaxed);
        assert_eq!(report.blocker_id, None);

        // Once it's out of the far gap we go back to the limit straight away
        let w = world(100.0, 6.0, vec![car(1, 155.0, 1, 15.0)]);
        let (state, report) = p.plan(state, &w);
        assert_eq!(state.speed_target_ms, 22.1);
        assert!(report.relaxed);
    }

    #[test]
    fn test_relax_ignores_other_lanes_and_behind() {
        let w = world(
            100.0,
            6.0,
            vec![car(1, 120.0, 0, 5.0), car(2, 95.0, 1, 5.0), car(3, 120.0, 2, 5.0)],
        );
        let (state, report) = planner().plan(keep(1, 10.0), &w);

        assert_eq!(state.speed_target_ms, 22.1);
        assert_eq!(state.current_lane, 1);
        assert!(report.relaxed);
    }

    #[test]
    fn test_left_preferred() {
        let w = world(100.0, 6.0, vec![car(7, 110.0, 1, 22.1 - 5.0)]);
        let (state, report) = planner().plan(keep(1, 22.1), &w);

        assert_eq!(state.maneuver, Maneuver::ChangingLeft);
        assert_eq!(state.current_lane, 0);
        assert_eq!(report.blocker_id, Some(7));
        assert_eq!(report.left_safe, Some(true));
        assert_eq!(report.right_safe, None);
        assert!(report.lane_change_started);

        // The new lane is clear so we don't need to slow down
        assert_eq!(state.speed_target_ms, 22.1);
    }

    #[test]
    fn test_right_when_left_blocked_ahead() {
        let w = world(
            100.0,
            6.0,
            vec![car(7, 110.0, 1, 15.0), car(8, 140.0, 0, 30.0)],
        );
        let (state, report) = planner().plan(keep(1, 22.1), &w);

        assert_eq!(report.left_safe, Some(false));
        assert_eq!(report.right_safe, Some(true));
        assert_eq!(state.maneuver, Maneuver::ChangingRight);
        assert_eq!(state.current_lane, 2);
    }

    #[test]
    fn test_rear_veto() {
        // Fronts of both adjacent lanes are clear, but someone is just behind in each
        let w = world(
            100.0,
            6.0,
            vec![
                car(7, 110.0, 1, 12.0),
                car(8, 95.0, 0, 25.0),
                car(9, 92.0, 2, 25.0),
            ],
        );
        let (state, report) = planner().plan(keep(1, 22.1), &w);

        assert_eq!(report.left_safe, Some(false));
        assert_eq!(report.right_safe, Some(false));
        assert_eq!(state.maneuver, Maneuver::KeepLane);
        assert_eq!(state.current_lane, 1);
        assert_eq!(state.speed_target_ms, 12.0);
        assert!(!report.relaxed);
    }

    #[test]
    fn test_small_slowdown_keeps_lane() {
        let w = world(100.0, 6.0, vec![car(7, 110.0, 1, 21.0)]);
        let (state, report) = planner().plan(keep(1, 22.1), &w);

        assert_eq!(state.maneuver, Maneuver::KeepLane);
        assert_eq!(state.current_lane, 1);
        assert_eq!(state.speed_target_ms, 21.0);
        assert_eq!(report.left_safe, None);
    }

    #[test]
    fn test_leftmost_lane_only_looks_right() {
        let w = world(100.0, 2.0, vec![car(7, 110.0, 0, 10.0)]);
        let (state, report) = planner().plan(keep(0, 22.1), &w);

        assert_eq!(report.left_safe, None);
        assert_eq!(report.right_safe, Some(true));
        assert_eq!(state.current_lane, 1);
        assert_eq!(state.maneuver, Maneuver::ChangingRight);
    }

    #[test]
    fn test_slowest_blocker_governs() {
        let w = world(
            100.0,
            2.0,
            vec![
                car(1, 105.0, 0, 21.5),
                car(2, 125.0, 0, 21.0),
                car(3, 115.0, 0, 21.8),
            ],
        );
        let (state, report) = planner().plan(keep(0, 22.1), &w);

        assert_eq!(report.blocker_id, Some(2));
        assert_eq!(state.speed_target_ms, 21.0);
    }

    #[test]
    fn test_maneuver_completion() {
        let p = planner();
        let changing = EgoState {
            maneuver: Maneuver::ChangingLeft,
            ..keep(0, 22.1)
        };

        // Path end still between lanes
        let (state, report) = p.plan(changing, &world(100.0, 3.0, vec![]));
        assert_eq!(state.maneuver, Maneuver::ChangingLeft);
        assert!(!report.maneuver_completed);

        // Path end inside the band
        let (state, report) = p.plan(state, &world(100.0, 2.0, vec![]));
        assert_eq!(state.maneuver, Maneuver::KeepLane);
        assert_eq!(state.current_lane, 0);
        assert!(report.maneuver_completed);

        // And without a new blocker we stay put
        let (state, report) = p.plan(state, &world(100.0, 2.0, vec![]));
        assert_eq!(state.maneuver, Maneuver::KeepLane);
        assert_eq!(state.current_lane, 0);
        assert!(!report.lane_change_started);
    }

    #[test]
    fn test_no_decision_mid_maneuver() {
        let changing = EgoState {
            maneuver: Maneuver::ChangingRight,
            ..keep(1, 22.1)
        };

        // Path end still in lane 0, far from the band of lane 1
        let w = world(100.0, 3.5, vec![car(7, 110.0, 1, 10.0)]);
        let (state, report) = planner().plan(changing, &w);

        assert_eq!(state.maneuver, Maneuver::ChangingRight);
        assert_eq!(state.current_lane, 1);
        assert_eq!(state.speed_target_ms, 10.0);
        assert_eq!(report.left_safe, None);
        assert_eq!(report.right_safe, None);
    }

    #[test]
    fn test_scan_lane() {
        let w = world(
            100.0,
            6.0,
            vec![
                car(1, 180.0, 0, 20.0),
                car(2, 130.0, 0, 20.0),
                car(3, 60.0, 0, 20.0),
                car(4, 85.0, 0, 20.0),
                car(5, 100.0, 0, 20.0),
                car(6, 101.0, 1, 20.0),
            ],
        );
        let gap = planner().scan_lane(0, &w);

        assert_eq!(gap.front.map(|b| b.id), Some(2));
        assert_eq!(gap.rear.map(|b| b.id), Some(4));
        assert!((gap.rear.unwrap().gap_m + 15.0).abs() < 1e-9);
    }

    #[test]
    fn test_vehicles_projected_to_path_end() {
        // With 50 points of committed path left each vehicle moves on by a second
        let mut w = world(100.0, 6.0, vec![car(1, 95.0, 1, 20.0)]);
        w.tail = PathTail {
            points_m: vec![Vector2::zeros(); 50],
            end_s_m: 100.0,
            end_d_m: 6.0,
        };

        let gap = planner().scan_lane(1, &w);
        let front = gap.front.unwrap();
        assert!((front.future_s_m - 115.0).abs() < 1e-9);
        assert!((front.gap_m - 15.0).abs() < 1e-9);
        assert_eq!(gap.rear, None);
    }

    #[test]
    fn test_gaps_across_track_wrap() {
        let w = world(
            TRACK_LENGTH_M - 5.0,
            6.0,
            vec![car(1, 10.0, 1, 15.0), car(2, TRACK_LENGTH_M - 10.0, 0, 15.0)],
        );
        let p = planner();

        let ahead = p.scan_lane(1, &w).front.unwrap();
        assert!((ahead.gap_m - 15.0).abs() < 1e-6);

        let behind = p.scan_lane(0, &w).rear.unwrap();
        assert!((behind.gap_m + 5.0).abs() < 1e-6);
    }
}
