//! Trajectory generator

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use comms_if::telem::Control;
use log::trace;
use nalgebra::{Rotation2, Vector2};

use super::{CubicSpline, SplineError, TrajGenParams};
use crate::{
    behav::{EgoState, Maneuver},
    road_map::RoadMap,
    world::WorldModel,
};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Tail points closer than this to the end of the tail don't give a usable heading
const MIN_ANCHOR_SEPARATION_M: f64 = 1e-3;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

pub struct TrajGen {
    params: TrajGenParams,
}

/// A sequence of Cartesian points, one per tick.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Trajectory {
    pub points_m: Vec<Vector2<f64>>,
}

/// Status report of one trajectory generation.
#[derive(Debug, Copy, Clone, Default)]
pub struct StatusReport {
    /// Number of points kept from the previous trajectory
    pub num_retained: usize,

    /// Number of new points appended
    pub num_generated: usize,

    /// Generation stopped before the horizon because the end of the spline was reached
    pub truncated: bool,

    /// Longitudinal spacing of the shape points used
    pub spacing_m: f64,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum TrajGenError {
    #[error("Could not fit a curve through the anchor and shape points: {0}")]
    CurveFit(SplineError),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Trajectory {
    pub fn len(&self) -> usize {
        self.points_m.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points_m.is_empty()
    }

    /// Convert into the message sent to the simulator.
    pub fn to_control(&self) -> Control {
        Control::from_points(self.points_m.iter().map(|p| (p[0], p[1])))
    }
}

impl TrajGen {
    pub fn new(params: TrajGenParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &TrajGenParams {
        &self.params
    }

    /// Extend the unconsumed tail of the last trajectory up to the horizon.
    ///
    /// Returns the state with the speed at the end of the new path updated. On error `state` is
    /// not modified.
    pub fn generate(
        &self,
        road: &RoadMap,
        state: &EgoState,
        world: &WorldModel,
    ) -> Result<(EgoState, Trajectory, StatusReport), TrajGenError> {
        let mut state = *state;
        let mut report = StatusReport::default();
        let tail = &world.tail.points_m;

        // Without a tail we start from wherever the vehicle actually is
        if tail.is_empty() {
            state.speed_at_path_end_ms = world.ego.speed_ms;
        }

        // Two anchors and the heading at the end of the committed path
        let yaw = world.ego.yaw_rad;
        let behind_m = |pos: Vector2<f64>| pos - Vector2::new(yaw.cos(), yaw.sin());

        let (prev_m, anchor_m, heading_rad) = match tail.last() {
            Some(&last) if tail.len() >= 2 => {
                // A path that has come to a stop ends in repeated points, the heading is the one
                // it stopped with
                match tail
                    .iter()
                    .rev()
                    .find(|p| (last - **p).norm() > MIN_ANCHOR_SEPARATION_M)
                {
                    Some(&prev) => {
                        let diff = last - prev;
                        (prev, last, diff[1].atan2(diff[0]))
                    }
                    None => (behind_m(last), last, yaw),
                }
            }
            _ => (behind_m(world.ego.position_m), world.ego.position_m, yaw),
        };

        // Shape points ahead on the target lane's centre line
        report.spacing_m = match state.maneuver {
            Maneuver::KeepLane => self.params.keep_lane_spacing_m,
            Maneuver::ChangingLeft | Maneuver::ChangingRight => self.params.change_lane_spacing_m,
        };
        let anchor_s_m = world.path_end_s();
        let target_d_m = (state.current_lane as f64 + 0.5) * self.params.lane_width_m;

        let shape_m = (1..=3)
            .map(|k| road.to_cartesian(anchor_s_m + k as f64 * report.spacing_m, target_d_m));

        // Move into the anchor frame
        let to_local = Rotation2::new(-heading_rad);
        let (xs, ys): (Vec<f64>, Vec<f64>) = [prev_m, anchor_m]
            .iter()
            .copied()
            .chain(shape_m)
            .map(|p| {
                let local = to_local * (p - anchor_m);
                (local[0], local[1])
            })
            .unzip();

        let spline = CubicSpline::new(&xs, &ys).map_err(TrajGenError::CurveFit)?;
        let (_, max_x_m) = spline.domain();

        // March along the forward axis
        let to_world = Rotation2::new(heading_rad);
        let max_dv_ms = self.params.accel_ms2 * self.params.tick_s;
        let mut points_m = tail.clone();
        let mut x_m = 0.0;

        while points_m.len() < self.params.horizon_len {
            let speed_ms = ramp(state.speed_at_path_end_ms, state.speed_target_ms, max_dv_ms);
            let next_x_m = x_m + speed_ms * self.params.tick_s;

            if next_x_m > max_x_m {
                report.truncated = true;
                break;
            }

            state.speed_at_path_end_ms = speed_ms;
            x_m = next_x_m;
            points_m.push(anchor_m + to_world * Vector2::new(x_m, spline.eval(x_m)));
        }

        report.num_retained = tail.len();
        report.num_generated = points_m.len() - tail.len();

        trace!(
            "Generated {} points after {} retained, end speed {:.2} m/s",
            report.num_generated,
            report.num_retained,
            state.speed_at_path_end_ms
        );

        Ok((state, Trajectory { points_m }, report))
    }
}

/// Move `speed` towards `target` by no more than `max_step`.
fn ramp(speed: f64, target: f64, max_step: f64) -> f64 {
    if speed < target {
        (speed + max_step).min(target)
    } else {
        (speed - max_step).max(target)
    }
}
