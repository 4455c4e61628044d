//! Per-cycle status and archive records

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Serialize;

use crate::{
    behav::{self, EgoState, Maneuver},
    traj_gen,
    world::WorldModel,
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Status of one full planning cycle.
#[derive(Debug, Copy, Clone, Default)]
pub struct StatusReport {
    /// Number of the cycle, starting at 0
    pub cycle: u64,

    pub behav: behav::StatusReport,

    pub traj_gen: traj_gen::StatusReport,

    /// No curve could be fitted, only the committed path was sent
    pub curve_fit_failed: bool,
}

/// One row of the cycle archive.
#[derive(Debug, Serialize)]
pub struct CycleRecord {
    pub cycle: u64,
    pub elapsed_s: f64,

    pub ego_s_m: f64,
    pub ego_d_m: f64,
    pub ego_speed_ms: f64,
    pub path_end_s_m: f64,
    pub path_end_d_m: f64,
    pub num_vehicles: usize,

    pub lane: usize,
    pub maneuver: Maneuver,
    pub speed_target_ms: f64,
    pub speed_at_path_end_ms: f64,

    pub blocker_id: Option<i64>,
    pub lane_change_started: bool,
    pub maneuver_completed: bool,

    pub num_retained: usize,
    pub num_generated: usize,
    pub truncated: bool,
    pub curve_fit_failed: bool,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl CycleRecord {
    pub fn new(world: &WorldModel, state: &EgoState, report: &StatusReport) -> Self {
        Self {
            cycle: report.cycle,
            elapsed_s: util::session::get_elapsed_seconds(),
            ego_s_m: world.ego.s_m,
            ego_d_m: world.ego.d_m,
            ego_speed_ms: world.ego.speed_ms,
            path_end_s_m: world.path_end_s(),
            path_end_d_m: world.path_end_d(),
            num_vehicles: world.vehicles.len(),
            lane: state.current_lane,
            maneuver: state.maneuver,
            speed_target_ms: state.speed_target_ms,
            speed_at_path_end_ms: state.speed_at_path_end_ms,
            blocker_id: report.behav.blocker_id,
            lane_change_started: report.behav.lane_change_started,
            maneuver_completed: report.behav.maneuver_completed,
            num_retained: report.traj_gen.num_retained,
            num_generated: report.traj_gen.num_generated,
            truncated: report.traj_gen.truncated,
            curve_fit_failed: report.curve_fit_failed,
        }
    }
}
