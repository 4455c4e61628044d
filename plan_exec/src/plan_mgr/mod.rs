//! # Plan manager module
//!
//! The plan manager runs one full planning cycle for each telemetry message: it builds the world
//! model, lets the behaviour planner update the lane and speed decisions, and has the trajectory
//! generator extend the committed path. It owns the [`EgoState`] carried between cycles, which is
//! only replaced once a cycle has produced a trajectory. A message that can't be turned into a
//! world model leaves it untouched.
//!
//! One manager serves one vehicle. The road map is shared read-only, so several managers may
//! use the same map.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod params;
mod record;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::sync::Arc;

use comms_if::telem::Telemetry;
use log::{debug, warn};
use util::{
    archive::{ArchiveError, Archiver},
    params::{self as param_files, LoadError},
    session::Session,
};

pub use params::PlanMgrParams;
pub use record::{CycleRecord, StatusReport};

use crate::{
    behav::{BehavPlanner, EgoState},
    road_map::RoadMap,
    traj_gen::{self, TrajGen, Trajectory},
    world::{WorldModel, WorldModelError},
};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Path of the cycle archive, relative to the session's archive root.
const CYCLE_ARCHIVE_PATH: &str = "plan_mgr/cycles.csv";

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

pub struct PlanMgr {
    road: Arc<RoadMap>,

    behav: BehavPlanner,

    traj_gen: TrajGen,

    ego_speed_scale: f64,

    /// Decisions carried between cycles
    state: EgoState,

    /// Number of cycles completed so far
    num_cycles: u64,

    archiver: Option<Archiver>,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum PlanMgrError {
    #[error("Could not load parameters: {0}")]
    ParamLoadError(LoadError),

    #[error("Invalid parameters: {0}")]
    InvalidParams(String),

    #[error("Could not create the cycle archive: {0}")]
    ArchiveError(ArchiveError),

    #[error("Invalid telemetry, cycle skipped: {0}")]
    InvalidTelemetry(WorldModelError),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl PlanMgr {
    /// Initialise the plan manager from a parameter file, archiving cycles into the session.
    pub fn init(
        params_path: &str,
        road: Arc<RoadMap>,
        session: &Session,
    ) -> Result<Self, PlanMgrError> {
        let params: PlanMgrParams =
            param_files::load(params_path).map_err(PlanMgrError::ParamLoadError)?;

        let mut plan_mgr = Self::new(params, road)?;

        let archiver = Archiver::from_path(session, CYCLE_ARCHIVE_PATH)
            .map_err(PlanMgrError::ArchiveError)?;
        plan_mgr.set_archiver(archiver);

        Ok(plan_mgr)
    }

    /// Create a new plan manager without an archive.
    pub fn new(params: PlanMgrParams, road: Arc<RoadMap>) -> Result<Self, PlanMgrError> {
        validate(&params)?;

        let state = EgoState::new(params.initial_lane, params.initial_speed_target_ms);

        Ok(Self {
            behav: BehavPlanner::new(params.behav, road.max_s_m()),
            traj_gen: TrajGen::new(params.traj_gen),
            road,
            ego_speed_scale: params.ego_speed_scale,
            state,
            num_cycles: 0,
            archiver: None,
        })
    }

    /// Archive every following cycle with the given archiver.
    pub fn set_archiver(&mut self, archiver: Archiver) {
        self.archiver = Some(archiver);
    }

    /// The decisions carried into the next cycle.
    pub fn ego_state(&self) -> &EgoState {
        &self.state
    }

    pub fn road(&self) -> &Arc<RoadMap> {
        &self.road
    }

    /// Run one planning cycle.
    ///
    /// If the telemetry is invalid an error is returned and the state isn't changed. If no curve
    /// can be fitted for the new part of the path the committed path is returned on its own.
    pub fn proc(&mut self, telem: &Telemetry) -> Result<(Trajectory, StatusReport), PlanMgrError> {
        let world = WorldModel::from_telemetry(telem, self.ego_speed_scale)
            .map_err(PlanMgrError::InvalidTelemetry)?;

        let mut report = StatusReport {
            cycle: self.num_cycles,
            ..Default::default()
        };

        let (state, behav_report) = self.behav.plan(self.state, &world);
        report.behav = behav_report;

        let (state, traj) = match self.traj_gen.generate(&self.road, &state, &world) {
            Ok((s, t, r)) => {
                report.traj_gen = r;
                (s, t)
            }
            Err(e) => {
                warn!("{}, sending the committed path only", e);
                report.curve_fit_failed = true;
                report.traj_gen = traj_gen::StatusReport {
                    num_retained: world.tail.points_m.len(),
                    ..Default::default()
                };
                (
                    state,
                    Trajectory {
                        points_m: world.tail.points_m.clone(),
                    },
                )
            }
        };

        debug!(
            "Cycle {}: lane {} {:?}, speed target {:.2} m/s, path end speed {:.2} m/s, {} + {} points",
            report.cycle,
            state.current_lane,
            state.maneuver,
            state.speed_target_ms,
            state.speed_at_path_end_ms,
            report.traj_gen.num_retained,
            report.traj_gen.num_generated
        );

        if let Some(ref mut archiver) = self.archiver {
            if let Err(e) = archiver.serialise(CycleRecord::new(&world, &state, &report)) {
                warn!("Could not archive cycle {}: {}", report.cycle, e);
            }
        }

        self.state = state;
        self.num_cycles += 1;

        Ok((traj, report))
    }
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

fn validate(params: &PlanMgrParams) -> Result<(), PlanMgrError> {
    let invalid = |msg: String| Err(PlanMgrError::InvalidParams(msg));
    let behav = &params.behav;
    let traj_gen = &params.traj_gen;

    if behav.lane_count == 0 {
        return invalid("there must be at least one lane".into());
    }
    if params.initial_lane >= behav.lane_count {
        return invalid(format!(
            "initial lane {} does not exist, there are {} lanes",
            params.initial_lane, behav.lane_count
        ));
    }
    if !(behav.tick_s > 0.0) || behav.tick_s != traj_gen.tick_s {
        return invalid("tick_s must be positive and the same for behav and traj_gen".into());
    }
    if !(behav.lane_width_m > 0.0) || behav.lane_width_m != traj_gen.lane_width_m {
        return invalid("lane_width_m must be positive and the same for behav and traj_gen".into());
    }
    if !(traj_gen.accel_ms2 > 0.0) {
        return invalid("accel_ms2 must be positive".into());
    }
    if !(traj_gen.keep_lane_spacing_m > 0.0) || !(traj_gen.change_lane_spacing_m > 0.0) {
        return invalid("shape point spacings must be positive".into());
    }
    if traj_gen.horizon_len == 0 {
        return invalid("horizon_len must be at least 1".into());
    }
    if !(behav.speed_limit_ms > 0.0) || !behav.speed_limit_ms.is_finite() {
        return invalid("speed_limit_ms must be positive".into());
    }
    if !(params.initial_speed_target_ms >= 0.0)
        || params.initial_speed_target_ms > behav.speed_limit_ms
    {
        return invalid(format!(
            "initial speed target {} must be between 0 and the speed limit {}",
            params.initial_speed_target_ms, behav.speed_limit_ms
        ));
    }
    if !(behav.near_gap_m > 0.0) || !(behav.far_gap_m > 0.0) || !(behav.rear_gap_m > 0.0) {
        return invalid("near_gap_m, far_gap_m and rear_gap_m must be positive".into());
    }
    if !(behav.lane_change_speed_deficit_ms >= 0.0) {
        return invalid("lane_change_speed_deficit_ms must not be negative".into());
    }
    let [band_min_m, band_max_m] = behav.maneuver_complete_band_m;
    if !(band_min_m < band_max_m) {
        return invalid(format!(
            "maneuver complete band [{}, {}] is empty",
            band_min_m, band_max_m
        ));
    }

    Ok(())
}
