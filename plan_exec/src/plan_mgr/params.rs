//! Plan manager parameters

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Deserialize;

use crate::{behav::BehavParams, traj_gen::TrajGenParams};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for the plan manager and the modules it runs
#[derive(Deserialize, Debug, Clone)]
pub struct PlanMgrParams {
    /// Lane the vehicle starts in
    pub initial_lane: usize,

    /// Speed target before the first cycle has run
    pub initial_speed_target_ms: f64,

    /// Multiplier converting the reported ego speed into meters per second
    pub ego_speed_scale: f64,

    pub behav: BehavParams,

    pub traj_gen: TrajGenParams,
}
