//! # Plan Executable Parameters

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::net::NetParams;
use serde::Deserialize;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Deserialize, Debug, Clone)]
pub struct PlanExecParams {
    /// Reference point table of the road, relative to the software root
    pub map_file: String,

    /// Length of the road loop, `s` wraps to zero here
    pub max_s_m: f64,

    /// A point inside the road loop, used to decide the sign of lateral offsets
    pub interior_point_m: [f64; 2],

    /// Parameter file for the plan manager, relative to the parameters directory
    pub plan_mgr_params: String,

    /// Minimum level of messages written to the log
    pub log_level: String,

    pub net: NetParams,
}
