//! Behaviour planner parameters

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Deserialize;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for the behaviour planner
#[derive(Deserialize, Debug, Clone)]
pub struct BehavParams {
    /// Duration of one trajectory sample
    pub tick_s: f64,

    /// Maximum speed target
    pub speed_limit_ms: f64,

    /// Width of a single lane
    pub lane_width_m: f64,

    /// Number of lanes, lane 0 is the leftmost
    pub lane_count: usize,

    /// Vehicles ahead in our lane closer than this force us to slow down to their speed
    pub near_gap_m: f64,

    /// A lane is only clear ahead if there's nobody within this distance
    pub far_gap_m: f64,

    /// A lane change is vetoed by anyone behind us in the target lane closer than this
    pub rear_gap_m: f64,

    /// How far below the speed limit we must be slowed before changing lane is considered
    pub lane_change_speed_deficit_ms: f64,

    /// Lateral band, measured from the left boundary of the target lane, the end of the path has
    /// to be inside for a lane change to be complete.
    ///
    /// Both limits are exclusive.
    pub maneuver_complete_band_m: [f64; 2],
}
