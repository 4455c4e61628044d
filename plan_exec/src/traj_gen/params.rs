//! Trajectory generator parameters

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Deserialize;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for the trajectory generator
#[derive(Deserialize, Debug, Clone)]
pub struct TrajGenParams {
    /// Time between consecutive trajectory points
    pub tick_s: f64,

    /// Maximum change in speed between consecutive points, per second
    pub accel_ms2: f64,

    /// Number of points in a full trajectory
    pub horizon_len: usize,

    /// Distance between the shape points when keeping lane
    pub keep_lane_spacing_m: f64,

    /// Distance between the shape points during a lane change.
    ///
    /// Longer than the keep lane spacing to stretch the lateral motion out.
    pub change_lane_spacing_m: f64,

    /// Width of a single lane
    pub lane_width_m: f64,
}
