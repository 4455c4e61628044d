//! # Trajectory generator module
//!
//! The trajectory generator turns the behaviour planner's target lane and speed into the points
//! sent to the vehicle controller. Points are spaced in time by a fixed tick, so the distance
//! between them encodes the speed.
//!
//! The part of the last trajectory the vehicle hasn't driven yet is kept as is, new points are
//! only ever appended to it. The new section is shaped by a natural cubic spline through five
//! points: two anchors at the end of the kept path (or at the vehicle if there isn't enough of
//! one), and three points ahead on the centre line of the target lane. The spline is fitted in a
//! frame aligned with the end of the path, so that it's a function of the forward distance, and
//! points are marched along it with the speed ramped by at most the acceleration limit each tick.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod params;
pub mod spline;
mod state;

// ---------------------------------------------------------------------------
// EXPORTS
// ---------------------------------------------------------------------------

pub use params::TrajGenParams;
pub use spline::{CubicSpline, SplineError};
pub use state::{StatusReport, TrajGen, TrajGenError, Trajectory};
