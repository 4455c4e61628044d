//! # Behaviour planner module
//!
//! The behaviour planner decides which lane the ego vehicle should be in and how fast it should
//! aim to go. It's a small state machine with three maneuvers:
//!
//! - `KeepLane` - Follow the current lane.
//! - `ChangingLeft` / `ChangingRight` - A lane change has been commanded and the end of the
//!   trajectory hasn't yet settled into the new lane.
//!
//! Each cycle the planner looks at the vehicles ahead of the end of the current trajectory. If
//! one is close enough in our lane we slow to its speed, and if that would leave us well below
//! the speed limit we look for a gap in the adjacent lanes, left first. A lane is taken only when
//! nobody is within the far gap ahead or the rear gap behind. Once our lane is clear far enough
//! ahead the speed target goes back up to the limit.
//!
//! All decisions are made relative to the end of the previously committed trajectory, since
//! that's where any new motion starts. Other vehicles are extrapolated there at constant speed.
//!
//! The planner holds no state of its own. The persistent decisions live in an [`EgoState`] which
//! is passed in and returned from each call to [`BehavPlanner::plan`].

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod gaps;
mod params;
mod state;

// ---------------------------------------------------------------------------
// EXPORTS
// ---------------------------------------------------------------------------

pub use gaps::{Blocker, LaneGap};
pub use params::BehavParams;
pub use state::{BehavPlanner, EgoState, Maneuver, StatusReport};
