//! # Planner library.
//!
//! This library allows the executables and benchmarks in the workspace to access items defined
//! inside the planner crate.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Behaviour planner - decides the target lane and speed
pub mod behav;

/// Parameters of the planner executable
pub mod params;

/// Plan manager - runs a full planning cycle for each telemetry message
pub mod plan_mgr;

/// Plan server - receives telemetry from and sends paths to the simulator bridge
pub mod plan_server;

/// Road map - the road centerline and curvilinear coordinate conversions
pub mod road_map;

/// Trajectory generator - extends the committed path towards the behaviour planner's targets
pub mod traj_gen;

/// World model - the ego vehicle, its committed path, and the other vehicles for one cycle
pub mod world;
