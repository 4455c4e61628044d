//! # Communications interface crate.
//!
//! Provides the communications interfaces shared between the planner executable and the
//! simulator bridge: the zmq network layer and the telemetry/control message formats.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Network module
pub mod net;

/// Telemetry and control messages exchanged with the simulator
pub mod telem;
