//! # Highway Planner Executable
//!
//! Serves planned paths to the simulator bridge. The general execution methodology consists of:
//!
//!     - Initialise the session, logging and parameters
//!     - Load the road map
//!     - Main loop, once per message from the bridge:
//!         - Decode the message
//!         - Run a planning cycle on the telemetry
//!         - Reply with the new path
//!
//! Messages which don't carry telemetry are answered with the manual event. If a cycle is
//! skipped the unconsumed part of the previous path is sent back so the vehicle keeps driving it.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

// External
use color_eyre::{eyre::WrapErr, Result};
use log::{debug, info, trace, warn};
use nalgebra::Vector2;
use std::{path::PathBuf, sync::Arc, time::Instant};
use structopt::StructOpt;

// Internal
use comms_if::telem::{Control, SimMessage, MANUAL_ENVELOPE};
use plan_lib::{
    params::PlanExecParams, plan_mgr::PlanMgr, plan_server::PlanServer, road_map::RoadMap,
};
use util::{
    host,
    logger::{logger_init, parse_level},
    session::Session,
};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, StructOpt)]
#[structopt(name = "plan_exec", about = "Highway behaviour and trajectory planner")]
struct Opts {
    /// Executable parameter file, relative to the parameters directory
    #[structopt(long, default_value = "plan_exec.toml")]
    params: String,

    /// Road map file to use instead of the one in the parameters
    #[structopt(long, parse(from_os_str))]
    map: Option<PathBuf>,
}

// ------------------------------------------------------------------------------------------------
// MAIN
// ------------------------------------------------------------------------------------------------

fn main() -> Result<()> {
    color_eyre::install()?;

    let opts = Opts::from_args();

    // ---- EARLY INITIALISATION ----

    let params: PlanExecParams =
        util::params::load(&opts.params).wrap_err("Could not load the executable parameters")?;

    let session =
        Session::new("plan_exec", "sessions").wrap_err("Failed to create the session")?;

    let log_level = parse_level(&params.log_level).wrap_err("Invalid log level")?;
    logger_init(log_level, &session).wrap_err("Failed to initialise logging")?;

    info!("Highway Planner Executable\n");
    info!("Session directory: {:?}\n", session.session_root);

    info!("Initialising...");

    // ---- LOAD THE ROAD ----

    let map_path = match opts.map {
        Some(p) => p,
        None => host::get_sw_root()
            .wrap_err("Could not find the software root")?
            .join(&params.map_file),
    };

    let road = Arc::new(
        RoadMap::from_csv_path(
            &map_path,
            params.max_s_m,
            Vector2::from(params.interior_point_m),
        )
        .wrap_err_with(|| format!("Failed to load the road map from {:?}", map_path))?,
    );

    // ---- MODULE INITIALISATION ----

    let mut plan_mgr = PlanMgr::init(&params.plan_mgr_params, road, &session)
        .wrap_err("Failed to initialise PlanMgr")?;

    info!("PlanMgr initialised");

    let mut server = PlanServer::new(&params.net).wrap_err("Failed to initialise the server")?;

    info!("Server bound to {}", params.net.plan_endpoint);

    // ---- MAIN LOOP ----

    info!("Initialisation complete, waiting for telemetry");

    let mut client_connected = false;

    loop {
        let raw = match server.get_message() {
            Some(m) => m,
            None => {
                if client_connected != server.connected() {
                    client_connected = server.connected();
                    info!(
                        "Client {}",
                        if client_connected { "connected" } else { "disconnected" }
                    );
                }
                continue;
            }
        };

        let cycle_start = Instant::now();

        let reply = handle_message(&mut plan_mgr, &raw);

        if let Err(e) = server.send_reply(&reply) {
            warn!("{}", e);
        }

        trace!(
            "Message handled in {:.3} ms",
            cycle_start.elapsed().as_secs_f64() * 1000.0
        );
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Handle one message from the bridge, returning the reply to send.
fn handle_message(plan_mgr: &mut PlanMgr, raw: &str) -> String {
    let telem = match SimMessage::parse(raw) {
        Ok(SimMessage::Telemetry(t)) => t,
        Ok(SimMessage::Manual) => return MANUAL_ENVELOPE.to_string(),
        Ok(SimMessage::Other(event)) => {
            debug!("Ignoring \"{}\" event", event);
            return MANUAL_ENVELOPE.to_string();
        }
        Err(e) => {
            warn!("Could not decode message: {}", e);
            return MANUAL_ENVELOPE.to_string();
        }
    };

    let control = match plan_mgr.proc(&telem) {
        Ok((traj, _)) => traj.to_control(),
        Err(e) => {
            warn!("{}", e);

            // Keep the vehicle on what it was already doing, if we can tell what that was
            if telem.previous_path_x.is_empty()
                || telem.previous_path_x.len() != telem.previous_path_y.len()
            {
                return MANUAL_ENVELOPE.to_string();
            }

            Control {
                next_x: telem.previous_path_x.clone(),
                next_y: telem.previous_path_y.clone(),
            }
        }
    };

    match control.to_envelope() {
        Ok(s) => s,
        Err(e) => {
            warn!("{}", e);
            MANUAL_ENVELOPE.to_string()
        }
    }
}
