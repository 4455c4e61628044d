//! # Plan Server Module
//!
//! This module abstracts over the networking side of the planner executable. The simulator bridge
//! connects to a REP socket, sends one telemetry message and waits for the planned path before
//! sending the next one.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::net::{zmq, MonitoredSocket, MonitoredSocketError, NetParams, SocketOptions};
use log::warn;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// An abstraction over the networking part of the planner executable.
pub struct PlanServer {
    /// REP socket receiving telemetry and replying with paths
    socket: MonitoredSocket,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Errors which can occur in the [`PlanServer`]
#[derive(thiserror::Error, Debug)]
pub enum PlanServerError {
    #[error("Socket error: {0}")]
    SocketError(MonitoredSocketError),

    #[error("Could not send the reply to the client: {0}")]
    SendError(zmq::Error),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl PlanServer {
    /// Create a new instance of the plan server.
    ///
    /// This function will not wait for a connection from the client before returning.
    pub fn new(params: &NetParams) -> Result<Self, PlanServerError> {
        let ctx = zmq::Context::new();

        let socket = MonitoredSocket::new(
            &ctx,
            zmq::REP,
            SocketOptions::server(params),
            &params.plan_endpoint,
        )?;

        Ok(Self { socket })
    }

    /// Whether a client is connected.
    pub fn connected(&self) -> bool {
        self.socket.connected()
    }

    /// Get the next raw message from the client.
    ///
    /// The user MUST call [`PlanServer::send_reply`] after every message returned here, before
    /// asking for the next one.
    ///
    /// `None` is returned if nothing arrived before the receive timeout, or if the message isn't
    /// valid UTF-8. In the latter case an empty reply has already been sent.
    pub fn get_message(&mut self) -> Option<String> {
        let msg = self.socket.recv_msg(0).ok()?;

        match msg.as_str() {
            Some(s) => Some(s.to_string()),
            None => {
                warn!("Received a message which is not valid UTF-8, ignoring it");
                if let Err(e) = self.send_reply("") {
                    warn!("{}", e);
                }
                None
            }
        }
    }

    /// Reply to the last message received.
    pub fn send_reply(&mut self, reply: &str) -> Result<(), PlanServerError> {
        self.socket
            .send(reply, 0)
            .map_err(PlanServerError::SendError)
    }
}

impl From<MonitoredSocketError> for PlanServerError {
    fn from(e: MonitoredSocketError) -> Self {
        PlanServerError::SocketError(e)
    }
}
