//! Simple planner client test
//!
//! Sends telemetry for a stationary vehicle to a running planner once a second, feeding the
//! returned path back in as the previous path, and prints what comes back.
//!
//! Usage: `test_plan_client [endpoint]`, the endpoint defaults to `tcp://localhost:4567`.

use comms_if::{
    net::{MonitoredSocket, SocketOptions},
    telem::{Control, Telemetry},
};

/// Number of points the pretend vehicle drives between two requests.
const POINTS_CONSUMED_PER_REQUEST: usize = 5;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let endpoint = std::env::args()
        .nth(1)
        .unwrap_or_else(|| String::from("tcp://localhost:4567"));

    let ctx = zmq::Context::new();

    let socket_options = SocketOptions {
        connect_timeout: 1000,
        linger: 1,
        recv_timeout: 1000,
        send_timeout: 100,
        req_correlate: true,
        req_relaxed: true,
        ..Default::default()
    };

    let socket = match MonitoredSocket::new(&ctx, zmq::REQ, socket_options, &endpoint) {
        Ok(s) => s,
        Err(e) => {
            println!("Could not connect to the planner at {}", endpoint);
            return Err(e.into());
        }
    };

    let mut telem = Telemetry {
        x: 909.48,
        y: 1128.67,
        s: 124.834,
        d: 6.16483,
        yaw: 0.0,
        speed: 0.0,
        previous_path_x: vec![],
        previous_path_y: vec![],
        end_path_s: 0.0,
        end_path_d: 0.0,
        sensor_fusion: vec![],
    };

    loop {
        if !socket.connected() {
            println!("Waiting for connection");
            std::thread::sleep(std::time::Duration::from_millis(1000));
            continue;
        }

        let frame = telem.to_envelope()?;
        if let Err(e) = socket.send(frame.as_str(), 0) {
            println!("could not send: {}", e);
            std::thread::sleep(std::time::Duration::from_millis(1000));
            continue;
        }

        let msg = match socket.recv_msg(0) {
            Ok(m) => m,
            Err(e) => {
                println!("could not read from planner: {}", e);
                std::thread::sleep(std::time::Duration::from_millis(1000));
                continue;
            }
        };

        let reply = msg.as_str().unwrap_or("");

        // Strip the envelope to get the control payload back
        let control: Option<Control> = reply
            .strip_prefix("42[\"control\",")
            .and_then(|r| r.strip_suffix(']'))
            .and_then(|p| serde_json::from_str(p).ok());

        match control {
            Some(c) => {
                println!("planner returned {} points", c.len());

                let skip = POINTS_CONSUMED_PER_REQUEST.min(c.len());
                telem.previous_path_x = c.next_x[skip..].to_vec();
                telem.previous_path_y = c.next_y[skip..].to_vec();

                // The pretend vehicle never moves, so the tail ends roughly where it is
                telem.end_path_s = telem.s;
                telem.end_path_d = telem.d;
            }
            None => println!("response: {}", reply),
        }

        std::thread::sleep(std::time::Duration::from_millis(1000));
    }
}
