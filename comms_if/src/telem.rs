//! # Telemetry and control messages
//!
//! The simulator speaks socket.io style event frames: a `42` prefix followed by a JSON array of
//! `[event_name, payload]`. Telemetry frames carry the ego pose, the part of the last commanded
//! path the vehicle has not driven yet, and the sensor fusion list of other vehicles. The planner
//! answers with a `control` frame holding the new path.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use serde_json::Value;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Prefix of a socket.io event message ("4" = message, "2" = event).
pub const EVENT_PREFIX: &str = "42";

/// Reply sent when the simulator is in manual mode or the message carried no usable data.
pub const MANUAL_ENVELOPE: &str = "42[\"manual\",{}]";

/// Name of the event carrying planner input.
pub const TELEMETRY_EVENT: &str = "telemetry";

/// Name of the event carrying planner output.
pub const CONTROL_EVENT: &str = "control";

/// Number of values in one sensor fusion row: `[id, x, y, vx, vy, s, d]`.
pub const SENSOR_FUSION_ROW_LEN: usize = 7;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// One telemetry sample from the simulator.
///
/// Units are those of the simulator: positions in meters, `yaw` in degrees, `speed` in the
/// simulator's speed unit (scaled into planner units by the planner parameters).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Telemetry {
    pub x: f64,
    pub y: f64,
    pub s: f64,
    pub d: f64,
    pub yaw: f64,
    pub speed: f64,

    /// X coordinates of the unconsumed tail of the previously sent path
    pub previous_path_x: Vec<f64>,

    /// Y coordinates of the unconsumed tail of the previously sent path
    pub previous_path_y: Vec<f64>,

    /// `s` of the last point of the unconsumed tail
    pub end_path_s: f64,

    /// `d` of the last point of the unconsumed tail
    pub end_path_d: f64,

    /// Other vehicles as `[id, x, y, vx, vy, s, d]` rows.
    ///
    /// Rows are kept loose here and validated when the world model is built, so a single bad row
    /// is reported rather than failing deserialisation of the whole frame.
    pub sensor_fusion: Vec<Vec<f64>>,
}

/// Path sent back to the simulator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Control {
    pub next_x: Vec<f64>,
    pub next_y: Vec<f64>,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// A decoded message from the simulator.
#[derive(Debug, Clone, PartialEq)]
pub enum SimMessage {
    /// Planner input for one cycle
    Telemetry(Box<Telemetry>),

    /// The simulator has no data for us, reply with [`MANUAL_ENVELOPE`]
    Manual,

    /// Any other event, by name
    Other(String),
}

/// Errors decoding a simulator message.
#[derive(Debug, thiserror::Error)]
pub enum TelemParseError {
    #[error("Message is not a socket.io event (expected a \"42\" prefix)")]
    NotAnEvent,

    #[error("Event contains invalid JSON: {0}")]
    InvalidJson(serde_json::Error),

    #[error("Event is not a [name, payload] array")]
    InvalidEnvelope,

    #[error("Telemetry payload is malformed: {0}")]
    InvalidTelemetry(serde_json::Error),

    #[error("Could not serialise the message: {0}")]
    SerialiseError(serde_json::Error),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl SimMessage {
    /// Decode a raw simulator frame.
    pub fn parse(raw: &str) -> Result<Self, TelemParseError> {
        let body = match raw.strip_prefix(EVENT_PREFIX) {
            Some(b) if !b.is_empty() => b,
            _ => return Err(TelemParseError::NotAnEvent),
        };

        let val: Value = serde_json::from_str(body).map_err(TelemParseError::InvalidJson)?;

        let (event, payload) = match val.as_array().map(|a| a.as_slice()) {
            Some([Value::String(event), payload, ..]) => (event.as_str(), payload),
            Some([Value::String(_)]) => return Ok(SimMessage::Manual),
            _ => return Err(TelemParseError::InvalidEnvelope),
        };

        if payload.is_null() {
            return Ok(SimMessage::Manual);
        }

        match event {
            TELEMETRY_EVENT => Ok(SimMessage::Telemetry(Box::new(
                Telemetry::deserialize(payload).map_err(TelemParseError::InvalidTelemetry)?,
            ))),
            other => Ok(SimMessage::Other(other.to_string())),
        }
    }
}

impl Telemetry {
    /// Wrap this telemetry in a simulator event frame.
    pub fn to_envelope(&self) -> Result<String, TelemParseError> {
        envelope(TELEMETRY_EVENT, self)
    }
}

impl Control {
    /// Build a control message from a sequence of `(x, y)` points.
    pub fn from_points<I: IntoIterator<Item = (f64, f64)>>(points: I) -> Self {
        let (next_x, next_y) = points.into_iter().unzip();
        Self { next_x, next_y }
    }

    /// Wrap this control message in a simulator event frame.
    pub fn to_envelope(&self) -> Result<String, TelemParseError> {
        envelope(CONTROL_EVENT, self)
    }

    pub fn len(&self) -> usize {
        self.next_x.len().min(self.next_y.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ------------------------------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ------------------------------------------------------------------------------------------------

fn envelope<T: Serialize>(event: &str, payload: &T) -> Result<String, TelemParseError> {
    let payload_str = serde_json::to_string(payload).map_err(TelemParseError::SerialiseError)?;

    Ok(format!("{}[\"{}\",{}]", EVENT_PREFIX, event, payload_str))
}

#[cfg(test)]
mod test {
    use super::*;

    const TELEM_FRAME: &str = r#"42["telemetry",{"x":909.48,"y":1128.67,"yaw":0,"speed":0,"s":124.834,"d":6.16483,"previous_path_x":[],"previous_path_y":[],"end_path_s":0,"end_path_d":0,"sensor_fusion":[[0,1047.862,1156.377,17.6,0.1,263.47,2.0]]}]"#;

    #[test]
    fn test_parse_telemetry() {
        let msg = SimMessage::parse(TELEM_FRAME).unwrap();

        let telem = match msg {
            SimMessage::Telemetry(t) => t,
            m => panic!("Expected telemetry, got {:?}", m),
        };

        assert_eq!(telem.x, 909.48);
        assert_eq!(telem.d, 6.16483);
        assert!(telem.previous_path_x.is_empty());
        assert_eq!(telem.sensor_fusion.len(), 1);
        assert_eq!(telem.sensor_fusion[0].len(), SENSOR_FUSION_ROW_LEN);
    }

    #[test]
    fn test_parse_manual_and_other() {
        assert_eq!(
            SimMessage::parse("42[\"telemetry\",null]").unwrap(),
            SimMessage::Manual
        );
        assert_eq!(
            SimMessage::parse("42[\"reset\",{}]").unwrap(),
            SimMessage::Other("reset".into())
        );
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(SimMessage::parse("2"), Err(TelemParseError::NotAnEvent)));
        assert!(matches!(SimMessage::parse("42"), Err(TelemParseError::NotAnEvent)));
        assert!(matches!(
            SimMessage::parse("42[\"telemetry\","),
            Err(TelemParseError::InvalidJson(_))
        ));
        assert!(matches!(
            SimMessage::parse("42{\"x\":1}"),
            Err(TelemParseError::InvalidEnvelope)
        ));
        assert!(matches!(
            SimMessage::parse("42[\"telemetry\",{\"x\":1}]"),
            Err(TelemParseError::InvalidTelemetry(_))
        ));
    }

    #[test]
    fn test_control_envelope() {
        let control = Control::from_points(vec![(1.0, 2.0), (3.5, 4.0)]);
        assert_eq!(control.len(), 2);
        assert_eq!(
            control.to_envelope().unwrap(),
            "42[\"control\",{\"next_x\":[1.0,3.5],\"next_y\":[2.0,4.0]}]"
        );
    }
}
