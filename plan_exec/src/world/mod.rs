//! # World model module
//!
//! A snapshot of everything the planner knows about the road's occupants for one cycle: the ego
//! vehicle's pose, the part of the last trajectory it has not yet driven, and the other vehicles
//! reported by sensor fusion. The world model is rebuilt from scratch from each telemetry message
//! and is never carried between cycles.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use comms_if::telem::{Telemetry, SENSOR_FUSION_ROW_LEN};
use nalgebra::Vector2;
use serde::Serialize;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Pose of the ego vehicle, in planner units.
#[derive(Debug, Copy, Clone, Serialize)]
pub struct EgoPose {
    pub position_m: Vector2<f64>,
    pub s_m: f64,
    pub d_m: f64,

    /// Heading in radians, anticlockwise from the X axis
    pub yaw_rad: f64,

    pub speed_ms: f64,
}

/// The unconsumed tail of the previously sent trajectory.
#[derive(Debug, Clone, Default)]
pub struct PathTail {
    pub points_m: Vec<Vector2<f64>>,

    /// Curvilinear position of the last point of the tail. Only meaningful if the tail isn't
    /// empty.
    pub end_s_m: f64,
    pub end_d_m: f64,
}

/// Another vehicle on the road.
#[derive(Debug, Copy, Clone, Serialize)]
pub struct TrackedVehicle {
    pub id: i64,
    pub position_m: Vector2<f64>,
    pub velocity_ms: Vector2<f64>,
    pub s_m: f64,
    pub d_m: f64,
}

/// Everything known about the world for one planning cycle.
#[derive(Debug, Clone)]
pub struct WorldModel {
    pub ego: EgoPose,
    pub tail: PathTail,
    pub vehicles: Vec<TrackedVehicle>,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum WorldModelError {
    #[error("Previous path has {x} x coordinates but {y} y coordinates")]
    PathLengthMismatch { x: usize, y: usize },

    #[error("Telemetry field {0} is not finite")]
    NonFinite(&'static str),

    #[error("Sensor fusion row {index} has {len} values, expected {}", SENSOR_FUSION_ROW_LEN)]
    BadSensorRow { index: usize, len: usize },

    #[error("Sensor fusion row {0} contains a non-finite value")]
    NonFiniteSensorRow(usize),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl WorldModel {
    /// Build the world model from a telemetry message.
    ///
    /// `ego_speed_scale` converts the simulator's reported speed into meters per second.
    pub fn from_telemetry(telem: &Telemetry, ego_speed_scale: f64) -> Result<Self, WorldModelError> {
        let scalars = [
            ("x", telem.x),
            ("y", telem.y),
            ("s", telem.s),
            ("d", telem.d),
            ("yaw", telem.yaw),
            ("speed", telem.speed),
            ("end_path_s", telem.end_path_s),
            ("end_path_d", telem.end_path_d),
        ];
        if let Some(&(name, _)) = scalars.iter().find(|(_, v)| !v.is_finite()) {
            return Err(WorldModelError::NonFinite(name));
        }

        if telem.previous_path_x.len() != telem.previous_path_y.len() {
            return Err(WorldModelError::PathLengthMismatch {
                x: telem.previous_path_x.len(),
                y: telem.previous_path_y.len(),
            });
        }

        let points_m = telem
            .previous_path_x
            .iter()
            .zip(telem.previous_path_y.iter())
            .map(|(&x, &y)| {
                if x.is_finite() && y.is_finite() {
                    Ok(Vector2::new(x, y))
                } else {
                    Err(WorldModelError::NonFinite("previous_path"))
                }
            })
            .collect::<Result<Vec<_>, _>>()?;

        let vehicles = telem
            .sensor_fusion
            .iter()
            .enumerate()
            .map(|(index, row)| TrackedVehicle::from_row(index, row))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            ego: EgoPose {
                position_m: Vector2::new(telem.x, telem.y),
                s_m: telem.s,
                d_m: telem.d,
                yaw_rad: telem.yaw.to_radians(),
                speed_ms: telem.speed * ego_speed_scale,
            },
            tail: PathTail {
                points_m,
                end_s_m: telem.end_path_s,
                end_d_m: telem.end_path_d,
            },
            vehicles,
        })
    }

    /// Longitudinal position the new trajectory will start from.
    ///
    /// This is the end of the tail, or the ego's own position if there's no tail left.
    pub fn path_end_s(&self) -> f64 {
        if self.tail.points_m.is_empty() {
            self.ego.s_m
        } else {
            self.tail.end_s_m
        }
    }

    /// Lateral position the new trajectory will start from.
    pub fn path_end_d(&self) -> f64 {
        if self.tail.points_m.is_empty() {
            self.ego.d_m
        } else {
            self.tail.end_d_m
        }
    }

    /// Time until the ego reaches the end of the tail.
    pub fn horizon_dt(&self, tick_s: f64) -> f64 {
        self.tail.points_m.len() as f64 * tick_s
    }
}

impl TrackedVehicle {
    /// Build a vehicle from an `[id, x, y, vx, vy, s, d]` sensor fusion row.
    fn from_row(index: usize, row: &[f64]) -> Result<Self, WorldModelError> {
        let (id, x, y, vx, vy, s, d) = match *row {
            [id, x, y, vx, vy, s, d] => (id, x, y, vx, vy, s, d),
            _ => {
                return Err(WorldModelError::BadSensorRow {
                    index,
                    len: row.len(),
                })
            }
        };

        if !row.iter().all(|v| v.is_finite()) {
            return Err(WorldModelError::NonFiniteSensorRow(index));
        }

        Ok(Self {
            id: id as i64,
            position_m: Vector2::new(x, y),
            velocity_ms: Vector2::new(vx, vy),
            s_m: s,
            d_m: d,
        })
    }

    pub fn speed_ms(&self) -> f64 {
        self.velocity_ms.norm()
    }

    /// Whether the vehicle's `d` lies in the lane `[lane * width, (lane + 1) * width)`.
    pub fn is_in_lane(&self, lane: usize, lane_width_m: f64) -> bool {
        let left_m = lane as f64 * lane_width_m;
        self.d_m >= left_m && self.d_m < left_m + lane_width_m
    }

    /// Longitudinal position after `dt_s` seconds at constant speed.
    pub fn future_s(&self, dt_s: f64) -> f64 {
        self.s_m + self.speed_ms() * dt_s
    }
}

#[cfg(test)]
mod test {
    use super::*;

    /// Telemetry for an ego at `(s, d)` with no tail and no traffic.
    fn telem(s: f64, d: f64) -> Telemetry {
        Telemetry {
            x: 0.0,
            y: 0.0,
            s,
            d,
            yaw: 0.0,
            speed: 0.0,
            previous_path_x: vec![],
            previous_path_y: vec![],
            end_path_s: 0.0,
            end_path_d: 0.0,
            sensor_fusion: vec![],
        }
    }

    fn vehicle(d_m: f64) -> TrackedVehicle {
        TrackedVehicle {
            id: 0,
            position_m: Vector2::zeros(),
            velocity_ms: Vector2::new(3.0, 4.0),
            s_m: 100.0,
            d_m,
        }
    }

    #[test]
    fn test_is_in_lane() {
        assert!(vehicle(0.0).is_in_lane(0, 4.0));
        assert!(vehicle(3.99).is_in_lane(0, 4.0));
        assert!(!vehicle(4.0).is_in_lane(0, 4.0));
        assert!(vehicle(4.0).is_in_lane(1, 4.0));
        assert!(vehicle(6.0).is_in_lane(1, 4.0));
        assert!(!vehicle(8.0).is_in_lane(1, 4.0));
        assert!(!vehicle(-0.1).is_in_lane(0, 4.0));
    }

    #[test]
    fn test_future_s() {
        let v = vehicle(2.0);
        assert_eq!(v.speed_ms(), 5.0);
        assert_eq!(v.future_s(0.0), 100.0);
        assert_eq!(v.future_s(2.0), 110.0);
    }

    #[test]
    fn test_from_telemetry() {
        let mut t = telem(124.8, 6.2);
        t.yaw = 90.0;
        t.speed = 10.0;
        t.previous_path_x = vec![1.0, 2.0];
        t.previous_path_y = vec![3.0, 4.0];
        t.end_path_s = 130.0;
        t.end_path_d = 6.0;
        t.sensor_fusion = vec![vec![7.0, 10.0, 20.0, 1.0, 0.0, 150.0, 2.0]];

        let world = WorldModel::from_telemetry(&t, 0.5).unwrap();

        assert_eq!(world.ego.speed_ms, 5.0);
        assert!((world.ego.yaw_rad - std::f64::consts::FRAC_PI_2).abs() < 1e-12);
        assert_eq!(world.tail.points_m.len(), 2);
        assert_eq!(world.path_end_s(), 130.0);
        assert_eq!(world.path_end_d(), 6.0);
        assert!((world.horizon_dt(0.02) - 0.04).abs() < 1e-12);
        assert_eq!(world.vehicles[0].id, 7);
        assert_eq!(world.vehicles[0].s_m, 150.0);
    }

    #[test]
    fn test_path_end_without_tail() {
        let mut t = telem(124.8, 6.2);
        t.end_path_s = 0.0;

        let world = WorldModel::from_telemetry(&t, 1.0).unwrap();

        assert_eq!(world.path_end_s(), 124.8);
        assert_eq!(world.path_end_d(), 6.2);
        assert_eq!(world.horizon_dt(0.02), 0.0);
    }

    #[test]
    fn test_invalid_telemetry() {
        let mut t = telem(0.0, 6.0);
        t.previous_path_x = vec![1.0];
        assert!(matches!(
            WorldModel::from_telemetry(&t, 1.0),
            Err(WorldModelError::PathLengthMismatch { x: 1, y: 0 })
        ));

        let mut t = telem(0.0, 6.0);
        t.speed = f64::NAN;
        assert!(matches!(
            WorldModel::from_telemetry(&t, 1.0),
            Err(WorldModelError::NonFinite("speed"))
        ));

        let mut t = telem(0.0, 6.0);
        t.sensor_fusion = vec![vec![0.0; 7], vec![1.0, 2.0]];
        assert!(matches!(
            WorldModel::from_telemetry(&t, 1.0),
            Err(WorldModelError::BadSensorRow { index: 1, len: 2 })
        ));

        let mut t = telem(0.0, 6.0);
        t.sensor_fusion = vec![vec![0.0, 1.0, 2.0, f64::INFINITY, 0.0, 1.0, 2.0]];
        assert!(matches!(
            WorldModel::from_telemetry(&t, 1.0),
            Err(WorldModelError::NonFiniteSensorRow(0))
        ));
    }
}
