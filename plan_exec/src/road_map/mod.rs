//! # Road map module
//!
//! The road is described by a closed loop of reference points along its centerline. Each point
//! carries its Cartesian position, its curvilinear longitudinal coordinate `s`, and the unit
//! normal pointing towards increasing lateral offset `d`.
//!
//! Positions on the road are expressed in curvilinear coordinates: `s` is the distance travelled
//! along the centerline and `d` the signed lateral offset from it, positive to the right of the
//! direction of travel. The map converts between the two frames. Between reference points the
//! centerline is taken as the straight chord joining them.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod load;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use nalgebra::Vector2;
use serde::{Deserialize, Serialize};
use std::f64::consts::{FRAC_PI_2, TAU};
use util::maths::wrap;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A point on the road centerline.
#[derive(Debug, Copy, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReferencePoint {
    /// Cartesian position of the point
    pub position_m: Vector2<f64>,

    /// Curvilinear longitudinal coordinate of the point
    pub s_m: f64,

    /// Unit vector from the centerline towards increasing `d`
    pub normal: Vector2<f64>,
}

/// A position in curvilinear (road aligned) coordinates.
#[derive(Debug, Copy, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct CurvPoint {
    /// Distance along the centerline
    pub s_m: f64,

    /// Signed lateral offset from the centerline
    pub d_m: f64,
}

/// The static road map.
///
/// Read-only once built, share it between cycles (or connections) behind an `Arc`.
#[derive(Debug, Clone)]
pub struct RoadMap {
    points: Vec<ReferencePoint>,

    /// Distance along the chords from the first point to each point, offset by the first
    /// point's `s`.
    chord_s_m: Vec<f64>,

    /// Length of the track, `s` wraps back to zero here.
    max_s_m: f64,

    /// A point inside the loop, used to decide the sign of lateral offsets.
    interior_point_m: Vector2<f64>,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors raised when building a road map.
#[derive(Debug, thiserror::Error)]
pub enum RoadMapError {
    #[error("A road map needs at least 2 reference points, found {0}")]
    TooFewPoints(usize),

    #[error("Reference point {0} contains a non-finite value")]
    NonFinite(usize),

    #[error("Reference point {0} does not have a greater s than the point before it")]
    NotIncreasing(usize),

    #[error("Track length {max_s_m} must exceed the s of the last point ({last_s_m})")]
    MaxSTooShort { max_s_m: f64, last_s_m: f64 },

    #[error("Could not read the map file: {0}")]
    FileError(std::io::Error),

    #[error("Could not parse the map file: {0}")]
    CsvError(csv::Error),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl RoadMap {
    /// Build a new road map from reference points ordered by increasing `s`.
    pub fn new(
        points: Vec<ReferencePoint>,
        max_s_m: f64,
        interior_point_m: Vector2<f64>,
    ) -> Result<Self, RoadMapError> {
        if points.len() < 2 {
            return Err(RoadMapError::TooFewPoints(points.len()));
        }

        for (i, p) in points.iter().enumerate() {
            let finite = p.position_m.iter().chain(p.normal.iter()).all(|v| v.is_finite())
                && p.s_m.is_finite();
            if !finite {
                return Err(RoadMapError::NonFinite(i));
            }

            if i > 0 && p.s_m <= points[i - 1].s_m {
                return Err(RoadMapError::NotIncreasing(i));
            }
        }

        let last_s_m = points[points.len() - 1].s_m;
        if !(max_s_m > last_s_m) || !interior_point_m.iter().all(|v| v.is_finite()) {
            return Err(RoadMapError::MaxSTooShort { max_s_m, last_s_m });
        }

        // Accumulate the chord lengths, these are what the conversions actually walk along
        let mut chord_s_m = Vec::with_capacity(points.len());
        chord_s_m.push(points[0].s_m);
        for pair in points.windows(2) {
            let last = chord_s_m[chord_s_m.len() - 1];
            chord_s_m.push(last + (pair[1].position_m - pair[0].position_m).norm());
        }

        Ok(Self {
            points,
            chord_s_m,
            max_s_m,
            interior_point_m,
        })
    }

    /// Generate a circular track travelled anticlockwise around `centre_m`.
    ///
    /// The `s` of each point is the chord distance from the first point, which makes the
    /// conversions exact inverses of each other. Positive `d` points away from the centre.
    pub fn generate_ring(
        centre_m: Vector2<f64>,
        radius_m: f64,
        num_points: usize,
    ) -> Result<Self, RoadMapError> {
        if num_points < 3 {
            return Err(RoadMapError::TooFewPoints(num_points));
        }

        let chord_m = 2.0 * radius_m * (std::f64::consts::PI / num_points as f64).sin();

        let points = (0..num_points)
            .map(|i| {
                let theta = TAU * i as f64 / num_points as f64;
                let normal = Vector2::new(theta.cos(), theta.sin());
                ReferencePoint {
                    position_m: centre_m + radius_m * normal,
                    s_m: i as f64 * chord_m,
                    normal,
                }
            })
            .collect();

        Self::new(points, num_points as f64 * chord_m, centre_m)
    }

    /// Length of the track.
    pub fn max_s_m(&self) -> f64 {
        self.max_s_m
    }

    /// The reference points of the map.
    pub fn points(&self) -> &[ReferencePoint] {
        &self.points
    }

    /// Index of the reference point nearest to `position_m`.
    pub fn closest_point(&self, position_m: &Vector2<f64>) -> usize {
        let mut closest_dist_m = std::f64::INFINITY;
        let mut closest = 0;

        for (i, p) in self.points.iter().enumerate() {
            let dist_m = (p.position_m - position_m).norm();
            if dist_m < closest_dist_m {
                closest_dist_m = dist_m;
                closest = i;
            }
        }

        closest
    }

    /// Index of the next reference point ahead of `position_m` when travelling with the given
    /// heading.
    ///
    /// This is the closest point, unless the position projects beyond it along the heading, in
    /// which case we've already passed it and its successor is used.
    pub fn next_point(&self, position_m: &Vector2<f64>, heading_rad: f64) -> usize {
        let closest = self.closest_point(position_m);

        let from_closest = position_m - self.points[closest].position_m;
        let heading = Vector2::new(heading_rad.cos(), heading_rad.sin());

        if from_closest.dot(&heading) > 0.0 {
            (closest + 1) % self.points.len()
        } else {
            closest
        }
    }

    /// Convert a Cartesian position and heading into curvilinear coordinates.
    ///
    /// The heading is used to pick the centerline segment the position belongs to, so it should
    /// be the direction of travel at that position.
    pub fn to_curvilinear(&self, position_m: &Vector2<f64>, heading_rad: f64) -> CurvPoint {
        let next = self.next_point(position_m, heading_rad);
        let prev = self.prev_index(next);

        let start_m = self.points[prev].position_m;
        let seg = self.points[next].position_m - start_m;
        let rel = position_m - start_m;

        // Projection of the position onto the segment
        let proj_norm = rel.dot(&seg) / seg.norm_squared();
        let proj = proj_norm * seg;

        // The sign of d comes from which side of the centerline the interior point is on:
        // positions no further from it than their projection are on the inside.
        let mut d_m = (rel - proj).norm();
        let interior = self.interior_point_m - start_m;
        if (interior - rel).norm() <= (interior - proj).norm() {
            d_m = -d_m;
        }

        let s_m = wrap(self.chord_s_m[prev] + proj_norm * seg.norm(), self.max_s_m);

        CurvPoint { s_m, d_m }
    }

    /// Convert curvilinear coordinates into a Cartesian position.
    ///
    /// `s` outside of `[0, max_s)` is wrapped around the loop.
    pub fn to_cartesian(&self, s_m: f64, d_m: f64) -> Vector2<f64> {
        let s_m = wrap(s_m, self.max_s_m);

        // Last point at or before s. If s precedes the whole table we're on the segment closing
        // the loop.
        let prev = self
            .points
            .iter()
            .rposition(|p| p.s_m <= s_m)
            .unwrap_or(self.points.len() - 1);
        let next = (prev + 1) % self.points.len();

        let start = &self.points[prev];
        let seg = self.points[next].position_m - start.position_m;
        let heading_rad = seg[1].atan2(seg[0]);

        let mut seg_s_m = s_m - start.s_m;
        if seg_s_m < 0.0 {
            seg_s_m += self.max_s_m;
        }

        let perp_heading_rad = heading_rad - FRAC_PI_2;

        start.position_m
            + seg_s_m * Vector2::new(heading_rad.cos(), heading_rad.sin())
            + d_m * Vector2::new(perp_heading_rad.cos(), perp_heading_rad.sin())
    }

    /// Heading of the centerline segment containing `s`.
    pub fn heading_at(&self, s_m: f64) -> f64 {
        let s_m = wrap(s_m, self.max_s_m);
        let prev = self
            .points
            .iter()
            .rposition(|p| p.s_m <= s_m)
            .unwrap_or(self.points.len() - 1);
        let seg = self.points[(prev + 1) % self.points.len()].position_m
            - self.points[prev].position_m;

        seg[1].atan2(seg[0])
    }

    fn prev_index(&self, index: usize) -> usize {
        if index == 0 {
            self.points.len() - 1
        } else {
            index - 1
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn ring() -> RoadMap {
        RoadMap::generate_ring(Vector2::new(1000.0, 2000.0), 500.0, 120).unwrap()
    }

    #[test]
    fn test_round_trip() {
        let map = ring();
        let chord_m = map.points()[1].s_m;

        for k in [0usize, 7, 59, 119].iter() {
            for frac in [0.3, 0.5, 0.8].iter() {
                for d_m in [2.0, 6.0, 10.0].iter() {
                    let s_m = (*k as f64 + frac) * chord_m;
                    let pos = map.to_cartesian(s_m, *d_m);
                    let curv = map.to_curvilinear(&pos, map.heading_at(s_m));
                    let back = map.to_cartesian(curv.s_m, curv.d_m);

                    assert!(
                        (back - pos).norm() < 1e-6,
                        "round trip failed at s = {}, d = {}: {:?} -> {:?}",
                        s_m,
                        d_m,
                        pos,
                        back
                    );
                    assert!((curv.d_m - d_m).abs() < 1e-6);
                }
            }
        }
    }

    #[test]
    fn test_lateral_sign() {
        let map = ring();

        // Positive d is away from the interior point, negative towards it
        let outside = map.to_cartesian(100.0, 4.0);
        let inside = map.to_cartesian(100.0, -4.0);
        let centre = Vector2::new(1000.0, 2000.0);
        assert!((outside - centre).norm() > (inside - centre).norm());

        let heading = map.heading_at(100.0);
        assert!(map.to_curvilinear(&outside, heading).d_m > 0.0);
        assert!(map.to_curvilinear(&inside, heading).d_m < 0.0);
    }

    #[test]
    fn test_s_wraps() {
        let map = ring();
        let max_s = map.max_s_m();

        let a = map.to_cartesian(50.0, 6.0);
        assert!((map.to_cartesian(50.0 + max_s, 6.0) - a).norm() < 1e-9);
        assert!((map.to_cartesian(50.0 - max_s, 6.0) - a).norm() < 1e-9);

        // A point on the closing segment reports s inside [0, max_s)
        let closing = map.to_cartesian(max_s - 1.0, 6.0);
        let curv = map.to_curvilinear(&closing, map.heading_at(max_s - 1.0));
        assert!(curv.s_m < max_s && curv.s_m >= 0.0);
        assert!((curv.s_m - (max_s - 1.0)).abs() < 1e-6);
    }

    #[test]
    fn test_next_point_uses_heading() {
        let map = ring();
        let p3 = map.points()[3].position_m;
        let heading = map.heading_at(map.points()[3].s_m);

        // Just behind point 3 travelling forwards, point 3 is still ahead
        let behind = p3 - 0.5 * Vector2::new(heading.cos(), heading.sin());
        assert_eq!(map.next_point(&behind, heading), 3);

        // Just past it, we need point 4
        let past = p3 + 0.5 * Vector2::new(heading.cos(), heading.sin());
        assert_eq!(map.next_point(&past, heading), 4);
    }

    #[test]
    fn test_invalid_tables() {
        let p = |s_m: f64| ReferencePoint {
            position_m: Vector2::new(s_m, 0.0),
            s_m,
            normal: Vector2::new(0.0, -1.0),
        };
        let interior = Vector2::new(0.0, 100.0);

        assert!(matches!(
            RoadMap::new(vec![p(0.0)], 10.0, interior),
            Err(RoadMapError::TooFewPoints(1))
        ));
        assert!(matches!(
            RoadMap::new(vec![p(0.0), p(5.0), p(5.0)], 10.0, interior),
            Err(RoadMapError::NotIncreasing(2))
        ));
        assert!(matches!(
            RoadMap::new(vec![p(0.0), p(f64::NAN)], 10.0, interior),
            Err(RoadMapError::NonFinite(1))
        ));
        assert!(matches!(
            RoadMap::new(vec![p(0.0), p(5.0)], 5.0, interior),
            Err(RoadMapError::MaxSTooShort { .. })
        ));
        assert!(RoadMap::new(vec![p(0.0), p(5.0)], 10.0, interior).is_ok());
    }
}
