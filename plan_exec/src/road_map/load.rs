//! Loading of road maps from reference point tables

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::{fs::File, io::Read, path::Path};

use log::info;
use nalgebra::Vector2;
use serde::Deserialize;

use super::{ReferencePoint, RoadMap, RoadMapError};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// One row of the table: `x y s dx dy`, whitespace separated.
#[derive(Debug, Deserialize)]
struct MapRow {
    x: f64,
    y: f64,
    s: f64,
    dx: f64,
    dy: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl RoadMap {
    /// Load a road map from a reference point table on disk.
    pub fn from_csv_path<P: AsRef<Path>>(
        path: P,
        max_s_m: f64,
        interior_point_m: Vector2<f64>,
    ) -> Result<Self, RoadMapError> {
        let file = File::open(path.as_ref()).map_err(RoadMapError::FileError)?;

        let map = Self::from_reader(file, max_s_m, interior_point_m)?;

        info!(
            "Loaded road map from {:?}: {} points, track length {} m",
            path.as_ref(),
            map.points().len(),
            map.max_s_m()
        );

        Ok(map)
    }

    /// Load a road map from any reader producing a reference point table.
    pub fn from_reader<R: Read>(
        reader: R,
        max_s_m: f64,
        interior_point_m: Vector2<f64>,
    ) -> Result<Self, RoadMapError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .delimiter(b' ')
            .has_headers(false)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut points = Vec::new();

        for row in csv_reader.deserialize() {
            let row: MapRow = row.map_err(RoadMapError::CsvError)?;

            points.push(ReferencePoint {
                position_m: Vector2::new(row.x, row.y),
                s_m: row.s,
                normal: Vector2::new(row.dx, row.dy),
            });
        }

        Self::new(points, max_s_m, interior_point_m)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const TABLE: &str = "784.6001 1135.571 0 -0.02359831 -0.9997216
815.2679 1134.93 30.6744 -0.01099479 -0.9999396
844.6398 1134.911 60.0463 -0.002048373 -0.9999979
875.0436 1134.808 90.4504 -0.001847863 -0.9999983
";

    #[test]
    fn test_load_table() {
        let map =
            RoadMap::from_reader(TABLE.as_bytes(), 6945.554, Vector2::new(1000.0, 2000.0)).unwrap();

        assert_eq!(map.points().len(), 4);
        assert_eq!(map.points()[1].position_m, Vector2::new(815.2679, 1134.93));
        assert_eq!(map.points()[3].s_m, 90.4504);
        assert_eq!(map.points()[0].normal[1], -0.9997216);
        assert_eq!(map.max_s_m(), 6945.554);
    }

    #[test]
    fn test_load_bad_table() {
        let interior = Vector2::new(1000.0, 2000.0);

        // Not a number
        assert!(matches!(
            RoadMap::from_reader("1 2 0 0 1\n3 4 x 0 1\n".as_bytes(), 100.0, interior),
            Err(RoadMapError::CsvError(_))
        ));

        // Too few columns
        assert!(matches!(
            RoadMap::from_reader("1 2 0 0\n".as_bytes(), 100.0, interior),
            Err(RoadMapError::CsvError(_))
        ));

        // Empty
        assert!(matches!(
            RoadMap::from_reader("".as_bytes(), 100.0, interior),
            Err(RoadMapError::TooFewPoints(0))
        ));

        // Missing file
        assert!(matches!(
            RoadMap::from_csv_path("/no/such/map.csv", 100.0, interior),
            Err(RoadMapError::FileError(_))
        ));
    }
}
