// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use crate::Coordinate;

/// Number of coordinate units per degree used when deriving a [NodeId].
/// Six decimal places correspond to roughly 0.1 m at the equator.
pub const COORDINATE_PRECISION: f64 = 1_000_000.0;

/// Canonical identifier of a [Node](crate::Node), derived from its coordinate
/// rounded to [COORDINATE_PRECISION].
///
/// Shape points of different road segments which round to the same position
/// share a NodeId and thus collapse into a single node of the [Graph](crate::Graph).
///
/// NodeIds order by latitude first, then by longitude. The string form
/// (see [Display](std::fmt::Display)) is `"{lat}_{lon}"` with six decimal places.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId {
    lat_e6: i64,
    lon_e6: i64,
}

impl NodeId {
    /// Derives the canonical id of the given position.
    pub fn from_coordinate(c: Coordinate) -> Self {
        Self {
            lat_e6: (c.lat * COORDINATE_PRECISION).round() as i64,
            lon_e6: (c.lon * COORDINATE_PRECISION).round() as i64,
        }
    }

    /// Rounded latitude and longitude, in units of 1/[COORDINATE_PRECISION] degrees.
    pub fn as_micro_degrees(self) -> (i64, i64) {
        (self.lat_e6, self.lon_e6)
    }

    /// Returns the rounded position this id represents.
    pub fn coordinate(self) -> Coordinate {
        Coordinate {
            lat: self.lat_e6 as f64 / COORDINATE_PRECISION,
            lon: self.lon_e6 as f64 / COORDINATE_PRECISION,
        }
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        fn write_part(f: &mut std::fmt::Formatter<'_>, v: i64) -> std::fmt::Result {
            let sign = if v < 0 { "-" } else { "" };
            let v = v.unsigned_abs();
            write!(f, "{sign}{}.{:06}", v / 1_000_000, v % 1_000_000)
        }

        write_part(f, self.lat_e6)?;
        f.write_str("_")?;
        write_part(f, self.lon_e6)
    }
}
