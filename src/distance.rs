// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use crate::Coordinate;

/// Mean radius of Earth, in meters.
/// Source: https://en.wikipedia.org/wiki/Earth_radius#Arithmetic_mean_radius
const EARTH_RADIUS: f64 = 6_371_008.8;

/// Mean diameter of Earth, in meters.
const EARTH_DIAMETER: f64 = EARTH_RADIUS + EARTH_RADIUS;

/// Calculates the great-circle distance between two positions
/// on Earth using the [haversine formula](https://en.wikipedia.org/wiki/Haversine_formula).
/// Returns the result in meters.
pub fn earth_distance(a: Coordinate, b: Coordinate) -> f64 {
    let lat1 = a.lat.to_radians();
    let lon1 = a.lon.to_radians();
    let lat2 = b.lat.to_radians();
    let lon2 = b.lon.to_radians();

    let sin_dlat_half = ((lat2 - lat1) * 0.5).sin();
    let sin_dlon_half = ((lon2 - lon1) * 0.5).sin();

    let h = sin_dlat_half * sin_dlat_half + lat1.cos() * lat2.cos() * sin_dlon_half * sin_dlon_half;

    // Rounding may push h slightly above 1 for antipodal points
    EARTH_DIAMETER * h.min(1.0).sqrt().asin()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_distance() {
        let p = Coordinate::new(52.2297, 21.0122);
        assert_eq!(earth_distance(p, p), 0.0);
    }

    #[test]
    fn one_micro_degree_of_latitude() {
        let d = earth_distance(Coordinate::new(0.0, 0.0), Coordinate::new(0.000001, 0.0));
        assert!((d - 0.1112).abs() < 0.001, "{d}");
    }

    #[test]
    fn symmetric() {
        let warsaw = Coordinate::new(52.2297, 21.0122);
        let krakow = Coordinate::new(50.0647, 19.9450);
        let there = earth_distance(warsaw, krakow);
        assert_eq!(there, earth_distance(krakow, warsaw));
        assert!((there - 252_000.0).abs() < 1_000.0, "{there}");
    }

    #[test]
    fn antipodes() {
        let d = earth_distance(Coordinate::new(0.0, 0.0), Coordinate::new(0.0, 180.0));
        assert!((d - std::f64::consts::PI * EARTH_RADIUS).abs() < 1.0);
    }
}
