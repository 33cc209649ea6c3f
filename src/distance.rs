// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use crate::Coordinate;

/// Radius of Earth used for flood proximity checks, in kilometers.
const EARTH_RADIUS: f64 = 6371.0;

/// Diameter matching [EARTH_RADIUS], in kilometers.
const EARTH_DIAMETER: f64 = EARTH_RADIUS + EARTH_RADIUS;

#[inline]
pub fn deg2rad(deg: f64) -> f64 {
    deg * (std::f64::consts::PI / 180.0)
}

#[inline]
pub fn rad2deg(rad: f64) -> f64 {
    rad * (180.0 / std::f64::consts::PI)
}

/// Calculates the great-circle distance between two positions
/// on Earth using the [haversine formula](https://en.wikipedia.org/wiki/Haversine_formula).
/// Returns the result in kilometers.
///
/// Both positions must be [valid](Coordinate::is_valid); this is not checked.
pub fn distance_km(a: Coordinate, b: Coordinate) -> f64 {
    let lat1 = deg2rad(a.lat);
    let lat2 = deg2rad(b.lat);

    let sin_dlat_half = (deg2rad(b.lat - a.lat) * 0.5).sin();
    let sin_dlon_half = (deg2rad(b.lon - a.lon) * 0.5).sin();

    let h = sin_dlat_half * sin_dlat_half + lat1.cos() * lat2.cos() * sin_dlon_half * sin_dlon_half;

    // Rounding may push h a hair over 1 for antipodal points
    EARTH_DIAMETER * h.sqrt().min(1.0).asin()
}
