// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use crate::{Coordinate, FloodHit, FloodIndex, VehicleProfile};

/// Recommended distance, in kilometers, under which a route point is
/// considered to cross a sensor node's flood.
pub const DEFAULT_PROXIMITY_KM: f64 = 0.5;

/// Outcome of [evaluate] for a single (route, vehicle) pair.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct FloodIntersection {
    /// The first flooded node encountered along the route, if any.
    pub hit: Option<FloodHit>,

    /// Whether the vehicle can traverse the flood at [FloodIntersection::hit].
    /// Always true if the route doesn't intersect any flood.
    pub is_passable: bool,
}

impl FloodIntersection {
    /// A route not passing close to any flooded node.
    pub fn clear() -> Self {
        Self {
            hit: None,
            is_passable: true,
        }
    }

    pub fn intersects(&self) -> bool {
        self.hit.is_some()
    }
}

/// Walks `path` in order and stops at the first point which is closer than
/// `threshold_km` to a node with a reading (as per [FloodIndex::nearest_within]).
/// The route is passable if that node's water level does not exceed the vehicle's
/// [clearance](VehicleProfile::max_safe_water_level_cm).
///
/// Only the first flooded crossing is considered: a route which clears one flood
/// may still hit a deeper one later, and that one is not reported.
///
/// An empty path, or an empty index, never intersects anything.
/// `vehicle` is used as given, without validation.
pub fn evaluate(
    path: &[Coordinate],
    vehicle: &VehicleProfile<'_>,
    index: &FloodIndex,
    threshold_km: f64,
) -> FloodIntersection {
    if index.is_empty() {
        return FloodIntersection::clear();
    }

    for &point in path {
        if let Some(hit) = index.nearest_within(point, threshold_km) {
            let is_passable = vehicle.can_pass(hit.water_level_cm);
            log::debug!(
                "route crosses {} ({} cm, {}) at {}, passable for {}: {}",
                hit.node_id,
                hit.water_level_cm,
                hit.severity,
                hit.at,
                vehicle.name,
                is_passable,
            );
            return FloodIntersection {
                hit: Some(hit),
                is_passable,
            };
        }
    }

    FloodIntersection::clear()
}
