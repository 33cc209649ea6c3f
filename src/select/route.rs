// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use crate::polyline::{self, DecodeError};
use crate::{evaluate, Coordinate, FloodIndex, FloodIntersection, VehicleProfile};

/// A route proposed by the routing service.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RouteCandidate {
    pub name: String,

    /// Length of the route, in meters.
    pub distance_m: f64,

    /// Expected travel time, in seconds.
    pub duration_s: f64,

    /// Encoded [polyline](crate::polyline) of the route.
    pub geometry: String,

    /// Total number of maneuvers (steps over all legs) along the route.
    pub leg_steps: usize,
}

/// A [RouteCandidate] together with its decoded path and flood verdict.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct EvaluatedRoute {
    pub candidate: RouteCandidate,
    pub path: Vec<Coordinate>,
    pub intersection: FloodIntersection,
}

impl EvaluatedRoute {
    /// Decodes the candidate's geometry (scaled by `10^precision`) and
    /// [evaluates](crate::evaluate()) it for the given vehicle.
    pub fn new(
        candidate: RouteCandidate,
        vehicle: &VehicleProfile<'_>,
        index: &FloodIndex,
        threshold_km: f64,
        precision: u32,
    ) -> Result<Self, DecodeError> {
        let path = polyline::decode_with_precision(&candidate.geometry, precision)?;
        let intersection = evaluate(&path, vehicle, index, threshold_km);
        Ok(Self {
            candidate,
            path,
            intersection,
        })
    }

    /// A route is viable if it doesn't cross any flood,
    /// or if the crossed flood is shallow enough for the vehicle.
    pub fn is_viable(&self) -> bool {
        !self.intersection.intersects() || self.intersection.is_passable
    }
}
