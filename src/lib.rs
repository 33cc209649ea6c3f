// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

//! Flood-aware evaluation of candidate travel routes.
//!
//! Water-level readings from fixed sensor nodes are kept in a [FloodIndex].
//! Candidate routes, as returned by an [OSRM](https://project-osrm.org/)-style
//! routing service, are decoded from their [polyline](crate::polyline) geometry,
//! walked against the index, and judged passable or not for a given
//! [VehicleProfile]. Passable routes are then ranked by a [Preference].
//!
//! The crate never talks to the network: sensor dumps and routing responses
//! must be fetched by the caller and handed over through [source].
//!
//! # Example
//!
//! ```no_run
//! let config = floodroute::Config::default();
//! let mut index = config.flood_index();
//! let sensor_options = floodroute::source::SensorOptions::from_config(
//!     &config,
//!     floodroute::source::FileFormat::Unknown,
//! );
//! floodroute::source::add_readings_from_file(&mut index, &sensor_options, "path/to/sensors.json")
//!     .expect("failed to load sensor readings");
//!
//! let candidates = floodroute::source::routes_from_file(
//!     floodroute::source::FileFormat::Json,
//!     "path/to/osrm_response.json",
//! ).expect("failed to load routes");
//!
//! let options = floodroute::PlanOptions {
//!     preference: floodroute::Preference::Safest,
//!     proximity_km: config.proximity_km,
//!     ..Default::default()
//! };
//! match floodroute::plan(&candidates, &config.vehicle("suv"), &index, &options) {
//!     Ok(plan) => println!("best route: {}", plan.ranked[0].route.candidate.name),
//!     Err(e) => println!("{e}"),
//! }
//! ```

pub mod config;
mod distance;
mod evaluate;
mod flood_index;
pub mod polyline;
mod select;
mod severity;
pub mod source;
mod vehicle;

pub use config::Config;
pub use distance::{deg2rad, distance_km, rad2deg};
pub use evaluate::{evaluate, FloodIntersection, DEFAULT_PROXIMITY_KM};
pub use flood_index::{FloodHit, FloodIndex, ReadingError, SensorReading, SharedFloodIndex};
pub use polyline::DecodeError;
pub use select::{
    filter_viable, plan, rank, select, Annotation, EvaluatedRoute, NoViableReason, NoViableRoute,
    Plan, PlanOptions, Preference, RankedRoute, RejectedRoute, RouteCandidate, RouteStatus,
    UnknownPreference,
};
pub use severity::{classify, classify_with_label, Classification, FloodStatus, Severity};
pub use vehicle::{
    VehicleProfile, DEFAULT_PROFILE, FOUR_BY_FOUR_PROFILE, PICKUP_PROFILE, SEDAN_PROFILE,
    SUV_PROFILE, VEHICLE_PROFILES,
};

/// A WGS-84 position, in degrees.
///
/// Valid coordinates satisfy `-90 ≤ lat ≤ 90` and `-180 ≤ lon ≤ 180`.
/// Geometric functions treat this as a precondition and don't check it;
/// use [Coordinate::is_valid] at the boundaries where untrusted data comes in.
#[derive(Debug, Clone, Copy, PartialEq, Default, serde::Serialize, serde::Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinate {
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Checks that both components are finite and within WGS-84 bounds.
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lon.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lon)
    }
}

impl std::fmt::Display for Coordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.6}, {:.6})", self.lat, self.lon)
    }
}
