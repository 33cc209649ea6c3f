// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

//! Numeric reference data, consolidated in one place: severity thresholds,
//! vehicle clearances, the fixed sensor node table and proximity settings.
//!
//! Everything has a built-in default, and any subset may be overridden from a
//! TOML file:
//!
//! ```toml
//! proximity_km = 0.3
//!
//! [severity]
//! moderate_cm = 5.0
//! high_cm = 15.0
//! severe_cm = 30.0
//!
//! [[vehicles]]
//! name = "truck"
//! max_safe_water_level_cm = 60.0
//!
//! [nodes.node3]
//! name = "Sto. Tomas Bridge"
//! lat = 14.3215
//! lon = 121.0702
//! ```
//!
//! The `severity` table is merged key by key with the defaults, while `vehicles`
//! and `nodes` replace the built-in tables entirely.

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::Path;

use crate::{Coordinate, FloodIndex, VehicleProfile, DEFAULT_PROXIMITY_KM, VEHICLE_PROFILES};

/// Lower bound (inclusive) of the MODERATE severity tier, in centimeters.
pub const MODERATE_THRESHOLD_CM: f64 = 5.0;

/// Lower bound (inclusive) of the HIGH severity tier, in centimeters.
pub const HIGH_THRESHOLD_CM: f64 = 15.0;

/// Lower bound (inclusive) of the SEVERE severity tier, in centimeters.
pub const SEVERE_THRESHOLD_CM: f64 = 30.0;

/// Clearance assumed for vehicle types absent from the vehicle table.
pub const DEFAULT_CLEARANCE_CM: f64 = crate::DEFAULT_PROFILE.max_safe_water_level_cm;

/// Position assigned to device readings which don't report their own.
pub const DEFAULT_READING_LOCATION: Coordinate = Coordinate::new(14.3036, 121.0781);

/// Errors which may occur when loading a [Config].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("toml: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid {key}: {reason}")]
    Invalid { key: String, reason: String },
}

impl ConfigError {
    fn invalid(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key: key.into(),
            reason: reason.into(),
        }
    }
}

/// Lower bounds of the severity tiers above LOW, in centimeters.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SeverityThresholds {
    pub moderate_cm: f64,
    pub high_cm: f64,
    pub severe_cm: f64,
}

impl SeverityThresholds {
    pub const DEFAULT: Self = Self {
        moderate_cm: MODERATE_THRESHOLD_CM,
        high_cm: HIGH_THRESHOLD_CM,
        severe_cm: SEVERE_THRESHOLD_CM,
    };
}

impl Default for SeverityThresholds {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Owned counterpart of [VehicleProfile], as stored in a [Config].
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VehicleEntry {
    pub name: String,
    pub max_safe_water_level_cm: f64,
}

impl VehicleEntry {
    pub fn as_profile(&self) -> VehicleProfile<'_> {
        VehicleProfile {
            name: &self.name,
            max_safe_water_level_cm: self.max_safe_water_level_cm,
        }
    }
}

impl From<&VehicleProfile<'_>> for VehicleEntry {
    fn from(p: &VehicleProfile<'_>) -> Self {
        Self {
            name: p.name.to_string(),
            max_safe_water_level_cm: p.max_safe_water_level_cm,
        }
    }
}

/// Fixed installation point of a sensor node.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NodeLocation {
    #[serde(default)]
    pub name: String,
    pub lat: f64,
    pub lon: f64,
}

impl NodeLocation {
    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.lat, self.lon)
    }
}

/// Built-in sensor node installations.
pub fn default_nodes() -> BTreeMap<String, NodeLocation> {
    BTreeMap::from([
        (
            "node1".to_string(),
            NodeLocation {
                name: "South Plains (Corner of Sto Tomas Road)".to_string(),
                lat: 14.324827,
                lon: 121.075392,
            },
        ),
        (
            "node2".to_string(),
            NodeLocation {
                name: "South City Drive".to_string(),
                lat: 14.324357,
                lon: 121.073461,
            },
        ),
    ])
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub severity: SeverityThresholds,

    /// Vehicle clearance table, looked up by [Config::vehicle].
    pub vehicles: Vec<VehicleEntry>,

    /// Clearance used for vehicle types missing from [Config::vehicles].
    pub default_clearance_cm: f64,

    /// How close (exclusive, in kilometers) a route must pass to a sensor node
    /// for the node's reading to apply.
    pub proximity_km: f64,

    /// Position assigned to device readings without coordinates.
    pub default_location: Coordinate,

    /// Fixed node installation points, keyed by node id.
    pub nodes: BTreeMap<String, NodeLocation>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            severity: SeverityThresholds::DEFAULT,
            vehicles: VEHICLE_PROFILES.iter().map(VehicleEntry::from).collect(),
            default_clearance_cm: DEFAULT_CLEARANCE_CM,
            proximity_km: DEFAULT_PROXIMITY_KM,
            default_location: DEFAULT_READING_LOCATION,
            nodes: default_nodes(),
        }
    }
}

impl Config {
    /// Parses and [validates](Config::validate) a TOML document.
    /// Missing keys take their default values.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads a TOML configuration file, see [Config::from_toml_str].
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref())?;
        let config = Self::from_toml_str(&content)?;
        log::debug!(
            "loaded configuration from {}: {} vehicles, {} nodes",
            path.as_ref().display(),
            config.vehicles.len(),
            config.nodes.len(),
        );
        Ok(config)
    }

    /// Checks the internal consistency of the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let t = &self.severity;
        let thresholds = [t.moderate_cm, t.high_cm, t.severe_cm];
        if !thresholds.iter().all(|x| x.is_finite()) {
            return Err(ConfigError::invalid("severity", "thresholds must be finite"));
        }
        if !(0.0 <= t.moderate_cm && t.moderate_cm < t.high_cm && t.high_cm < t.severe_cm) {
            return Err(ConfigError::invalid(
                "severity",
                "thresholds must satisfy 0 <= moderate_cm < high_cm < severe_cm",
            ));
        }

        let mut seen = HashSet::new();
        for v in &self.vehicles {
            if v.name.trim().is_empty() {
                return Err(ConfigError::invalid("vehicles", "empty vehicle name"));
            }
            if !seen.insert(v.name.to_ascii_lowercase()) {
                return Err(ConfigError::invalid(
                    "vehicles",
                    format!("duplicate vehicle {:?}", v.name),
                ));
            }
            if !is_positive(v.max_safe_water_level_cm) {
                return Err(ConfigError::invalid(
                    format!("vehicles.{}", v.name),
                    "max_safe_water_level_cm must be positive and finite",
                ));
            }
        }

        if !is_positive(self.default_clearance_cm) {
            return Err(ConfigError::invalid("default_clearance_cm", "must be positive and finite"));
        }

        if !is_positive(self.proximity_km) {
            return Err(ConfigError::invalid("proximity_km", "must be positive and finite"));
        }

        if !self.default_location.is_valid() {
            return Err(ConfigError::invalid("default_location", "not a valid WGS-84 coordinate"));
        }

        for (id, node) in &self.nodes {
            if id.is_empty() {
                return Err(ConfigError::invalid("nodes", "empty node id"));
            }
            if !node.coordinate().is_valid() {
                return Err(ConfigError::invalid(
                    format!("nodes.{id}"),
                    "not a valid WGS-84 coordinate",
                ));
            }
        }

        Ok(())
    }

    /// Finds the clearance profile of a vehicle type (case-insensitive).
    /// Unknown types get [Config::default_clearance_cm].
    pub fn vehicle(&self, key: &str) -> VehicleProfile<'_> {
        VehicleProfile::find(
            self.vehicles.iter().map(VehicleEntry::as_profile),
            key,
            VehicleProfile {
                name: "unknown",
                max_safe_water_level_cm: self.default_clearance_cm,
            },
        )
    }

    /// Creates an empty [FloodIndex] over the configured node table.
    pub fn flood_index(&self) -> FloodIndex {
        FloodIndex::from_locations(self.nodes.clone())
    }
}

#[inline]
fn is_positive(x: f64) -> bool {
    x.is_finite() && x > 0.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        let c = Config::default();
        c.validate().unwrap();
        assert_eq!(c.vehicles.len(), 4);
        assert_eq!(c.proximity_km, 0.5);
        assert_eq!(c.default_clearance_cm, 15.0);
        assert_eq!(
            c.nodes["node1"].coordinate(),
            Coordinate::new(14.324827, 121.075392)
        );
    }

    #[test]
    fn empty_document_gives_defaults() {
        assert_eq!(Config::from_toml_str("").unwrap(), Config::default());
    }

    #[test]
    fn partial_override() {
        let c = Config::from_toml_str(
            r#"
            proximity_km = 0.25

            [severity]
            severe_cm = 40.0

            [[vehicles]]
            name = "truck"
            max_safe_water_level_cm = 60

            [nodes.node3]
            name = "Sto. Tomas Bridge"
            lat = 14.3215
            lon = 121.0702
            "#,
        )
        .unwrap();

        assert_eq!(c.proximity_km, 0.25);
        assert_eq!(
            c.severity,
            SeverityThresholds {
                moderate_cm: 5.0,
                high_cm: 15.0,
                severe_cm: 40.0,
            }
        );
        assert_eq!(c.vehicles.len(), 1);
        assert_eq!(c.vehicle("TRUCK").max_safe_water_level_cm, 60.0);
        assert_eq!(c.vehicle("sedan").max_safe_water_level_cm, 15.0);
        assert_eq!(c.nodes.len(), 1);
        assert_eq!(c.default_location, DEFAULT_READING_LOCATION);
    }

    #[test]
    fn vehicle_lookup_uses_default_clearance() {
        let c = Config {
            default_clearance_cm: 12.0,
            ..Config::default()
        };
        assert_eq!(c.vehicle("suv").max_safe_water_level_cm, 30.0);
        assert_eq!(c.vehicle("tricycle").max_safe_water_level_cm, 12.0);
    }

    #[test]
    fn rejects_overlapping_thresholds() {
        let err = Config::from_toml_str("[severity]\nhigh_cm = 3.0").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { ref key, .. } if key == "severity"));
    }

    #[test]
    fn rejects_non_positive_clearance() {
        let doc = "[[vehicles]]\nname = \"boat\"\nmax_safe_water_level_cm = 0.0";
        let err = Config::from_toml_str(doc).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { ref key, .. } if key == "vehicles.boat"));
    }

    #[test]
    fn rejects_duplicate_vehicles() {
        let err = Config::from_toml_str(
            r#"
            [[vehicles]]
            name = "suv"
            max_safe_water_level_cm = 30.0

            [[vehicles]]
            name = "SUV"
            max_safe_water_level_cm = 35.0
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { ref key, .. } if key == "vehicles"));
    }

    #[test]
    fn rejects_invalid_node_coordinates() {
        let err = Config::from_toml_str("[nodes.far]\nlat = 91.0\nlon = 0.0").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { ref key, .. } if key == "nodes.far"));
    }

    #[test]
    fn rejects_unknown_keys() {
        assert!(matches!(
            Config::from_toml_str("proximity_miles = 1.0"),
            Err(ConfigError::Toml(_))
        ));
    }

    #[test]
    fn flood_index_uses_node_table() {
        let index = Config::default().flood_index();
        assert!(index.is_empty());
        assert_eq!(
            index.node_location("node2"),
            Some(Coordinate::new(14.324357, 121.073461))
        );
        assert_eq!(index.node_location("node9"), None);
        assert_eq!(index.node_name("node2"), "South City Drive");
    }

    #[test]
    fn flood_index_uses_configured_names() {
        let config = Config::from_toml_str(
            r#"
            [nodes.node3]
            name = "Sto. Tomas Bridge"
            lat = 14.3215
            lon = 121.0702

            [nodes.node4]
            lat = 14.3
            lon = 121.0
            "#,
        )
        .unwrap();

        let index = config.flood_index();
        assert_eq!(index.node_name("node3"), "Sto. Tomas Bridge");
        assert_eq!(index.node_name("node4"), "node4");
        assert_eq!(index.node_location("node1"), None);
    }
}
