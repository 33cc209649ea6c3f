// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

//! Wire representations of collaborator data. Only fields used by the
//! crate are declared; everything else is ignored.

use serde::de::IgnoredAny;

/// A number, which PHP backends tend to send as a string.
#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
#[serde(untagged)]
pub enum LenientNumber {
    Number(f64),
    Text(String),
}

impl LenientNumber {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(x) => Some(*x),
            Self::Text(s) => s.trim().parse().ok(),
        }
        .filter(|x: &f64| x.is_finite())
    }

    pub fn as_i64(&self) -> Option<i64> {
        self.as_f64()
            .filter(|x| x.fract() == 0.0 && x.abs() < i64::MAX as f64)
            .map(|x| x as i64)
    }
}

/// A row of the sensor store, or a payload pushed by a device.
#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
pub struct SensorRow {
    pub node_id: Option<String>,
    pub water_level: Option<LenientNumber>,
    pub severity: Option<String>,
    pub latitude: Option<LenientNumber>,
    pub longitude: Option<LenientNumber>,
    pub sensor_reading: Option<LenientNumber>,
    pub timestamp: Option<String>,
}

/// Top-level object of an [OSRM route response](https://project-osrm.org/docs/v5.24.0/api/#responses).
#[derive(Debug, Clone, serde::Deserialize)]
pub struct OsrmResponse {
    pub code: Option<String>,
    pub message: Option<String>,
    #[serde(default)]
    pub routes: Vec<OsrmRoute>,
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct OsrmRoute {
    pub name: Option<String>,
    pub distance: f64,
    pub duration: f64,

    /// An encoded polyline, unless the request asked for `geometries=geojson`.
    pub geometry: serde_json::Value,

    #[serde(default)]
    pub legs: Vec<OsrmLeg>,
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct OsrmLeg {
    #[serde(default)]
    pub steps: Vec<IgnoredAny>,
}
