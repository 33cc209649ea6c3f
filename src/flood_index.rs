// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::collections::btree_map::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};

use crate::config::NodeLocation;
use crate::{distance_km, Classification, Coordinate, FloodStatus, Severity};

/// Reasons why a [SensorReading] can't be constructed.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ReadingError {
    #[error("empty node id")]
    EmptyNodeId,

    #[error("water level of {node_id} is not a finite number")]
    NonFiniteWaterLevel { node_id: String },

    #[error("invalid coordinate {coordinate} of {node_id}")]
    InvalidCoordinate {
        node_id: String,
        coordinate: Coordinate,
    },
}

/// A single water-level measurement reported by a sensor node.
///
/// Readings are immutable once constructed; a newer measurement
/// replaces the whole reading in a [FloodIndex].
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct SensorReading {
    node_id: String,
    water_level_cm: f64,
    severity: Severity,
    flood_status: FloodStatus,
    coordinate: Coordinate,
    timestamp: DateTime<Utc>,
    raw_reading: Option<i64>,
}

impl SensorReading {
    /// Creates a new reading, classified with the [default thresholds](crate::classify).
    ///
    /// Negative water levels are clamped to zero.
    pub fn new(
        node_id: impl Into<String>,
        water_level_cm: f64,
        coordinate: Coordinate,
        timestamp: DateTime<Utc>,
    ) -> Result<Self, ReadingError> {
        let node_id = node_id.into();
        if node_id.trim().is_empty() {
            return Err(ReadingError::EmptyNodeId);
        }
        if !water_level_cm.is_finite() {
            return Err(ReadingError::NonFiniteWaterLevel { node_id });
        }
        if !coordinate.is_valid() {
            return Err(ReadingError::InvalidCoordinate {
                node_id,
                coordinate,
            });
        }

        let water_level_cm = if water_level_cm < 0.0 {
            log::warn!("{node_id}: negative water level {water_level_cm} cm clamped to 0");
            0.0
        } else {
            water_level_cm
        };

        let c = crate::classify(water_level_cm);
        Ok(Self {
            node_id,
            water_level_cm,
            severity: c.severity,
            flood_status: c.flood_status,
            coordinate,
            timestamp,
            raw_reading: None,
        })
    }

    /// Replaces the computed severity and flood status.
    pub fn with_classification(mut self, c: Classification) -> Self {
        self.severity = c.severity;
        self.flood_status = c.flood_status;
        self
    }

    /// Attaches the raw, uncalibrated sensor value.
    pub fn with_raw_reading(mut self, raw: i64) -> Self {
        self.raw_reading = Some(raw);
        self
    }

    pub fn node_id(&self) -> &str {
        &self.node_id
    }

    pub fn water_level_cm(&self) -> f64 {
        self.water_level_cm
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn flood_status(&self) -> FloodStatus {
        self.flood_status
    }

    /// Position reported alongside the reading. Proximity queries use the
    /// fixed node table of the [FloodIndex] instead.
    pub fn coordinate(&self) -> Coordinate {
        self.coordinate
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn raw_reading(&self) -> Option<i64> {
        self.raw_reading
    }
}

/// A sensor node found close to a queried point.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct FloodHit {
    pub node_id: String,

    /// Location name of the node, see [FloodIndex::node_name].
    pub node_name: String,

    pub severity: Severity,
    pub water_level_cm: f64,

    /// The queried point (on a route: the first point close to the node).
    pub at: Coordinate,

    /// Fixed installation point of the node.
    pub node_coordinate: Coordinate,

    /// Distance between [FloodHit::at] and [FloodHit::node_coordinate], in kilometers.
    pub distance_km: f64,
}

/// Latest [SensorReading] of every node, together with the fixed
/// installation points of the nodes.
///
/// The node table is given at construction and never changes afterwards.
/// Readings from nodes missing from the table are kept, but never match
/// proximity queries.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct FloodIndex {
    readings: BTreeMap<String, SensorReading>,
    nodes: BTreeMap<String, NodeLocation>,
}

impl FloodIndex {
    /// Creates an index without any readings over a table of unnamed nodes.
    pub fn new<I: IntoIterator<Item = (String, Coordinate)>>(nodes: I) -> Self {
        Self::from_locations(nodes.into_iter().map(|(id, c)| {
            let node = NodeLocation {
                name: String::new(),
                lat: c.lat,
                lon: c.lon,
            };
            (id, node)
        }))
    }

    /// Creates an index without any readings over the provided node table.
    pub fn from_locations<I: IntoIterator<Item = (String, NodeLocation)>>(nodes: I) -> Self {
        Self {
            readings: BTreeMap::default(),
            nodes: nodes.into_iter().collect(),
        }
    }

    /// Creates an index without any readings over the
    /// [built-in node table](crate::config::default_nodes).
    pub fn with_default_nodes() -> Self {
        Self::from_locations(crate::config::default_nodes())
    }

    /// Returns the number of nodes with a reading.
    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    /// Returns an iterator over current readings, ordered by node id.
    pub fn iter(&self) -> impl Iterator<Item = &SensorReading> {
        self.readings.values()
    }

    /// Retrieves the current reading of a node.
    pub fn get(&self, node_id: &str) -> Option<&SensorReading> {
        self.readings.get(node_id)
    }

    /// Retrieves the fixed installation point of a node.
    pub fn node_location(&self, node_id: &str) -> Option<Coordinate> {
        self.nodes.get(node_id).map(NodeLocation::coordinate)
    }

    /// Returns the location name of a node, falling back to the node id
    /// for unknown and unnamed nodes.
    pub fn node_name<'a>(&'a self, node_id: &'a str) -> &'a str {
        match self.nodes.get(node_id) {
            Some(node) if !node.name.is_empty() => &node.name,
            _ => node_id,
        }
    }

    /// Stores a reading, replacing any previous reading of the same node
    /// (last write wins). Returns the replaced reading.
    pub fn upsert(&mut self, reading: SensorReading) -> Option<SensorReading> {
        if !self.nodes.contains_key(reading.node_id()) {
            log::warn!(
                "{}: no known installation point, reading won't match any route",
                reading.node_id()
            );
        }
        self.readings.insert(reading.node_id.clone(), reading)
    }

    /// Finds the node closest to `point`, among nodes strictly closer than
    /// `max_distance_km`. Ties are broken by the lexicographically smallest node id.
    ///
    /// This function computes the distance to every node with a reading,
    /// which is fine for the handful of sensors a deployment has.
    pub fn nearest_within(&self, point: Coordinate, max_distance_km: f64) -> Option<FloodHit> {
        self.readings
            .iter()
            .filter_map(|(node_id, reading)| {
                let node_coordinate = self.nodes.get(node_id)?.coordinate();
                let d = distance_km(point, node_coordinate);
                if d < max_distance_km {
                    Some((d, reading, node_coordinate))
                } else {
                    None
                }
            })
            .min_by(|(a_dist, a, _), (b_dist, b, _)| {
                a_dist
                    .total_cmp(b_dist)
                    .then_with(|| a.node_id.cmp(&b.node_id))
            })
            .map(|(d, reading, node_coordinate)| FloodHit {
                node_id: reading.node_id.clone(),
                node_name: self.node_name(&reading.node_id).to_string(),
                severity: reading.severity,
                water_level_cm: reading.water_level_cm,
                at: point,
                node_coordinate,
                distance_km: d,
            })
    }

    /// Returns the readings with a water level strictly above `min_water_level_cm`,
    /// deepest first. Equal levels are ordered by node id.
    pub fn flooded_above(&self, min_water_level_cm: f64) -> Vec<&SensorReading> {
        let mut flooded = self
            .readings
            .values()
            .filter(|r| r.water_level_cm > min_water_level_cm)
            .collect::<Vec<_>>();

        // readings are already ordered by node id, and the sort is stable
        flooded.sort_by(|a, b| b.water_level_cm.total_cmp(&a.water_level_cm));
        flooded
    }
}

impl Extend<SensorReading> for FloodIndex {
    fn extend<I: IntoIterator<Item = SensorReading>>(&mut self, iter: I) {
        for reading in iter {
            self.upsert(reading);
        }
    }
}

/// A [FloodIndex] shared between an ingestion path and concurrent route evaluations.
///
/// Writes are exclusive, so readers never observe a partially replaced reading;
/// any number of evaluations may hold [SharedFloodIndex::read] at once.
#[derive(Debug, Default, Clone)]
pub struct SharedFloodIndex(Arc<RwLock<FloodIndex>>);

impl SharedFloodIndex {
    pub fn new(index: FloodIndex) -> Self {
        Self(Arc::new(RwLock::new(index)))
    }

    /// Stores a reading under the write lock, see [FloodIndex::upsert].
    pub fn upsert(&self, reading: SensorReading) -> Option<SensorReading> {
        self.write().upsert(reading)
    }

    /// Stores multiple readings under a single write lock acquisition.
    pub fn extend<I: IntoIterator<Item = SensorReading>>(&self, readings: I) {
        self.write().extend(readings);
    }

    /// Acquires a read lock over the index.
    pub fn read(&self) -> RwLockReadGuard<'_, FloodIndex> {
        // A panicking writer can't leave a half-inserted map entry behind
        self.0.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Clones the current state of the index, releasing the lock immediately.
    pub fn snapshot(&self) -> FloodIndex {
        self.read().clone()
    }

    fn write(&self) -> RwLockWriteGuard<'_, FloodIndex> {
        self.0.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl From<FloodIndex> for SharedFloodIndex {
    fn from(index: FloodIndex) -> Self {
        Self::new(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 7, 24, hour, 0, 0).unwrap()
    }

    fn reading(node_id: &str, level: f64) -> SensorReading {
        SensorReading::new(node_id, level, Coordinate::new(14.3036, 121.0781), at(8)).unwrap()
    }

    fn index() -> FloodIndex {
        FloodIndex::new([
            ("a".to_string(), Coordinate::new(0.0, 0.0)),
            ("b".to_string(), Coordinate::new(0.0, 0.002)),
            ("c".to_string(), Coordinate::new(0.0, -0.002)),
            ("far".to_string(), Coordinate::new(1.0, 1.0)),
        ])
    }

    #[test]
    fn reading_validation() {
        let c = Coordinate::new(14.3, 121.0);
        assert_eq!(
            SensorReading::new(" ", 1.0, c, at(0)),
            Err(ReadingError::EmptyNodeId)
        );
        assert!(matches!(
            SensorReading::new("n", f64::NAN, c, at(0)),
            Err(ReadingError::NonFiniteWaterLevel { .. })
        ));
        assert!(matches!(
            SensorReading::new("n", 1.0, Coordinate::new(0.0, 200.0), at(0)),
            Err(ReadingError::InvalidCoordinate { .. })
        ));
    }

    #[test]
    fn reading_is_classified() {
        let r = reading("node1", 20.0);
        assert_eq!(r.severity(), Severity::High);
        assert_eq!(r.flood_status(), FloodStatus::SignificantFlood);

        let r = reading("node1", -3.0);
        assert_eq!(r.water_level_cm(), 0.0);
        assert_eq!(r.severity(), Severity::Low);

        let r = reading("node1", 2.0).with_classification(Severity::Severe.into());
        assert_eq!(r.severity(), Severity::Severe);
        assert_eq!(r.flood_status(), FloodStatus::MajorFlood);
    }

    #[test]
    fn upsert_last_write_wins() {
        let mut idx = index();
        assert_eq!(idx.upsert(reading("a", 3.0)), None);
        let replaced = idx.upsert(reading("a", 12.0)).unwrap();
        assert_eq!(replaced.water_level_cm(), 3.0);
        assert_eq!(idx.len(), 1);
        assert_eq!(idx.get("a").unwrap().water_level_cm(), 12.0);
    }

    #[test]
    fn nearest_within_empty() {
        assert_eq!(index().nearest_within(Coordinate::new(0.0, 0.0), 0.5), None);
        assert_eq!(
            FloodIndex::default().nearest_within(Coordinate::new(0.0, 0.0), 0.5),
            None
        );
    }

    #[test]
    fn nearest_within_picks_nearest() {
        let mut idx = index();
        idx.extend([reading("a", 3.0), reading("b", 20.0), reading("far", 50.0)]);

        let hit = idx
            .nearest_within(Coordinate::new(0.0, 0.0015), 0.5)
            .unwrap();
        assert_eq!(hit.node_id, "b");
        assert_eq!(hit.node_name, "b");
        assert_eq!(hit.severity, Severity::High);
        assert_eq!(hit.water_level_cm, 20.0);
        assert_eq!(hit.at, Coordinate::new(0.0, 0.0015));
        assert_eq!(hit.node_coordinate, Coordinate::new(0.0, 0.002));
        assert!(hit.distance_km < 0.06);

        let hit = idx.nearest_within(Coordinate::new(0.0, 0.0005), 0.5).unwrap();
        assert_eq!(hit.node_id, "a");
    }

    #[test]
    fn nearest_within_threshold_is_exclusive() {
        let mut idx = index();
        idx.upsert(reading("a", 3.0));
        let p = Coordinate::new(0.0, 0.001);
        let d = distance_km(p, Coordinate::new(0.0, 0.0));
        assert_eq!(idx.nearest_within(p, d), None);
        assert!(idx.nearest_within(p, d * 1.0001).is_some());
        assert_eq!(idx.nearest_within(Coordinate::new(0.5, 0.5), 0.5), None);
    }

    #[test]
    fn nearest_within_tie_breaks_by_node_id() {
        let mut idx = index();
        idx.extend([reading("c", 40.0), reading("b", 20.0)]);

        // (0, 0) is equally distant from "b" and "c"
        let hit = idx.nearest_within(Coordinate::new(0.0, 0.0), 0.5).unwrap();
        assert_eq!(hit.node_id, "b");
    }

    #[test]
    fn nearest_within_ignores_unknown_nodes() {
        let mut idx = index();
        idx.upsert(reading("mystery", 99.0));
        assert_eq!(idx.len(), 1);
        assert_eq!(idx.nearest_within(Coordinate::new(0.0, 0.0), 100.0), None);
    }

    #[test]
    fn default_nodes() {
        let idx = FloodIndex::with_default_nodes();
        assert!(idx.node_location("node1").is_some());
        assert!(idx.node_location("node2").is_some());
        assert_eq!(
            idx.node_name("node1"),
            "South Plains (Corner of Sto Tomas Road)"
        );
        assert_eq!(idx.node_name("node2"), "South City Drive");
        assert_eq!(idx.node_name("node7"), "node7");
    }

    #[test]
    fn hit_carries_node_name() {
        let mut idx = FloodIndex::with_default_nodes();
        idx.upsert(reading("node2", 12.0));
        let hit = idx
            .nearest_within(Coordinate::new(14.324357, 121.073461), 0.5)
            .unwrap();
        assert_eq!(hit.node_id, "node2");
        assert_eq!(hit.node_name, "South City Drive");
    }

    fn flooded_levels(idx: &FloodIndex, min_water_level_cm: f64) -> Vec<(&str, f64)> {
        idx.flooded_above(min_water_level_cm)
            .into_iter()
            .map(|r| (r.node_id(), r.water_level_cm()))
            .collect()
    }

    #[test]
    fn flooded_above() {
        let mut idx = index();
        idx.extend([
            reading("a", 3.0),
            reading("c", 20.0),
            reading("b", 20.0),
            reading("far", 45.0),
            reading("lost", 10.0),
        ]);

        assert_eq!(
            flooded_levels(&idx, 5.0),
            [("far", 45.0), ("b", 20.0), ("c", 20.0), ("lost", 10.0)]
        );
        assert_eq!(flooded_levels(&idx, 20.0), [("far", 45.0)]);
        assert!(flooded_levels(&idx, 45.0).is_empty());
        assert_eq!(flooded_levels(&idx, 0.0).len(), 5);
    }

    #[test]
    fn shared_index_concurrent_access() {
        let shared = SharedFloodIndex::new(index());
        shared.upsert(reading("a", 1.0));

        std::thread::scope(|s| {
            s.spawn(|| {
                for level in 2..50 {
                    shared.upsert(reading("a", level as f64));
                }
            });

            for _ in 0..4 {
                s.spawn(|| {
                    for _ in 0..50 {
                        let idx = shared.read();
                        let hit = idx.nearest_within(Coordinate::new(0.0, 0.0), 0.5).unwrap();
                        let stored = idx.get("a").unwrap();
                        assert_eq!(hit.water_level_cm, stored.water_level_cm());
                        assert_eq!(hit.severity, stored.severity());
                    }
                });
            }
        });

        assert_eq!(shared.snapshot().get("a").unwrap().water_level_cm(), 49.0);
    }
}
