// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::collections::btree_map::{BTreeMap, Entry};

use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::Value;

use super::model::{LenientNumber, SensorRow};
use super::SourceError;
use crate::config::SeverityThresholds;
use crate::{Coordinate, SensorReading};

/// Timestamp format used by the sensor store, always in UTC.
const STORE_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Picks the latest reading of every node from a sensor store dump:
/// either a bare array of rows, or an object with the rows under `nodes`.
///
/// Returned readings are ordered by node id.
pub(super) fn latest_readings_from_value(
    value: Value,
    thresholds: &SeverityThresholds,
) -> Result<Vec<SensorReading>, SourceError> {
    let rows = match value {
        Value::Array(rows) => rows,
        Value::Object(mut obj) => match obj.remove("nodes") {
            Some(Value::Array(rows)) => rows,
            Some(_) => {
                return Err(SourceError::InvalidField {
                    field: "nodes",
                    reason: "expected an array".to_string(),
                })
            }
            None => {
                let message = ["error", "message"]
                    .iter()
                    .find_map(|&key| obj.get(key).and_then(Value::as_str))
                    .unwrap_or("sensor store returned no readings");
                return Err(SourceError::Upstream(message.to_string()));
            }
        },
        _ => {
            return Err(SourceError::InvalidField {
                field: "root",
                reason: "expected an array or an object".to_string(),
            })
        }
    };

    let mut latest: BTreeMap<String, SensorReading> = BTreeMap::default();
    for (idx, row) in rows.into_iter().enumerate() {
        let reading = match reading_from_row(row, thresholds) {
            Ok(reading) => reading,
            Err(e) => {
                log::warn!("skipping sensor row {idx}: {e}");
                continue;
            }
        };

        match latest.entry(reading.node_id().to_string()) {
            Entry::Vacant(e) => {
                e.insert(reading);
            }
            Entry::Occupied(mut e) => {
                if reading.timestamp() >= e.get().timestamp() {
                    e.insert(reading);
                }
            }
        }
    }

    Ok(latest.into_values().collect())
}

fn reading_from_row(
    row: Value,
    thresholds: &SeverityThresholds,
) -> Result<SensorReading, SourceError> {
    let row: SensorRow = serde_json::from_value(row)?;

    let timestamp = match row.timestamp.as_deref() {
        Some(s) => parse_timestamp(s)?,
        None => return Err(SourceError::MissingField("timestamp")),
    };
    let water_level = required_number(&row.water_level, "water_level")?;
    let lat = required_number(&row.latitude, "latitude")?;
    let lon = required_number(&row.longitude, "longitude")?;

    build_reading(
        &row,
        water_level,
        Coordinate::new(lat, lon),
        timestamp,
        thresholds,
    )
}

/// Interprets a payload pushed by a device, see [super::reading_from_device_payload].
pub(super) fn reading_from_payload(
    value: Value,
    thresholds: &SeverityThresholds,
    default_location: Coordinate,
    received_at: DateTime<Utc>,
) -> Result<SensorReading, SourceError> {
    if !value.is_object() {
        return Err(SourceError::InvalidField {
            field: "root",
            reason: "expected an object".to_string(),
        });
    }

    let row: SensorRow = serde_json::from_value(value)?;
    let water_level = number(&row.water_level, "water_level")?.unwrap_or(0.0);
    let coordinate = Coordinate::new(
        number(&row.latitude, "latitude")?.unwrap_or(default_location.lat),
        number(&row.longitude, "longitude")?.unwrap_or(default_location.lon),
    );

    let reading = build_reading(&row, water_level, coordinate, received_at, thresholds)?;
    log::debug!(
        "{}: {} cm ({})",
        reading.node_id(),
        reading.water_level_cm(),
        reading.severity()
    );
    Ok(reading)
}

fn build_reading(
    row: &SensorRow,
    water_level: f64,
    coordinate: Coordinate,
    timestamp: DateTime<Utc>,
    thresholds: &SeverityThresholds,
) -> Result<SensorReading, SourceError> {
    let node_id = row
        .node_id
        .clone()
        .ok_or(SourceError::MissingField("node_id"))?;

    let reading = SensorReading::new(node_id, water_level, coordinate, timestamp)?;
    let classification =
        thresholds.classify_with_label(reading.water_level_cm(), row.severity.as_deref());
    let reading = reading.with_classification(classification);

    Ok(match row.sensor_reading.as_ref().map(LenientNumber::as_i64) {
        Some(Some(raw)) => reading.with_raw_reading(raw),
        Some(None) => {
            log::warn!("{}: ignoring malformed raw sensor value", reading.node_id());
            reading
        }
        None => reading,
    })
}

fn number(value: &Option<LenientNumber>, field: &'static str) -> Result<Option<f64>, SourceError> {
    match value {
        None => Ok(None),
        Some(n) => n
            .as_f64()
            .map(Some)
            .ok_or_else(|| SourceError::InvalidField {
                field,
                reason: format!("not a finite number: {n:?}"),
            }),
    }
}

fn required_number(value: &Option<LenientNumber>, field: &'static str) -> Result<f64, SourceError> {
    match number(value, field)? {
        Some(x) => Ok(x),
        None => Err(SourceError::MissingField(field)),
    }
}

/// Parses an RFC 3339 timestamp, or a store timestamp without an offset (assumed UTC).
fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, SourceError> {
    if let Ok(t) = DateTime::parse_from_rfc3339(s) {
        return Ok(t.with_timezone(&Utc));
    }

    NaiveDateTime::parse_from_str(s, STORE_TIMESTAMP_FORMAT)
        .map(|t| t.and_utc())
        .map_err(|e| SourceError::InvalidField {
            field: "timestamp",
            reason: format!("{s:?}: {e}"),
        })
}
