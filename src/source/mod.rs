// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

//! Readers for data handed over by external collaborators:
//! [OSRM route responses](https://project-osrm.org/docs/v5.24.0/api/#route-service),
//! sensor store dumps and single device payloads.
//!
//! Nothing here performs network requests; responses must already be fetched.

use std::fs::File;
use std::io::{self, BufRead};
use std::path::Path;

use chrono::{DateTime, Utc};

use crate::config::SeverityThresholds;
use crate::{Config, Coordinate, FloodIndex, ReadingError, RouteCandidate, SensorReading};

mod model;
mod osrm;
mod sensors;

/// Format of the input data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    /// Unknown format - guess based on the leading magic bytes
    Unknown,

    /// Force uncompressed JSON
    Json,

    /// Force JSON with [gzip](https://en.wikipedia.org/wiki/Gzip) compression
    JsonGz,

    /// Force JSON with [bzip2](https://en.wikipedia.org/wiki/Bzip2) compression
    JsonBz2,
}

impl FileFormat {
    /// Guesses the format from the first few bytes of the data.
    fn detect(head: &[u8]) -> Self {
        if head.starts_with(&[0x1f, 0x8b]) {
            Self::JsonGz
        } else if head.starts_with(b"BZh") {
            Self::JsonBz2
        } else {
            Self::Json
        }
    }
}

/// Errors which may occur when reading collaborator data.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("io: {0}")]
    Io(#[from] io::Error),

    #[error("json: {0}")]
    Json(#[from] serde_json::Error),

    /// The collaborator itself reported a failure.
    #[error("upstream: {0}")]
    Upstream(String),

    #[error("missing field: {0}")]
    MissingField(&'static str),

    #[error("{field}: {reason}")]
    InvalidField { field: &'static str, reason: String },

    #[error("reading: {0}")]
    Reading(#[from] ReadingError),
}

/// Additional controls for interpreting sensor data.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorOptions {
    pub file_format: FileFormat,

    /// Thresholds for readings which don't carry their own severity label.
    pub thresholds: SeverityThresholds,

    /// Position assigned to device payloads without coordinates.
    pub default_location: Coordinate,
}

impl SensorOptions {
    pub fn from_config(config: &Config, file_format: FileFormat) -> Self {
        Self {
            file_format,
            thresholds: config.severity,
            default_location: config.default_location,
        }
    }
}

impl Default for SensorOptions {
    fn default() -> Self {
        Self::from_config(&Config::default(), FileFormat::Unknown)
    }
}

/// Wraps a reader in a buffered decompressor appropriate for the format.
fn open<'r, R: io::Read + 'r>(format: FileFormat, reader: R) -> io::Result<Box<dyn BufRead + 'r>> {
    let mut b = io::BufReader::new(reader);
    let format = match format {
        FileFormat::Unknown => FileFormat::detect(b.fill_buf()?),
        f => f,
    };

    Ok(match format {
        FileFormat::Unknown | FileFormat::Json => Box::new(b),
        FileFormat::JsonGz => Box::new(io::BufReader::new(flate2::read::MultiGzDecoder::new(b))),
        FileFormat::JsonBz2 => Box::new(io::BufReader::new(bzip2::read::MultiBzDecoder::new(b))),
    })
}

/// Parses route candidates from an OSRM route response.
///
/// The stream will be automatically wrapped in a buffered reader when needed.
pub fn routes_from_io<R: io::Read>(
    format: FileFormat,
    reader: R,
) -> Result<Vec<RouteCandidate>, SourceError> {
    let value = serde_json::from_reader(open(format, reader)?)?;
    osrm::routes_from_value(value)
}

/// Parses route candidates from an OSRM route response stored in a file.
pub fn routes_from_file<P: AsRef<Path>>(
    format: FileFormat,
    path: P,
) -> Result<Vec<RouteCandidate>, SourceError> {
    let f = File::open(path)?;
    routes_from_io(format, f)
}

/// Parses route candidates from an OSRM route response held in memory.
pub fn routes_from_buffer(
    format: FileFormat,
    data: &[u8],
) -> Result<Vec<RouteCandidate>, SourceError> {
    if format == FileFormat::Json {
        // Fast path for uncompressed in-memory data
        osrm::routes_from_value(serde_json::from_slice(data)?)
    } else {
        routes_from_io(format, io::Cursor::new(data))
    }
}

/// Like [routes_from_io], but a failure reported by the routing service itself
/// is logged and yields no candidates, so that [plan](crate::plan) reports
/// [NoCandidates](crate::NoViableReason::NoCandidates). Other errors are returned.
pub fn available_routes_from_io<R: io::Read>(
    format: FileFormat,
    reader: R,
) -> Result<Vec<RouteCandidate>, SourceError> {
    match routes_from_io(format, reader) {
        Err(SourceError::Upstream(message)) => {
            log::warn!("routing service failed: {message}");
            Ok(Vec::new())
        }
        result => result,
    }
}

/// Like [routes_from_file], but tolerates routing service failures,
/// see [available_routes_from_io].
pub fn available_routes_from_file<P: AsRef<Path>>(
    format: FileFormat,
    path: P,
) -> Result<Vec<RouteCandidate>, SourceError> {
    let f = File::open(path)?;
    available_routes_from_io(format, f)
}

/// Parses a sensor store dump into the latest reading of every node.
///
/// Rows which can't be interpreted are skipped with a warning.
pub fn readings_from_io<R: io::Read>(
    options: &SensorOptions,
    reader: R,
) -> Result<Vec<SensorReading>, SourceError> {
    let value = serde_json::from_reader(open(options.file_format, reader)?)?;
    sensors::latest_readings_from_value(value, &options.thresholds)
}

/// Parses a sensor store dump from a file, see [readings_from_io].
pub fn readings_from_file<P: AsRef<Path>>(
    options: &SensorOptions,
    path: P,
) -> Result<Vec<SensorReading>, SourceError> {
    let f = File::open(path)?;
    readings_from_io(options, f)
}

/// Parses an in-memory sensor store dump, see [readings_from_io].
pub fn readings_from_buffer(
    options: &SensorOptions,
    data: &[u8],
) -> Result<Vec<SensorReading>, SourceError> {
    if options.file_format == FileFormat::Json {
        sensors::latest_readings_from_value(serde_json::from_slice(data)?, &options.thresholds)
    } else {
        readings_from_io(options, io::Cursor::new(data))
    }
}

/// Parses a sensor store dump from a file and stores every
/// node's latest reading in the index. Returns the number of stored readings.
pub fn add_readings_from_file<P: AsRef<Path>>(
    index: &mut FloodIndex,
    options: &SensorOptions,
    path: P,
) -> Result<usize, SourceError> {
    let readings = readings_from_file(options, path)?;
    let n = readings.len();
    index.extend(readings);
    Ok(n)
}

/// Interprets a single JSON payload pushed by a sensor device.
///
/// Only `node_id` is mandatory. A missing `water_level` counts as 0,
/// missing coordinates fall back to [SensorOptions::default_location],
/// and an unrecognised `severity` label is coerced to LOW.
pub fn reading_from_device_payload(
    options: &SensorOptions,
    payload: &[u8],
    received_at: DateTime<Utc>,
) -> Result<SensorReading, SourceError> {
    sensors::reading_from_payload(
        serde_json::from_slice(payload)?,
        &options.thresholds,
        options.default_location,
        received_at,
    )
}
