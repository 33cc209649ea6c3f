// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

//! Codec for the [encoded polyline format](https://developers.google.com/maps/documentation/utilities/polylinealgorithm),
//! used by OSRM for route geometries (`geometries=polyline`).
//!
//! Every coordinate is stored as a latitude delta followed by a longitude delta
//! from the previous coordinate, both multiplied by `10^precision`. Each signed delta is
//! zigzag-encoded and split into 5-bit groups (least significant first), with bit
//! `0x20` marking that another group follows. Every group is offset by 63 to land
//! in the printable range `'?'..='~'`.

use crate::Coordinate;

/// Precision of Google and OSRM `polyline` geometries.
/// OSRM's `polyline6` uses a precision of 6.
pub const DEFAULT_PRECISION: u32 = 5;

/// Highest supported precision. Scaled WGS-84 coordinates and their deltas
/// stay exactly representable in both `i64` and `f64` up to this point.
pub const MAX_PRECISION: u32 = 12;

const CHAR_OFFSET: u8 = 63;
const CONTINUATION_BIT: u64 = 0x20;
const GROUP_MASK: u64 = 0x1f;

/// Structural errors detected while decoding a polyline.
///
/// All offsets are byte offsets into the encoded string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    /// The input ended while a value still had its continuation bit set.
    #[error("polyline ends in the middle of a value starting at byte {offset}")]
    Truncated { offset: usize },

    /// The input ended right after a latitude, without the matching longitude.
    #[error("polyline ends after a latitude, longitude expected at byte {offset}")]
    MissingLongitude { offset: usize },

    /// A byte outside of the `'?'..='~'` range was found.
    #[error("invalid polyline character {byte:#04x} at byte {offset}")]
    InvalidCharacter { offset: usize, byte: u8 },

    /// A value, or a running coordinate sum, doesn't fit in 64 bits.
    #[error("polyline value at byte {offset} overflows")]
    Overflow { offset: usize },

    /// The requested precision is above [MAX_PRECISION].
    #[error("unsupported polyline precision {precision} (at most {MAX_PRECISION})")]
    UnsupportedPrecision { precision: u32 },
}

/// Decodes a polyline with the [DEFAULT_PRECISION].
///
/// An empty string decodes into an empty path.
pub fn decode(encoded: &str) -> Result<Vec<Coordinate>, DecodeError> {
    decode_with_precision(encoded, DEFAULT_PRECISION)
}

/// Decodes a polyline whose values were scaled by `10^precision`.
///
/// Precisions above [MAX_PRECISION] are rejected.
pub fn decode_with_precision(
    encoded: &str,
    precision: u32,
) -> Result<Vec<Coordinate>, DecodeError> {
    let factor = scale_factor(precision).ok_or(DecodeError::UnsupportedPrecision { precision })?;
    let bytes = encoded.as_bytes();
    let mut path = Vec::new();
    let mut pos = 0;
    let mut lat: i64 = 0;
    let mut lon: i64 = 0;

    while pos < bytes.len() {
        let lat_offset = pos;
        let lat_delta = decode_value(bytes, &mut pos)?;
        lat = lat
            .checked_add(lat_delta)
            .ok_or(DecodeError::Overflow { offset: lat_offset })?;

        if pos >= bytes.len() {
            return Err(DecodeError::MissingLongitude { offset: pos });
        }

        let lon_offset = pos;
        let lon_delta = decode_value(bytes, &mut pos)?;
        lon = lon
            .checked_add(lon_delta)
            .ok_or(DecodeError::Overflow { offset: lon_offset })?;

        path.push(Coordinate::new(lat as f64 / factor, lon as f64 / factor));
    }

    Ok(path)
}

fn scale_factor(precision: u32) -> Option<f64> {
    if precision > MAX_PRECISION {
        None
    } else {
        Some(10f64.powi(precision as i32))
    }
}

/// Decodes a single zigzag-encoded value starting at `*pos`, advancing `*pos`
/// past the last consumed byte.
fn decode_value(bytes: &[u8], pos: &mut usize) -> Result<i64, DecodeError> {
    let offset = *pos;
    let mut result: u64 = 0;
    let mut shift: u32 = 0;

    loop {
        let byte = *bytes.get(*pos).ok_or(DecodeError::Truncated { offset })?;
        if !(b'?'..=b'~').contains(&byte) {
            return Err(DecodeError::InvalidCharacter { offset: *pos, byte });
        }
        *pos += 1;

        let chunk = (byte - CHAR_OFFSET) as u64;
        let group = chunk & GROUP_MASK;
        if shift >= 64 || (shift > 59 && group >> (64 - shift) != 0) {
            return Err(DecodeError::Overflow { offset });
        }
        result |= group << shift;
        shift += 5;

        if chunk & CONTINUATION_BIT == 0 {
            break;
        }
    }

    if result & 1 != 0 {
        Ok(!((result >> 1) as i64))
    } else {
        Ok((result >> 1) as i64)
    }
}

/// Encodes a path with the [DEFAULT_PRECISION].
pub fn encode(path: &[Coordinate]) -> String {
    encode_with_precision(path, DEFAULT_PRECISION)
}

/// Encodes a path, scaling all values by `10^precision` and rounding
/// to the nearest integer.
///
/// Precisions above [MAX_PRECISION] are clamped to it. Coordinates must be valid,
/// otherwise the output is garbage (but encoding never panics).
pub fn encode_with_precision(path: &[Coordinate], precision: u32) -> String {
    let factor = 10f64.powi(precision.min(MAX_PRECISION) as i32);
    let mut encoded = String::with_capacity(path.len() * 8);
    let mut prev_lat: i64 = 0;
    let mut prev_lon: i64 = 0;

    for c in path {
        let lat = (c.lat * factor).round() as i64;
        let lon = (c.lon * factor).round() as i64;
        encode_value(lat.wrapping_sub(prev_lat), &mut encoded);
        encode_value(lon.wrapping_sub(prev_lon), &mut encoded);
        prev_lat = lat;
        prev_lon = lon;
    }

    encoded
}

fn encode_value(value: i64, encoded: &mut String) {
    let mut v = ((value << 1) ^ (value >> 63)) as u64;
    while v >= CONTINUATION_BIT {
        encoded.push((((v & GROUP_MASK) | CONTINUATION_BIT) as u8 + CHAR_OFFSET) as char);
        v >>= 5;
    }
    encoded.push((v as u8 + CHAR_OFFSET) as char);
}
