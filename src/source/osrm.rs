// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use serde_json::Value;

use super::model::{OsrmResponse, OsrmRoute};
use super::SourceError;
use crate::RouteCandidate;

/// Converts a parsed OSRM route response (or a bare array of OSRM route objects)
/// into route candidates, keeping the service's order.
pub(super) fn routes_from_value(value: Value) -> Result<Vec<RouteCandidate>, SourceError> {
    let routes: Vec<OsrmRoute> = match value {
        Value::Array(_) => serde_json::from_value(value)?,
        _ => {
            let response: OsrmResponse = serde_json::from_value(value)?;
            match response.code.as_deref() {
                None | Some("Ok") => response.routes,
                Some(code) => {
                    return Err(SourceError::Upstream(
                        response.message.unwrap_or_else(|| code.to_string()),
                    ))
                }
            }
        }
    };

    routes
        .into_iter()
        .enumerate()
        .map(|(idx, route)| candidate_from_route(idx, route))
        .collect()
}

fn candidate_from_route(idx: usize, route: OsrmRoute) -> Result<RouteCandidate, SourceError> {
    let geometry = match route.geometry {
        Value::String(s) => s,
        _ => {
            return Err(SourceError::InvalidField {
                field: "geometry",
                reason: "expected an encoded polyline (request with geometries=polyline)"
                    .to_string(),
            })
        }
    };

    if !(route.distance >= 0.0 && route.duration >= 0.0) {
        return Err(SourceError::InvalidField {
            field: "distance",
            reason: format!(
                "route {} has a negative distance or duration",
                idx + 1
            ),
        });
    }

    Ok(RouteCandidate {
        name: route.name.unwrap_or_else(|| format!("Route {}", idx + 1)),
        distance_m: route.distance,
        duration_s: route.duration,
        geometry,
        leg_steps: route.legs.iter().map(|leg| leg.steps.len()).sum(),
    })
}
