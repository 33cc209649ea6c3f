// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use super::{
    select, EvaluatedRoute, NoViableReason, NoViableRoute, Preference, RankedRoute, RouteCandidate,
};
use crate::polyline::{DecodeError, DEFAULT_PRECISION};
use crate::{FloodIndex, VehicleProfile, DEFAULT_PROXIMITY_KM};

/// Knobs for [plan].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlanOptions {
    pub preference: Preference,

    /// See [crate::evaluate()].
    pub proximity_km: f64,

    /// Precision of candidate geometries; 5 for OSRM `polyline`, 6 for `polyline6`.
    pub precision: u32,
}

impl Default for PlanOptions {
    fn default() -> Self {
        Self {
            preference: Preference::default(),
            proximity_km: DEFAULT_PROXIMITY_KM,
            precision: DEFAULT_PRECISION,
        }
    }
}

/// A candidate whose geometry couldn't be decoded.
#[derive(Debug, Clone, PartialEq)]
pub struct RejectedRoute {
    pub name: String,
    pub error: DecodeError,
}

/// Result of [plan].
#[derive(Debug, Clone, PartialEq)]
pub struct Plan {
    /// Viable routes, best first. Never empty.
    pub ranked: Vec<RankedRoute>,

    /// Routes crossing a flood too deep for the vehicle, in input order.
    pub impassable: Vec<EvaluatedRoute>,

    /// Routes dropped due to malformed geometry, in input order.
    pub rejected: Vec<RejectedRoute>,
}

/// Evaluates every candidate for the vehicle and ranks the viable ones.
///
/// A candidate with a malformed geometry is set aside in [Plan::rejected];
/// the remaining candidates are still evaluated. If nothing viable is left
/// (including when `candidates` is empty), [NoViableRoute] is returned.
pub fn plan(
    candidates: &[RouteCandidate],
    vehicle: &VehicleProfile<'_>,
    index: &FloodIndex,
    options: &PlanOptions,
) -> Result<Plan, NoViableRoute> {
    if candidates.is_empty() {
        log::warn!("no route candidates to evaluate");
        return Err(NoViableRoute::new(NoViableReason::NoCandidates));
    }

    let mut evaluated = Vec::with_capacity(candidates.len());
    let mut rejected = Vec::new();

    for candidate in candidates {
        match EvaluatedRoute::new(
            candidate.clone(),
            vehicle,
            index,
            options.proximity_km,
            options.precision,
        ) {
            Ok(route) => evaluated.push(route),
            Err(error) => {
                log::warn!("{}: {}", candidate.name, error);
                rejected.push(RejectedRoute {
                    name: candidate.name.clone(),
                    error,
                });
            }
        }
    }

    if evaluated.is_empty() {
        return Err(NoViableRoute::new(NoViableReason::AllUndecodable));
    }

    let (viable, impassable): (Vec<_>, Vec<_>) =
        evaluated.into_iter().partition(EvaluatedRoute::is_viable);

    if viable.is_empty() {
        log::info!(
            "all {} routes are impassable for {}",
            impassable.len(),
            vehicle.name
        );
        return Err(NoViableRoute::new(NoViableReason::AllImpassable));
    }

    let ranked = select(viable, options.preference);
    log::info!(
        "{} viable, {} impassable and {} rejected routes for {} ({})",
        ranked.len(),
        impassable.len(),
        rejected.len(),
        vehicle.name,
        options.preference,
    );

    Ok(Plan {
        ranked,
        impassable,
        rejected,
    })
}
