// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::str::FromStr;

use super::{EvaluatedRoute, NoViableReason, NoViableRoute};

/// How candidate routes should be ordered.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Preference {
    /// Fastest first, by travel duration (not by distance).
    #[default]
    Shortest,

    /// Fewest maneuvers first.
    ///
    /// The step count is only a simplicity heuristic standing in for real risk
    /// scoring; it doesn't look at flood data at all.
    Safest,

    /// The routing service's order, reversed.
    Longest,
}

impl Preference {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Shortest => "shortest",
            Self::Safest => "safest",
            Self::Longest => "longest",
        }
    }
}

impl std::fmt::Display for Preference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown route preference {0:?} (expected shortest, safest or longest)")]
pub struct UnknownPreference(String);

impl FromStr for Preference {
    type Err = UnknownPreference;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "shortest" => Ok(Self::Shortest),
            "safest" => Ok(Self::Safest),
            "longest" => Ok(Self::Longest),
            _ => Err(UnknownPreference(s.to_string())),
        }
    }
}

/// Flood verdict of a route, from the perspective of a specific vehicle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteStatus {
    /// The route doesn't pass close to any flooded node.
    Clear,

    /// The route crosses a flood which the vehicle can drive through.
    PassableFlood,

    /// The route crosses a flood too deep for the vehicle.
    Impassable,
}

/// Human-facing summary of an [EvaluatedRoute].
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Annotation {
    pub status: RouteStatus,

    /// Preference under which the route was ranked.
    pub preference: Preference,

    /// Route length in kilometers, rounded to two decimal places.
    pub distance_km: f64,

    /// Travel time in whole minutes.
    pub duration_min: u64,

    pub message: String,
}

impl Annotation {
    pub fn new(route: &EvaluatedRoute, preference: Preference) -> Self {
        let (status, message) = match &route.intersection.hit {
            None => (RouteStatus::Clear, "No flooding detected.".to_string()),
            Some(hit) => {
                let severity = hit.severity.as_str().to_ascii_lowercase();
                if route.intersection.is_passable {
                    (
                        RouteStatus::PassableFlood,
                        format!(
                            "This route passes through a {severity} flood area. \
                             Your vehicle can pass through."
                        ),
                    )
                } else {
                    (
                        RouteStatus::Impassable,
                        format!(
                            "This route passes through a {severity} flood area. \
                             Your vehicle cannot pass through."
                        ),
                    )
                }
            }
        };

        Self {
            status,
            preference,
            distance_km: (route.candidate.distance_m / 10.0).round() / 100.0,
            duration_min: (route.candidate.duration_s / 60.0).round().max(0.0) as u64,
            message,
        }
    }
}

/// An [EvaluatedRoute] at a specific position of the [select]ed order.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct RankedRoute {
    /// 1-based position in the ranking.
    pub rank: usize,
    pub route: EvaluatedRoute,
    pub annotation: Annotation,
}

/// Keeps only the routes which don't cross a flood too deep for the vehicle,
/// see [EvaluatedRoute::is_viable]. Relative order is preserved.
pub fn filter_viable(routes: Vec<EvaluatedRoute>) -> Vec<EvaluatedRoute> {
    routes.into_iter().filter(EvaluatedRoute::is_viable).collect()
}

/// Orders routes by a [Preference] and annotates them. All sorts are stable.
///
/// - [Preference::Shortest] sorts by ascending duration. Routing services already
///   return routes in that order, in which case this is a no-op.
/// - [Preference::Safest] sorts by ascending step count.
/// - [Preference::Longest] reverses the input order.
///
/// No routes are filtered out; see [rank] for that.
pub fn select(mut routes: Vec<EvaluatedRoute>, preference: Preference) -> Vec<RankedRoute> {
    match preference {
        Preference::Shortest => {
            routes.sort_by(|a, b| a.candidate.duration_s.total_cmp(&b.candidate.duration_s))
        }
        Preference::Safest => routes.sort_by_key(|r| r.candidate.leg_steps),
        Preference::Longest => routes.reverse(),
    }

    routes
        .into_iter()
        .enumerate()
        .map(|(idx, route)| RankedRoute {
            rank: idx + 1,
            annotation: Annotation::new(&route, preference),
            route,
        })
        .collect()
}

/// [Filters](filter_viable) and [orders](select) routes, reporting
/// [NoViableRoute] instead of an empty ranking.
pub fn rank(
    routes: Vec<EvaluatedRoute>,
    preference: Preference,
) -> Result<Vec<RankedRoute>, NoViableRoute> {
    let had_candidates = !routes.is_empty();
    let viable = filter_viable(routes);

    if viable.is_empty() {
        let reason = if had_candidates {
            NoViableReason::AllImpassable
        } else {
            NoViableReason::NoCandidates
        };
        return Err(NoViableRoute::new(reason));
    }

    Ok(select(viable, preference))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Coordinate, FloodHit, FloodIntersection, RouteCandidate, Severity};

    fn route(
        name: &str,
        duration_s: f64,
        leg_steps: usize,
        verdict: Option<bool>,
    ) -> EvaluatedRoute {
        let intersection = match verdict {
            None => FloodIntersection::clear(),
            Some(is_passable) => FloodIntersection {
                hit: Some(FloodHit {
                    node_id: "node1".to_string(),
                    node_name: "South Plains".to_string(),
                    severity: Severity::High,
                    water_level_cm: 20.0,
                    at: Coordinate::new(14.325, 121.0755),
                    node_coordinate: Coordinate::new(14.324827, 121.075392),
                    distance_km: 0.02,
                }),
                is_passable,
            },
        };

        EvaluatedRoute {
            candidate: RouteCandidate {
                name: name.to_string(),
                distance_m: duration_s * 10.0,
                duration_s,
                geometry: String::new(),
                leg_steps,
            },
            path: vec![],
            intersection,
        }
    }

    fn names(ranked: &[RankedRoute]) -> Vec<&str> {
        ranked
            .iter()
            .map(|r| r.route.candidate.name.as_str())
            .collect()
    }

    fn osrm_ordered() -> Vec<EvaluatedRoute> {
        vec![
            route("A", 600.0, 12, None),
            route("B", 720.0, 7, None),
            route("C", 900.0, 9, None),
        ]
    }

    #[test]
    fn shortest_preserves_duration_order() {
        let ranked = select(osrm_ordered(), Preference::Shortest);
        assert_eq!(names(&ranked), ["A", "B", "C"]);
        assert_eq!(
            ranked.iter().map(|r| r.rank).collect::<Vec<_>>(),
            [1, 2, 3]
        );
    }

    #[test]
    fn shortest_sorts_by_duration_not_distance() {
        let mut routes = osrm_ordered();
        routes.reverse();
        routes[0].candidate.distance_m = 1.0;
        assert_eq!(
            names(&select(routes, Preference::Shortest)),
            ["A", "B", "C"]
        );
    }

    #[test]
    fn shortest_is_stable() {
        let routes = vec![
            route("A", 600.0, 3, None),
            route("B", 600.0, 2, None),
            route("C", 300.0, 1, None),
        ];
        assert_eq!(
            names(&select(routes, Preference::Shortest)),
            ["C", "A", "B"]
        );
    }

    #[test]
    fn safest_sorts_by_step_count() {
        assert_eq!(
            names(&select(osrm_ordered(), Preference::Safest)),
            ["B", "C", "A"]
        );
    }

    #[test]
    fn longest_reverses() {
        assert_eq!(
            names(&select(osrm_ordered(), Preference::Longest)),
            ["C", "B", "A"]
        );
    }

    #[test]
    fn filter_viable_keeps_clear_and_passable() {
        let routes = vec![
            route("clear", 600.0, 1, None),
            route("wet", 700.0, 1, Some(true)),
            route("blocked", 800.0, 1, Some(false)),
        ];
        let viable = filter_viable(routes);
        assert_eq!(
            viable
                .iter()
                .map(|r| r.candidate.name.as_str())
                .collect::<Vec<_>>(),
            ["clear", "wet"]
        );
    }

    #[test]
    fn rank_all_impassable() {
        let routes = vec![
            route("A", 600.0, 1, Some(false)),
            route("B", 700.0, 1, Some(false)),
        ];
        assert!(filter_viable(routes.clone()).is_empty());
        assert_eq!(
            rank(routes, Preference::Shortest),
            Err(NoViableRoute::new(NoViableReason::AllImpassable))
        );
    }

    #[test]
    fn rank_no_candidates() {
        assert_eq!(
            rank(vec![], Preference::Safest),
            Err(NoViableRoute::new(NoViableReason::NoCandidates))
        );
    }

    #[test]
    fn rank_drops_impassable() {
        let routes = vec![
            route("A", 600.0, 1, Some(false)),
            route("B", 700.0, 1, Some(true)),
        ];
        let ranked = rank(routes, Preference::Shortest).unwrap();
        assert_eq!(names(&ranked), ["B"]);
        assert_eq!(ranked[0].rank, 1);
    }

    #[test]
    fn annotations() {
        let a = Annotation::new(&route("A", 929.4, 1, None), Preference::Safest);
        assert_eq!(a.status, RouteStatus::Clear);
        assert_eq!(a.preference, Preference::Safest);
        assert_eq!(a.distance_km, 9.29);
        assert_eq!(a.duration_min, 15);
        assert_eq!(a.message, "No flooding detected.");

        let a = Annotation::new(&route("B", 600.0, 1, Some(true)), Preference::Shortest);
        assert_eq!(a.status, RouteStatus::PassableFlood);
        assert_eq!(
            a.message,
            "This route passes through a high flood area. Your vehicle can pass through."
        );

        let a = Annotation::new(&route("C", 600.0, 1, Some(false)), Preference::Shortest);
        assert_eq!(a.status, RouteStatus::Impassable);
        assert!(a.message.ends_with("Your vehicle cannot pass through."));
    }

    #[test]
    fn preference_from_str() {
        assert_eq!("Safest".parse(), Ok(Preference::Safest));
        assert_eq!(" longest".parse(), Ok(Preference::Longest));
        assert_eq!("shortest".parse(), Ok(Preference::Shortest));
        assert!("scenic".parse::<Preference>().is_err());
        assert_eq!(Preference::default(), Preference::Shortest);
    }
}
