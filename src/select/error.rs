// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

/// Why no route could be recommended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoViableReason {
    /// There were no candidates to begin with, usually because the
    /// routing service failed or found nothing.
    NoCandidates,

    /// None of the candidates had a decodable geometry.
    AllUndecodable,

    /// Every candidate crosses a flood too deep for the vehicle.
    AllImpassable,
}

/// Non-fatal outcome reported when route selection ends up with nothing to offer.
///
/// This is meant to be shown to the user as-is, together with [NoViableRoute::guidance].
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct NoViableRoute {
    pub reason: NoViableReason,
}

impl NoViableRoute {
    pub fn new(reason: NoViableReason) -> Self {
        Self { reason }
    }

    /// Advice on what the user may do about it.
    pub fn guidance(&self) -> &'static str {
        match self.reason {
            NoViableReason::NoCandidates | NoViableReason::AllUndecodable => {
                "Try again later, or pick a different start location."
            }
            NoViableReason::AllImpassable => {
                "Consider using a vehicle with higher flood capability."
            }
        }
    }
}

impl std::fmt::Display for NoViableRoute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.reason {
            NoViableReason::NoCandidates => write!(f, "no routes available")?,
            NoViableReason::AllUndecodable => write!(f, "no route with a valid geometry")?,
            NoViableReason::AllImpassable => {
                write!(f, "no safe routes found for your vehicle type")?
            }
        }
        write!(f, ". {}", self.guidance())
    }
}

impl std::error::Error for NoViableRoute {}
