// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use crate::config::SeverityThresholds;

/// Flood severity tier of a water-level reading, in ascending order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Low,
    Moderate,
    High,
    Severe,
}

impl Severity {
    pub const ALL: [Severity; 4] = [Self::Low, Self::Moderate, Self::High, Self::Severe];

    /// Interprets an externally supplied severity label.
    ///
    /// The label is matched case-insensitively (ignoring surrounding whitespace)
    /// against the four known tiers. Anything else is coerced to [Severity::Low].
    pub fn from_label(label: &str) -> Self {
        let label = label.trim();
        Self::ALL
            .into_iter()
            .find(|s| s.as_str().eq_ignore_ascii_case(label))
            .unwrap_or_else(|| {
                log::warn!("unknown severity label {label:?}, assuming LOW");
                Self::Low
            })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Moderate => "MODERATE",
            Self::High => "HIGH",
            Self::Severe => "SEVERE",
        }
    }

    /// The flood status paired with this tier.
    pub fn flood_status(&self) -> FloodStatus {
        match self {
            Self::Low => FloodStatus::NoFlood,
            Self::Moderate => FloodStatus::MinorFlood,
            Self::High => FloodStatus::SignificantFlood,
            Self::Severe => FloodStatus::MajorFlood,
        }
    }

    /// Road passability advice for the built-in vehicle classes.
    pub fn passability(&self) -> &'static str {
        match self {
            Self::Low => "Road is passable for all vehicles",
            Self::Moderate => "Road is passable for SUV, Pickup, and 4x4 vehicles only",
            Self::High => "Road is passable for Pickup and 4x4 vehicles only",
            Self::Severe => "Road is not passable for any vehicle",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Human-readable flood status, one per [Severity] tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FloodStatus {
    NoFlood,
    MinorFlood,
    SignificantFlood,
    MajorFlood,
}

impl FloodStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NoFlood => "NO_FLOOD",
            Self::MinorFlood => "MINOR_FLOOD",
            Self::SignificantFlood => "SIGNIFICANT_FLOOD",
            Self::MajorFlood => "MAJOR_FLOOD",
        }
    }
}

impl std::fmt::Display for FloodStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of [classify].
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct Classification {
    pub severity: Severity,
    pub flood_status: FloodStatus,
}

impl From<Severity> for Classification {
    fn from(severity: Severity) -> Self {
        Self {
            severity,
            flood_status: severity.flood_status(),
        }
    }
}

/// Classifies a water level (in centimeters) using the
/// [default thresholds](SeverityThresholds::DEFAULT):
///
/// | level           | severity | status            |
/// |-----------------|----------|-------------------|
/// | < 5.0           | LOW      | NO_FLOOD          |
/// | 5.0 ≤ x < 15.0  | MODERATE | MINOR_FLOOD       |
/// | 15.0 ≤ x < 30.0 | HIGH     | SIGNIFICANT_FLOOD |
/// | ≥ 30.0          | SEVERE   | MAJOR_FLOOD       |
///
/// Negative and NaN levels fall into the LOW bucket.
pub fn classify(water_level_cm: f64) -> Classification {
    SeverityThresholds::DEFAULT.classify(water_level_cm)
}

/// Like [classify], but an externally supplied severity label takes precedence
/// over the computed tier (see [Severity::from_label]). The flood status always
/// follows the resolved severity.
pub fn classify_with_label(water_level_cm: f64, label: Option<&str>) -> Classification {
    SeverityThresholds::DEFAULT.classify_with_label(water_level_cm, label)
}

impl SeverityThresholds {
    /// Classifies a water level against these thresholds. Each bucket includes
    /// its lower bound and excludes its upper bound.
    pub fn classify(&self, water_level_cm: f64) -> Classification {
        // NaN fails every comparison and ends up in the first arm
        let severity = if !(water_level_cm >= self.moderate_cm) {
            Severity::Low
        } else if water_level_cm < self.high_cm {
            Severity::Moderate
        } else if water_level_cm < self.severe_cm {
            Severity::High
        } else {
            Severity::Severe
        };
        severity.into()
    }

    /// Like [SeverityThresholds::classify], but a supplied label takes precedence,
    /// see [classify_with_label].
    pub fn classify_with_label(&self, water_level_cm: f64, label: Option<&str>) -> Classification {
        match label {
            Some(label) => Severity::from_label(label).into(),
            None => self.classify(water_level_cm),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    macro_rules! assert_classified {
        ($level:expr, $severity:ident, $status:ident) => {
            assert_eq!(
                classify($level),
                Classification {
                    severity: Severity::$severity,
                    flood_status: FloodStatus::$status,
                },
                "classify({})",
                $level,
            )
        };
    }

    #[test]
    fn classify_boundaries() {
        assert_classified!(0.0, Low, NoFlood);
        assert_classified!(4.99, Low, NoFlood);
        assert_classified!(5.0, Moderate, MinorFlood);
        assert_classified!(14.999, Moderate, MinorFlood);
        assert_classified!(15.0, High, SignificantFlood);
        assert_classified!(29.999, High, SignificantFlood);
        assert_classified!(30.0, Severe, MajorFlood);
        assert_classified!(250.0, Severe, MajorFlood);
    }

    #[test]
    fn classify_out_of_domain() {
        assert_classified!(-5.0, Low, NoFlood);
        assert_classified!(f64::NAN, Low, NoFlood);
        assert_classified!(f64::INFINITY, Severe, MajorFlood);
    }

    #[test]
    fn classify_custom_thresholds() {
        let t = SeverityThresholds {
            moderate_cm: 10.0,
            high_cm: 20.0,
            severe_cm: 40.0,
        };
        assert_eq!(t.classify(9.9).severity, Severity::Low);
        assert_eq!(t.classify(10.0).severity, Severity::Moderate);
        assert_eq!(t.classify(30.0).severity, Severity::High);
        assert_eq!(t.classify(40.0).severity, Severity::Severe);
    }

    #[test]
    fn from_label() {
        assert_eq!(Severity::from_label("HIGH"), Severity::High);
        assert_eq!(Severity::from_label("moderate"), Severity::Moderate);
        assert_eq!(Severity::from_label(" Severe "), Severity::Severe);
        assert_eq!(Severity::from_label("low"), Severity::Low);
        assert_eq!(Severity::from_label("catastrophic"), Severity::Low);
        assert_eq!(Severity::from_label(""), Severity::Low);
    }

    #[test]
    fn label_overrides_computed_severity() {
        assert_eq!(
            classify_with_label(3.0, Some("severe")),
            Classification {
                severity: Severity::Severe,
                flood_status: FloodStatus::MajorFlood,
            }
        );
        assert_eq!(
            classify_with_label(45.0, Some("bogus")),
            Classification {
                severity: Severity::Low,
                flood_status: FloodStatus::NoFlood,
            }
        );
        assert_eq!(classify_with_label(20.0, None), classify(20.0));
    }

    #[test]
    fn passability() {
        assert_eq!(Severity::Low.passability(), "Road is passable for all vehicles");
        assert_eq!(
            Severity::Moderate.passability(),
            "Road is passable for SUV, Pickup, and 4x4 vehicles only"
        );
        assert_eq!(
            Severity::High.passability(),
            "Road is passable for Pickup and 4x4 vehicles only"
        );
        assert_eq!(Severity::Severe.passability(), "Road is not passable for any vehicle");
    }

    #[test]
    fn severity_ordering_and_names() {
        assert!(Severity::Low < Severity::Moderate);
        assert!(Severity::High < Severity::Severe);
        assert_eq!(Severity::Moderate.to_string(), "MODERATE");
        assert_eq!(FloodStatus::SignificantFlood.to_string(), "SIGNIFICANT_FLOOD");
        assert_eq!(
            serde_json::to_string(&Severity::High).unwrap(),
            "\"HIGH\""
        );
        assert_eq!(
            serde_json::to_string(&FloodStatus::MajorFlood).unwrap(),
            "\"MAJOR_FLOOD\""
        );
    }
}
