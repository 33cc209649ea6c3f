// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

/// Describes how deep a flood a vehicle class can safely drive through.
///
/// Clearances are on their own scale, independent from the
/// [severity thresholds](crate::config::SeverityThresholds): a "HIGH" flood
/// may still be passable for a pickup.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct VehicleProfile<'a> {
    /// Type key of the vehicle, e.g. "sedan" or "4x4".
    pub name: &'a str,

    /// Maximum water level, in centimeters, the vehicle can safely traverse.
    /// Must be positive and finite; [crate::evaluate()] uses it as given.
    pub max_safe_water_level_cm: f64,
}

impl<'a> VehicleProfile<'a> {
    /// Returns true if the vehicle can drive through water of the given depth.
    /// The boundary is inclusive.
    pub fn can_pass(&self, water_level_cm: f64) -> bool {
        water_level_cm <= self.max_safe_water_level_cm
    }

    /// Finds a profile by its type key (case-insensitive) among `profiles`,
    /// falling back to `default` when there is no match.
    ///
    /// Unknown vehicles must never be assumed to have unlimited clearance,
    /// hence the mandatory fallback.
    pub fn find<I>(profiles: I, key: &str, default: VehicleProfile<'a>) -> VehicleProfile<'a>
    where
        I: IntoIterator<Item = VehicleProfile<'a>>,
    {
        let key = key.trim();
        profiles
            .into_iter()
            .find(|p| p.name.eq_ignore_ascii_case(key))
            .unwrap_or_else(|| {
                log::warn!(
                    "unknown vehicle type {key:?}, assuming a clearance of {} cm",
                    default.max_safe_water_level_cm
                );
                default
            })
    }
}

impl VehicleProfile<'static> {
    /// Finds one of the [built-in profiles](VEHICLE_PROFILES) by its type key,
    /// falling back to [DEFAULT_PROFILE].
    pub fn lookup(key: &str) -> Self {
        Self::find(VEHICLE_PROFILES.iter().copied(), key, DEFAULT_PROFILE)
    }
}

pub const SEDAN_PROFILE: VehicleProfile<'static> = VehicleProfile {
    name: "sedan",
    max_safe_water_level_cm: 10.0,
};

pub const SUV_PROFILE: VehicleProfile<'static> = VehicleProfile {
    name: "suv",
    max_safe_water_level_cm: 30.0,
};

pub const PICKUP_PROFILE: VehicleProfile<'static> = VehicleProfile {
    name: "pickup",
    max_safe_water_level_cm: 40.0,
};

pub const FOUR_BY_FOUR_PROFILE: VehicleProfile<'static> = VehicleProfile {
    name: "4x4",
    max_safe_water_level_cm: 50.0,
};

/// Conservative profile for vehicle types missing from the table.
pub const DEFAULT_PROFILE: VehicleProfile<'static> = VehicleProfile {
    name: "unknown",
    max_safe_water_level_cm: 15.0,
};

pub const VEHICLE_PROFILES: &[VehicleProfile<'static>] = &[
    SEDAN_PROFILE,
    SUV_PROFILE,
    PICKUP_PROFILE,
    FOUR_BY_FOUR_PROFILE,
];
