//! Empirical lookup tables for the uncertainty heuristics.
//!
//! Keys are compared through [`normalize_key`]. The epistemic tables use
//! exact key matches; the sensitivity table uses substring matches and is
//! ordered, first match wins.

use crate::normalize::normalize_key;

/// Model-form uncertainty by provider.
pub const PROVIDER_UNCERTAINTY: &[(&str, f64)] = &[
    ("analytical", 0.15),
    ("modal", 0.08),
    ("physx", 0.05),
    ("mujoco", 0.05),
];
pub const DEFAULT_PROVIDER_UNCERTAINTY: f64 = 0.10;

/// Fidelity uncertainty by tier.
pub const TIER_UNCERTAINTY: &[(&str, f64)] = &[("tier1", 0.10), ("tier2", 0.05), ("tier3", 0.03)];
pub const DEFAULT_TIER_UNCERTAINTY: f64 = 0.05;

/// Added when the model has not been validated against experiment.
pub const UNVALIDATED_PENALTY: f64 = 0.10;

/// Knowledge-gap uncertainty by technology domain.
pub const DOMAIN_UNCERTAINTY: &[(&str, f64)] = &[
    ("solar", 0.05),
    ("wind", 0.08),
    ("battery", 0.10),
    ("hydrogen", 0.12),
    ("geothermal", 0.15),
];
pub const DEFAULT_DOMAIN_UNCERTAINTY: f64 = 0.08;

/// Output elasticity by input name. Wind power scales with the cube of
/// wind speed; costs move results the other way.
pub const SENSITIVITY_COEFFICIENTS: &[(&str, f64)] = &[
    ("windspeed", 3.0),
    ("efficiency", 1.0),
    ("costperkw", -0.8),
    ("cost", -0.8),
    ("capacityfactor", 0.9),
    ("lifetime", 0.6),
    ("temperature", -0.2),
    ("irradiance", 1.0),
    ("discountrate", -0.7),
];
pub const DEFAULT_SENSITIVITY: f64 = 0.5;

/// Exact-match lookup with a default for unknown or missing keys.
pub fn lookup(table: &[(&str, f64)], key: Option<&str>, default: f64) -> f64 {
    let Some(key) = key else {
        return default;
    };
    let key = normalize_key(key);

    table
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, v)| *v)
        .unwrap_or(default)
}

/// Sensitivity coefficient for an input name (substring match).
pub fn sensitivity_coefficient(name: &str) -> f64 {
    let key = normalize_key(name);

    SENSITIVITY_COEFFICIENTS
        .iter()
        .find(|(k, _)| key.contains(k))
        .map(|(_, v)| *v)
        .unwrap_or(DEFAULT_SENSITIVITY)
}
