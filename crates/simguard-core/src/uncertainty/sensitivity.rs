//! Local sensitivity analysis.
//!
//! Each numeric input gets an empirical elasticity from the sensitivity
//! table. Its variance contribution is `(s * u)^2` where `u` is the input's
//! coefficient of variation; contributions are normalized to fractions so
//! they sum to one whenever any input carries uncertainty, however small or
//! large its CV.

use std::collections::BTreeMap;

use super::tables::sensitivity_coefficient;
use crate::types::{Inputs, ParameterSensitivity};

/// Normalized contribution above which an input is dominant.
pub const DOMINANCE_THRESHOLD: f64 = 0.25;

/// Below this |s| an input barely moves the result.
pub const WEAK_SENSITIVITY: f64 = 0.1;

/// Above this |s| an input drives the result.
pub const STRONG_SENSITIVITY: f64 = 1.5;

/// Rank numeric inputs by their share of propagated variance.
pub fn analyze_sensitivity(
    inputs: &Inputs,
    perturbation_fraction: f64,
) -> BTreeMap<String, ParameterSensitivity> {
    let rows: Vec<(&String, f64, f64)> = inputs
        .iter()
        .filter(|(_, value)| value.is_numeric())
        .map(|(name, value)| {
            let sensitivity = sensitivity_coefficient(name);
            let uncertainty = value.coefficient_of_variation().unwrap_or(0.0);
            (name, sensitivity, uncertainty)
        })
        .collect();

    let weights = variance_weights(rows.iter().map(|(_, s, u)| s * u));
    let total: f64 = weights.iter().sum();

    rows.into_iter()
        .zip(weights)
        .map(|((name, sensitivity, _), weight)| {
            let contribution = if total > 0.0 { weight / total } else { 0.0 };
            let is_dominant = contribution > DOMINANCE_THRESHOLD;

            let entry = ParameterSensitivity {
                name: name.clone(),
                sensitivity,
                contribution,
                is_dominant,
                perturbation_effect: sensitivity * perturbation_fraction,
                suggestion: suggestion_for(sensitivity, is_dominant),
            };
            (name.clone(), entry)
        })
        .collect()
}

/// Relative variance weights `(a_i / max a)^2` for amplitudes `a_i = |s u|`.
///
/// Scaling by the largest amplitude before squaring keeps every weight in
/// `[0, 1]` with at least one equal to 1, so extreme CVs neither underflow
/// to zero nor overflow to infinity. Infinite amplitudes saturate at
/// `f64::MAX`; NaN counts as no uncertainty.
fn variance_weights(amplitudes: impl Iterator<Item = f64>) -> Vec<f64> {
    let amplitudes: Vec<f64> = amplitudes
        .map(|a| match a.abs() {
            a if a.is_nan() => 0.0,
            a if a.is_infinite() => f64::MAX,
            a => a,
        })
        .collect();

    let largest = amplitudes.iter().copied().fold(0.0, f64::max);
    if largest == 0.0 {
        return vec![0.0; amplitudes.len()];
    }

    amplitudes.iter().map(|a| (a / largest).powi(2)).collect()
}

fn suggestion_for(sensitivity: f64, is_dominant: bool) -> Option<String> {
    let magnitude = sensitivity.abs();

    if magnitude > STRONG_SENSITIVITY {
        Some("Strong influence: prioritize accurate measurements".to_string())
    } else if magnitude < WEAK_SENSITIVITY {
        Some("Minimal influence: may simplify model".to_string())
    } else if is_dominant {
        Some("Dominant variance source: narrow the input range".to_string())
    } else {
        None
    }
}

/// Names of dominant inputs, largest contribution first.
pub fn dominant_parameters(sensitivity: &BTreeMap<String, ParameterSensitivity>) -> Vec<String> {
    let mut dominant: Vec<&ParameterSensitivity> =
        sensitivity.values().filter(|s| s.is_dominant).collect();
    dominant.sort_by(|a, b| b.contribution.total_cmp(&a.contribution));
    dominant.into_iter().map(|s| s.name.clone()).collect()
}
