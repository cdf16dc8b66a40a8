//! Thermodynamic feasibility checks.
//!
//! **Question**: Could this result exist in the physical world?
//!
//! Efficiency metrics are bounded by the lower of the Carnot limit and a
//! domain ceiling. Violations are recorded as errors and the offending
//! metric is pulled down to 80% of the ceiling so downstream consumers
//! never see an impossible number. Negative power is flagged but left as
//! reported: there is no sensible correction for it.

mod limits;

pub use limits::{
    carnot_limit, domain_limit, is_efficiency_metric, to_kelvin, EfficiencyLimit, LimitBasis,
    DEFAULT_THERMAL_LIMIT,
};

use crate::types::{PhysicsValidationResult, SimulationConfig, SimulationResult};

/// Fraction of the ceiling a violating efficiency is corrected to.
pub const CORRECTION_FACTOR: f64 = 0.80;

/// Uncertainty (percentage points) attached to corrected efficiencies.
pub const CORRECTION_UNCERTAINTY: f64 = 5.0;

/// A physical-feasibility check over a simulation result.
pub trait PhysicsCheck: Send + Sync {
    /// Check a result against physical limits implied by its configuration.
    fn validate(&self, result: &SimulationResult, config: &SimulationConfig)
        -> PhysicsValidationResult;
}

/// The thermodynamic feasibility validator.
pub struct PhysicsValidator;

impl PhysicsValidator {
    pub fn new() -> Self {
        Self
    }
}

impl Default for PhysicsValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl PhysicsCheck for PhysicsValidator {
    fn validate(
        &self,
        result: &SimulationResult,
        config: &SimulationConfig,
    ) -> PhysicsValidationResult {
        let limit = EfficiencyLimit::for_config(config);
        tracing::debug!(
            limit = limit.value,
            basis = %limit.basis,
            carnot = ?limit.carnot,
            "Resolved efficiency ceiling"
        );

        let mut metrics = result.metrics.clone();
        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        for metric in metrics.iter_mut() {
            // 1. Efficiency above the physical ceiling
            if is_efficiency_metric(&metric.name) {
                let fraction = metric.value / 100.0;
                if fraction > limit.value {
                    let corrected = limit.value * CORRECTION_FACTOR * 100.0;

                    errors.push(format!(
                        "{} of {:.2}% exceeds the {} of {:.2}%",
                        metric.name,
                        metric.value,
                        limit.basis,
                        limit.value * 100.0
                    ));
                    warnings.push(format!(
                        "{} corrected from {:.2}% to {:.2}% ({:.0}% of the {})",
                        metric.name,
                        metric.value,
                        corrected,
                        CORRECTION_FACTOR * 100.0,
                        limit.basis
                    ));
                    tracing::warn!(
                        metric = %metric.name,
                        reported = metric.value,
                        corrected,
                        "Efficiency exceeds physical limit"
                    );

                    metric.value = corrected;
                    if metric.uncertainty.is_none() {
                        metric.uncertainty = Some(CORRECTION_UNCERTAINTY);
                    }
                }
            }

            // 2. Negative power output
            if metric.name.to_lowercase().contains("power") && metric.value < 0.0 {
                errors.push(format!(
                    "{} is negative ({} {}); power output cannot be below zero",
                    metric.name, metric.value, metric.unit
                ));
                tracing::warn!(metric = %metric.name, value = metric.value, "Negative power output");
            }
        }

        let touched = !errors.is_empty() || !warnings.is_empty();

        PhysicsValidationResult {
            is_valid: errors.is_empty(),
            corrected_metrics: touched.then_some(metrics),
            warnings,
            errors,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Metric;

    fn geothermal_config() -> SimulationConfig {
        SimulationConfig::new("Geothermal binary plant", "150C brine, air-cooled condenser")
            .with_parameter("source_temperature", 423.0)
            .with_parameter("sink_temperature", 298.0)
    }

    #[test]
    fn test_geothermal_efficiency_corrected_to_carnot_fraction() {
        let result = SimulationResult::new(vec![Metric::new("Thermal Efficiency", 35.0, "%")]);
        let validation = PhysicsValidator::new().validate(&result, &geothermal_config());

        assert!(!validation.is_valid);
        assert_eq!(validation.errors.len(), 1);
        assert_eq!(validation.warnings.len(), 1);

        let corrected = validation.corrected_metrics.unwrap();
        let expected = (1.0 - 298.0 / 423.0) * 0.80 * 100.0;
        assert!((corrected[0].value - expected).abs() < 1e-9);
        assert!((corrected[0].value - 23.64).abs() < 0.01);
        assert_eq!(corrected[0].uncertainty, Some(CORRECTION_UNCERTAINTY));
    }

    #[test]
    fn test_existing_uncertainty_preserved() {
        let result = SimulationResult::new(vec![
            Metric::new("efficiency", 40.0, "%").with_uncertainty(2.0)
        ]);
        let validation = PhysicsValidator::new().validate(&result, &geothermal_config());

        let corrected = validation.corrected_metrics.unwrap();
        assert_eq!(corrected[0].uncertainty, Some(2.0));
    }

    #[test]
    fn test_feasible_efficiency_untouched() {
        let result = SimulationResult::new(vec![
            Metric::new("Thermal Efficiency", 12.0, "%"),
            Metric::new("Net Power", 4.8, "MW"),
        ]);
        let validation = PhysicsValidator::new().validate(&result, &geothermal_config());

        assert!(validation.is_valid);
        assert!(validation.errors.is_empty());
        assert!(validation.warnings.is_empty());
        assert!(validation.corrected_metrics.is_none());
    }

    #[test]
    fn test_negative_power_flagged_not_corrected() {
        let result = SimulationResult::new(vec![Metric::new("Power Output", -50.0, "kW")]);
        let config = SimulationConfig::new("Wind turbine", "");
        let validation = PhysicsValidator::new().validate(&result, &config);

        assert!(!validation.is_valid);
        assert_eq!(validation.errors.len(), 1);
        assert!(validation.errors[0].contains("Power Output"));
        assert!(validation.warnings.is_empty());

        let corrected = validation.corrected_metrics.unwrap();
        assert_eq!(corrected[0].value, -50.0);
    }

    #[test]
    fn test_domain_limit_without_temperatures() {
        // Solar ceiling is 47%
        let result = SimulationResult::new(vec![Metric::new("Cell efficiency", 52.0, "%")]);
        let config = SimulationConfig::new("Perovskite solar cell", "");
        let validation = PhysicsValidator::new().validate(&result, &config);

        assert!(!validation.is_valid);
        let corrected = validation.corrected_metrics.unwrap();
        assert!((corrected[0].value - 0.47 * 0.80 * 100.0).abs() < 1e-9);
        assert!(validation.errors[0].contains("solar limit"));
    }

    #[test]
    fn test_unknown_domain_uses_thermal_default() {
        let result = SimulationResult::new(vec![Metric::new("efficiency", 55.0, "%")]);
        let config = SimulationConfig::new("Process heat recovery", "");
        let validation = PhysicsValidator::new().validate(&result, &config);

        let corrected = validation.corrected_metrics.unwrap();
        assert!((corrected[0].value - 40.0).abs() < 1e-9);
    }

    #[test]
    fn test_correction_preserves_metric_order() {
        let result = SimulationResult::new(vec![
            Metric::new("Net Power", 5.0, "MW"),
            Metric::new("efficiency", 60.0, "%"),
            Metric::new("LCOE", 0.08, "$/kWh"),
        ]);
        let validation = PhysicsValidator::new().validate(&result, &geothermal_config());

        let corrected = validation.corrected_metrics.unwrap();
        let names: Vec<&str> = corrected.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["Net Power", "efficiency", "LCOE"]);
        assert_eq!(corrected[0].value, 5.0);
        assert_eq!(corrected[2].value, 0.08);
    }
}
