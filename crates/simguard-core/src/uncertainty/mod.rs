//! Uncertainty quantification.
//!
//! **Question**: How much should anyone trust this number, and why not more?
//!
//! Uncertainty is split into three independently computed magnitudes:
//! - **aleatoric**: root-sum-square of input and output coefficients of
//!   variation,
//! - **epistemic**: additive score from provider, tier, validation status
//!   and domain tables,
//! - **numerical**: additive score from residual, iterations, time step and
//!   mesh size.
//!
//! The total is their root-sum-square. The epistemic and numerical scores
//! are additive heuristics while the final combination is RSS; downstream
//! thresholds are calibrated against these exact magnitudes, so the
//! constants stay as they are.

mod config;
mod convergence;
mod sensitivity;
mod tables;

pub use config::{ConfigError, UncertaintyConfig};
pub use convergence::{
    analyze_convergence, convergence_rate, richardson_extrapolation, RichardsonEstimate,
    GRID_INDEPENDENCE_THRESHOLD,
};
pub use sensitivity::{analyze_sensitivity, dominant_parameters, DOMINANCE_THRESHOLD};
pub use tables::{lookup, sensitivity_coefficient};

use std::collections::BTreeMap;

use tables::{
    DEFAULT_DOMAIN_UNCERTAINTY, DEFAULT_PROVIDER_UNCERTAINTY, DEFAULT_TIER_UNCERTAINTY,
    DOMAIN_UNCERTAINTY, PROVIDER_UNCERTAINTY, TIER_UNCERTAINTY, UNVALIDATED_PENALTY,
};

use crate::normalize::normalize_key;
use crate::types::{
    ConvergenceAnalysis, Inputs, ParameterSensitivity, RunMetadata, SimulationResult,
    UncertaintyResult,
};

/// Outputs whose presence raises confidence in a result.
pub const EXPECTED_OUTPUTS: [&str; 4] = ["efficiency", "lcoe", "power", "energy"];

/// Total uncertainty above which a full Monte Carlo study is recommended.
pub const MONTE_CARLO_THRESHOLD: f64 = 0.30;

/// Message emitted when no recommendation applies.
pub const WITHIN_BOUNDS_MESSAGE: &str = "Uncertainty within acceptable bounds";

/// An uncertainty model over a simulation result.
pub trait UncertaintyModel: Send + Sync {
    /// Decompose and aggregate the uncertainty of a result.
    fn quantify(
        &self,
        results: &SimulationResult,
        inputs: &Inputs,
        metadata: &RunMetadata,
    ) -> UncertaintyResult;
}

/// The three uncertainty components.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UncertaintyComponent {
    Aleatoric,
    Epistemic,
    Numerical,
}

/// Heuristic uncertainty quantifier.
pub struct UncertaintyQuantifier {
    config: UncertaintyConfig,
}

impl UncertaintyQuantifier {
    pub fn new(config: UncertaintyConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &UncertaintyConfig {
        &self.config
    }

    /// Root-sum-square of input CVs and output `uncertainty / value` ratios.
    pub fn aleatoric(&self, results: &SimulationResult, inputs: &Inputs) -> f64 {
        let input_terms = inputs
            .values()
            .filter_map(|v| v.coefficient_of_variation());

        let output_terms = results.metrics.iter().filter_map(|m| {
            let uncertainty = m.uncertainty?;
            (m.value != 0.0).then(|| (uncertainty / m.value).abs())
        });

        input_terms
            .chain(output_terms)
            .filter(|cv| cv.is_finite())
            .map(|cv| cv * cv)
            .sum::<f64>()
            .sqrt()
    }

    /// Additive model-form score.
    pub fn epistemic(&self, metadata: &RunMetadata) -> f64 {
        let provider = lookup(
            PROVIDER_UNCERTAINTY,
            metadata.provider.as_deref(),
            DEFAULT_PROVIDER_UNCERTAINTY,
        );
        let tier = lookup(
            TIER_UNCERTAINTY,
            metadata.tier.as_deref(),
            DEFAULT_TIER_UNCERTAINTY,
        );
        let validation = if metadata.validated.unwrap_or(false) {
            0.0
        } else {
            UNVALIDATED_PENALTY
        };
        let domain = lookup(
            DOMAIN_UNCERTAINTY,
            metadata.domain.as_deref(),
            DEFAULT_DOMAIN_UNCERTAINTY,
        );

        provider + tier + validation + domain
    }

    /// Additive discretization/solver score.
    pub fn numerical(&self, metadata: &RunMetadata) -> f64 {
        let mut score = metadata.residual.map(f64::abs).unwrap_or(0.0);

        if let Some(iterations) = metadata.iterations {
            score += 0.01 * (1000.0 / iterations as f64).sqrt().min(5.0);
        }

        if let Some(time_step) = metadata.time_step.filter(|dt| *dt > 0.0) {
            score += 0.005 * (time_step / 0.001).sqrt().min(10.0);
        }

        if let Some(mesh_size) = metadata.mesh_size.filter(|n| *n >= 0.0) {
            score += 0.01 * (1000.0 / mesh_size).sqrt().min(5.0);
        }

        score
    }

    /// Confidence from total uncertainty and output completeness.
    pub fn confidence_level(&self, total: f64, results: &SimulationResult) -> f64 {
        let names: Vec<String> = results.metrics.iter().map(|m| normalize_key(&m.name)).collect();
        let present = EXPECTED_OUTPUTS
            .iter()
            .filter(|key| names.iter().any(|name| name.contains(*key)))
            .count();

        let completeness = 0.5 + 0.5 * present as f64 / EXPECTED_OUTPUTS.len() as f64;
        let confidence = (-2.0 * total).exp() * completeness;

        if confidence.is_nan() {
            return 0.0;
        }
        confidence.clamp(0.0, 1.0)
    }

    fn recommendations(
        &self,
        components: [(UncertaintyComponent, f64); 3],
        total: f64,
        sensitivity: &BTreeMap<String, ParameterSensitivity>,
        convergence: &ConvergenceAnalysis,
        metadata: &RunMetadata,
    ) -> Vec<String> {
        let mut recommendations = Vec::new();

        let dominant = components
            .iter()
            .copied()
            .fold(None, |best: Option<(UncertaintyComponent, f64)>, current| match best {
                Some(b) if b.1 >= current.1 => Some(b),
                _ => Some(current),
            });

        if let Some((component, magnitude)) = dominant.filter(|(_, m)| *m > 0.0) {
            let percent = magnitude * 100.0;
            match component {
                UncertaintyComponent::Aleatoric => {
                    recommendations.push(format!(
                        "Aleatoric uncertainty dominates ({:.1}%): obtain more precise input measurements",
                        percent
                    ));
                    let dominant_inputs = dominant_parameters(sensitivity);
                    if !dominant_inputs.is_empty() {
                        recommendations.push(format!(
                            "Focus measurement effort on dominant parameters: {}",
                            dominant_inputs.join(", ")
                        ));
                    }
                }
                UncertaintyComponent::Epistemic => {
                    recommendations.push(format!(
                        "Epistemic uncertainty dominates ({:.1}%): validate the model against experimental data or reference benchmarks",
                        percent
                    ));
                    let analytical = metadata
                        .provider
                        .as_deref()
                        .map(|p| normalize_key(p) == "analytical")
                        .unwrap_or(false);
                    if analytical {
                        recommendations.push(
                            "Switch to a physics-based simulation provider for higher model fidelity"
                                .to_string(),
                        );
                    }
                }
                UncertaintyComponent::Numerical => {
                    let before = recommendations.len();
                    if !convergence.converged {
                        recommendations.push(format!(
                            "Numerical uncertainty dominates ({:.1}%): increase solver iterations until the residual falls below {:e}",
                            percent, self.config.convergence_tolerance
                        ));
                    }
                    if convergence.grid_independent == Some(false) {
                        recommendations.push(
                            "Refine the mesh: the finest solution deviates from the Richardson estimate by more than 1%"
                                .to_string(),
                        );
                    }
                    if recommendations.len() == before {
                        recommendations.push(format!(
                            "Numerical uncertainty dominates ({:.1}%): reduce the time step or refine the mesh",
                            percent
                        ));
                    }
                }
            }
        }

        if total > MONTE_CARLO_THRESHOLD {
            recommendations.push(format!(
                "Total uncertainty is {:.1}%: run a Monte Carlo analysis ({} samples) to establish the {:.0}% confidence interval",
                total * 100.0,
                self.config.monte_carlo_samples,
                self.config.confidence_level * 100.0
            ));
        }

        if recommendations.is_empty() {
            recommendations.push(WITHIN_BOUNDS_MESSAGE.to_string());
        }

        recommendations
    }
}

impl Default for UncertaintyQuantifier {
    fn default() -> Self {
        Self::new(UncertaintyConfig::default())
    }
}

impl UncertaintyModel for UncertaintyQuantifier {
    fn quantify(
        &self,
        results: &SimulationResult,
        inputs: &Inputs,
        metadata: &RunMetadata,
    ) -> UncertaintyResult {
        let aleatoric = self.aleatoric(results, inputs);
        let epistemic = self.epistemic(metadata);
        let numerical = self.numerical(metadata);
        let total = (aleatoric.powi(2) + epistemic.powi(2) + numerical.powi(2)).sqrt();

        tracing::debug!(aleatoric, epistemic, numerical, total, "Uncertainty decomposed");

        let parameter_sensitivity = if self.config.sensitivity_analysis {
            analyze_sensitivity(inputs, self.config.perturbation_fraction)
        } else {
            BTreeMap::new()
        };

        let convergence = analyze_convergence(metadata, self.config.convergence_tolerance);
        let confidence_level = self.confidence_level(total, results);

        let recommendations = self.recommendations(
            [
                (UncertaintyComponent::Aleatoric, aleatoric),
                (UncertaintyComponent::Epistemic, epistemic),
                (UncertaintyComponent::Numerical, numerical),
            ],
            total,
            &parameter_sensitivity,
            &convergence,
            metadata,
        );

        UncertaintyResult {
            aleatoric,
            epistemic,
            numerical,
            total,
            confidence_level,
            parameter_sensitivity,
            convergence,
            recommendations,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{InputValue, MeshLevel, Metric};

    fn solar_tier1_metadata() -> RunMetadata {
        RunMetadata {
            provider: Some("analytical".to_string()),
            tier: Some("tier1".to_string()),
            validated: Some(false),
            domain: Some("solar".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_unvalidated_analytical_solar_run() {
        let quantifier = UncertaintyQuantifier::default();
        let result = quantifier.quantify(
            &SimulationResult::default(),
            &Inputs::new(),
            &solar_tier1_metadata(),
        );

        assert!((result.epistemic - 0.40).abs() < 1e-12);
        assert_eq!(result.aleatoric, 0.0);
        assert_eq!(result.numerical, 0.0);
        assert!((result.total - 0.40).abs() < 1e-12);
    }

    #[test]
    fn test_epistemic_defaults() {
        let quantifier = UncertaintyQuantifier::default();
        let metadata = RunMetadata {
            validated: Some(true),
            ..Default::default()
        };
        // default provider 0.10 + default tier 0.05 + default domain 0.08
        assert!((quantifier.epistemic(&metadata) - 0.23).abs() < 1e-12);
    }

    #[test]
    fn test_missing_validation_flag_counts_as_unvalidated() {
        let quantifier = UncertaintyQuantifier::default();
        let metadata = RunMetadata::default();
        assert!((quantifier.epistemic(&metadata) - 0.33).abs() < 1e-12);
    }

    #[test]
    fn test_numerical_terms() {
        let quantifier = UncertaintyQuantifier::default();
        let metadata = RunMetadata {
            residual: Some(0.001),
            iterations: Some(1000),
            time_step: Some(0.001),
            mesh_size: Some(1000.0),
            ..Default::default()
        };
        // 0.001 + 0.01 * 1 + 0.005 * 1 + 0.01 * 1
        assert!((quantifier.numerical(&metadata) - 0.026).abs() < 1e-12);
    }

    #[test]
    fn test_numerical_terms_are_capped() {
        let quantifier = UncertaintyQuantifier::default();
        let metadata = RunMetadata {
            iterations: Some(1),
            time_step: Some(10.0),
            mesh_size: Some(1.0),
            ..Default::default()
        };
        // 0.01 * 5 + 0.005 * 10 + 0.01 * 5
        assert!((quantifier.numerical(&metadata) - 0.15).abs() < 1e-12);
    }

    #[test]
    fn test_aleatoric_root_sum_square() {
        let quantifier = UncertaintyQuantifier::default();
        let mut inputs = Inputs::new();
        inputs.insert("irradiance".to_string(), InputValue::Normal { mean: 1000.0, std: 30.0 });
        inputs.insert("temperature".to_string(), InputValue::Range { min: 20.0, max: 30.0 });
        let results = SimulationResult::new(vec![Metric::new("efficiency", 20.0, "%").with_uncertainty(0.8)]);

        // 0.03, 2.5/25 = 0.1, 0.8/20 = 0.04
        let expected = (0.03f64.powi(2) + 0.1f64.powi(2) + 0.04f64.powi(2)).sqrt();
        assert!((quantifier.aleatoric(&results, &inputs) - expected).abs() < 1e-12);
    }

    #[test]
    fn test_total_is_root_sum_square() {
        let quantifier = UncertaintyQuantifier::default();
        let mut inputs = Inputs::new();
        inputs.insert("windSpeed".to_string(), InputValue::Normal { mean: 8.0, std: 1.2 });
        let metadata = RunMetadata {
            provider: Some("modal".to_string()),
            residual: Some(1e-4),
            iterations: Some(250),
            ..Default::default()
        };

        let result = quantifier.quantify(&SimulationResult::default(), &inputs, &metadata);
        let expected =
            (result.aleatoric.powi(2) + result.epistemic.powi(2) + result.numerical.powi(2)).sqrt();
        assert_eq!(result.total, expected);
    }

    #[test]
    fn test_confidence_completeness() {
        let quantifier = UncertaintyQuantifier::default();
        let complete = SimulationResult::new(vec![
            Metric::new("System Efficiency", 20.0, "%"),
            Metric::new("LCOE", 0.05, "$/kWh"),
            Metric::new("Peak Power", 5.0, "kW"),
            Metric::new("Annual Energy", 8000.0, "kWh"),
        ]);
        assert!((quantifier.confidence_level(0.0, &complete) - 1.0).abs() < 1e-12);

        let empty = SimulationResult::default();
        assert!((quantifier.confidence_level(0.0, &empty) - 0.5).abs() < 1e-12);

        let expected = (-0.8f64).exp() * 0.5;
        assert!((quantifier.confidence_level(0.4, &empty) - expected).abs() < 1e-12);
    }

    #[test]
    fn test_sensitivity_disabled() {
        let config = UncertaintyConfig {
            sensitivity_analysis: false,
            ..Default::default()
        };
        let quantifier = UncertaintyQuantifier::new(config);
        let mut inputs = Inputs::new();
        inputs.insert("windSpeed".to_string(), InputValue::Normal { mean: 8.0, std: 1.2 });

        let result = quantifier.quantify(&SimulationResult::default(), &inputs, &RunMetadata::default());
        assert!(result.parameter_sensitivity.is_empty());
    }

    #[test]
    fn test_epistemic_recommendations_for_analytical_run() {
        let quantifier = UncertaintyQuantifier::default();
        let result = quantifier.quantify(
            &SimulationResult::default(),
            &Inputs::new(),
            &solar_tier1_metadata(),
        );

        assert!(result.recommendations[0].starts_with("Epistemic uncertainty dominates"));
        assert!(result
            .recommendations
            .iter()
            .any(|r| r.contains("physics-based simulation provider")));
        // total 0.40 > 0.30
        assert!(result.recommendations.iter().any(|r| r.contains("Monte Carlo")));
    }

    #[test]
    fn test_aleatoric_recommendations_name_dominant_inputs() {
        let quantifier = UncertaintyQuantifier::default();
        let mut inputs = Inputs::new();
        inputs.insert("windSpeed".to_string(), InputValue::Normal { mean: 8.0, std: 4.0 });
        let metadata = RunMetadata {
            provider: Some("physx".to_string()),
            tier: Some("tier3".to_string()),
            validated: Some(true),
            domain: Some("solar".to_string()),
            ..Default::default()
        };

        let result = quantifier.quantify(&SimulationResult::default(), &inputs, &metadata);
        assert!(result.recommendations[0].starts_with("Aleatoric uncertainty dominates"));
        assert!(result.recommendations[1].contains("windSpeed"));
    }

    #[test]
    fn test_numerical_recommendations_follow_convergence() {
        let quantifier = UncertaintyQuantifier::default();
        let metadata = RunMetadata {
            provider: Some("physx".to_string()),
            tier: Some("tier3".to_string()),
            validated: Some(true),
            domain: Some("solar".to_string()),
            residual: Some(0.5),
            iterations: Some(10),
            mesh_refinement_study: vec![
                MeshLevel { spacing: 0.5, value: 1.25 },
                MeshLevel { spacing: 1.0, value: 2.0 },
                MeshLevel { spacing: 2.0, value: 5.0 },
            ],
            ..Default::default()
        };

        let result = quantifier.quantify(&SimulationResult::default(), &Inputs::new(), &metadata);
        assert!(!result.convergence.converged);
        assert_eq!(result.convergence.grid_independent, Some(false));
        assert!(result.recommendations.iter().any(|r| r.contains("increase solver iterations")));
        assert!(result.recommendations.iter().any(|r| r.contains("Refine the mesh")));
    }

    #[test]
    fn test_within_bounds_when_nothing_applies() {
        let quantifier = UncertaintyQuantifier::default();
        let recommendations = quantifier.recommendations(
            [
                (UncertaintyComponent::Aleatoric, 0.0),
                (UncertaintyComponent::Epistemic, 0.0),
                (UncertaintyComponent::Numerical, 0.0),
            ],
            0.0,
            &BTreeMap::new(),
            &ConvergenceAnalysis::default(),
            &RunMetadata::default(),
        );
        assert_eq!(recommendations, vec![WITHIN_BOUNDS_MESSAGE.to_string()]);
    }
}
