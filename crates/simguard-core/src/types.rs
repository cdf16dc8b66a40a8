//! Core data model shared by the validators.
//!
//! Everything here is a request-scoped value: built by the caller (or
//! deserialized from an upstream provider), read by the validators, and
//! returned as plain data. Wire names are camelCase so upstream JSON maps
//! directly onto these types.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::normalize::normalize_key;

// =============================================================================
// SIMULATION INPUTS
// =============================================================================

/// A single scalar simulation output (e.g., efficiency, power).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Metric {
    /// Display name as reported by the provider
    pub name: String,

    /// Reported value. Efficiencies are percentages.
    pub value: f64,

    /// Unit label (free text)
    #[serde(default)]
    pub unit: String,

    /// Absolute uncertainty in the metric's own unit
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uncertainty: Option<f64>,
}

impl Metric {
    /// Create a metric without uncertainty.
    pub fn new(name: impl Into<String>, value: f64, unit: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value,
            unit: unit.into(),
            uncertainty: None,
        }
    }

    /// Attach an absolute uncertainty.
    pub fn with_uncertainty(mut self, uncertainty: f64) -> Self {
        self.uncertainty = Some(uncertainty);
        self
    }
}

/// Ordered sequence of metrics produced by one simulation run.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct SimulationResult {
    pub metrics: Vec<Metric>,
}

impl SimulationResult {
    pub fn new(metrics: Vec<Metric>) -> Self {
        Self { metrics }
    }

    /// Find a metric by name using the normalized-key comparator.
    pub fn metric(&self, name: &str) -> Option<&Metric> {
        let wanted = normalize_key(name);
        self.metrics
            .iter()
            .find(|m| normalize_key(&m.name) == wanted)
    }

    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }

    pub fn len(&self) -> usize {
        self.metrics.len()
    }
}

impl From<Vec<Metric>> for SimulationResult {
    fn from(metrics: Vec<Metric>) -> Self {
        Self::new(metrics)
    }
}

/// A caller-supplied input value.
///
/// Numeric inputs may carry their own variability either as a normal
/// distribution (`{mean, std}`) or as a bounded range (`{min, max}`).
/// Benchmark cases only use the scalar variants.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum InputValue {
    Normal { mean: f64, std: f64 },
    Range { min: f64, max: f64 },
    Number(f64),
    Flag(bool),
    Text(String),
}

impl InputValue {
    /// Nominal numeric value: the mean, the range midpoint, or the number.
    pub fn nominal(&self) -> Option<f64> {
        match self {
            InputValue::Normal { mean, .. } => Some(*mean),
            InputValue::Range { min, max } => Some((min + max) / 2.0),
            InputValue::Number(v) => Some(*v),
            InputValue::Flag(_) | InputValue::Text(_) => None,
        }
    }

    /// Coefficient of variation carried by this input.
    ///
    /// Ranges are read as ±2σ, so the estimated std is `(max - min) / 4`.
    /// Returns `None` for inputs without a distribution or with a zero
    /// nominal value.
    pub fn coefficient_of_variation(&self) -> Option<f64> {
        let (std, nominal) = match self {
            InputValue::Normal { mean, std } => (*std, *mean),
            InputValue::Range { min, max } => ((max - min).abs() / 4.0, (min + max) / 2.0),
            _ => return None,
        };

        if nominal == 0.0 || !nominal.is_finite() || !std.is_finite() {
            return None;
        }

        Some((std / nominal).abs())
    }

    /// Whether this input is numeric (has a nominal value).
    pub fn is_numeric(&self) -> bool {
        self.nominal().is_some()
    }

    /// Text form for non-numeric equality checks.
    pub fn as_text(&self) -> Option<String> {
        match self {
            InputValue::Text(s) => Some(s.clone()),
            InputValue::Flag(b) => Some(b.to_string()),
            _ => None,
        }
    }
}

impl From<f64> for InputValue {
    fn from(v: f64) -> Self {
        InputValue::Number(v)
    }
}

impl From<&str> for InputValue {
    fn from(v: &str) -> Self {
        InputValue::Text(v.to_string())
    }
}

impl From<bool> for InputValue {
    fn from(v: bool) -> Self {
        InputValue::Flag(v)
    }
}

/// Named inputs, ordered for deterministic iteration.
pub type Inputs = BTreeMap<String, InputValue>;

/// A named configuration parameter.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Parameter {
    pub name: String,
    pub value: InputValue,
}

impl Parameter {
    pub fn new(name: impl Into<String>, value: impl Into<InputValue>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Simulation configuration as described by the plan that produced it.
///
/// Title and description drive domain inference; parameters drive
/// temperature inference.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SimulationConfig {
    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub parameters: Vec<Parameter>,
}

impl SimulationConfig {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            parameters: Vec::new(),
        }
    }

    pub fn with_parameter(mut self, name: impl Into<String>, value: impl Into<InputValue>) -> Self {
        self.parameters.push(Parameter::new(name, value));
        self
    }
}

/// One level of a mesh-refinement study.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct MeshLevel {
    /// Characteristic cell size (smaller is finer)
    pub spacing: f64,

    /// Quantity of interest computed at this level
    pub value: f64,
}

/// Run metadata reported by the simulation provider.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct RunMetadata {
    /// Provider key (e.g., "analytical", "modal", "physx")
    pub provider: Option<String>,

    /// Fidelity tier (e.g., "tier1")
    pub tier: Option<String>,

    /// Whether the model was validated against experiment
    pub validated: Option<bool>,

    /// Technology domain (e.g., "solar", "geothermal")
    pub domain: Option<String>,

    /// Final solver residual
    pub residual: Option<f64>,

    /// Solver iterations performed
    pub iterations: Option<u64>,

    /// Time step in seconds
    pub time_step: Option<f64>,

    /// Mesh size in cells
    pub mesh_size: Option<f64>,

    /// Residual after each iteration
    pub residual_history: Vec<f64>,

    /// Three-level refinement study
    pub mesh_refinement_study: Vec<MeshLevel>,
}

// =============================================================================
// PHYSICS VALIDATION
// =============================================================================

/// Outcome of a thermodynamic feasibility check.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PhysicsValidationResult {
    pub is_valid: bool,

    /// Full metric list with corrections applied; only present when a
    /// correction or error occurred
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub corrected_metrics: Option<Vec<Metric>>,

    pub warnings: Vec<String>,

    pub errors: Vec<String>,
}

impl PhysicsValidationResult {
    /// The result to pass downstream: corrected metrics when present,
    /// otherwise the original.
    pub fn effective_result(&self, original: &SimulationResult) -> SimulationResult {
        match &self.corrected_metrics {
            Some(metrics) => SimulationResult::new(metrics.clone()),
            None => original.clone(),
        }
    }
}

// =============================================================================
// BENCHMARKS
// =============================================================================

/// A reference output value of a benchmark case.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BenchmarkOutput {
    pub value: f64,

    #[serde(default)]
    pub unit: String,

    /// Relative (fractional) uncertainty of the reference value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uncertainty: Option<f64>,
}

/// A curated reference input/output pair from an authoritative source.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BenchmarkCase {
    pub id: String,
    pub name: String,
    pub domain: String,
    pub source: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub citation: Option<String>,

    pub year: u16,

    pub inputs: BTreeMap<String, InputValue>,

    pub outputs: BTreeMap<String, BenchmarkOutput>,

    /// Relative tolerance
    pub tolerance: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conditions: Option<String>,
}

/// Comparison of one benchmark output against the simulation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MetricValidation {
    pub name: String,
    pub expected: f64,
    pub actual: f64,
    /// Relative error
    pub error: f64,
    pub passed: bool,
    pub unit: String,
}

/// Result of validating a simulation against one benchmark case.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    pub benchmark_id: String,
    pub benchmark_name: String,
    pub passed: bool,
    pub metrics: Vec<MetricValidation>,
    pub overall_error: f64,
    pub confidence: f64,
    pub details: String,
}

// =============================================================================
// UNCERTAINTY
// =============================================================================

/// Influence of one input on the result.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ParameterSensitivity {
    pub name: String,

    /// Empirical elasticity of the output with respect to this input
    pub sensitivity: f64,

    /// Normalized share of the propagated variance
    pub contribution: f64,

    pub is_dominant: bool,

    /// First-order relative output change for the configured perturbation
    pub perturbation_effect: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

/// Solver convergence and grid-independence assessment.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ConvergenceAnalysis {
    pub converged: bool,
    pub residual: f64,
    pub iterations: u64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub convergence_rate: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub richardson_estimate: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grid_independent: Option<bool>,

    /// Observed order of accuracy from the refinement study
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observed_order: Option<f64>,
}

/// Decomposed uncertainty of a simulation result.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UncertaintyResult {
    pub aleatoric: f64,
    pub epistemic: f64,
    pub numerical: f64,
    pub total: f64,
    pub confidence_level: f64,
    pub parameter_sensitivity: BTreeMap<String, ParameterSensitivity>,
    pub convergence: ConvergenceAnalysis,
    pub recommendations: Vec<String>,
}

// =============================================================================
// PIPELINE REQUEST
// =============================================================================

/// Everything needed to validate one simulation run.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ValidationRequest {
    /// Technology domain used for benchmark matching
    #[serde(default)]
    pub domain: String,

    #[serde(default)]
    pub config: SimulationConfig,

    pub result: SimulationResult,

    #[serde(default)]
    pub inputs: Inputs,

    #[serde(default)]
    pub metadata: RunMetadata,
}

impl ValidationRequest {
    /// Domain for benchmark matching: explicit domain, else metadata domain.
    pub fn benchmark_domain(&self) -> &str {
        if !self.domain.is_empty() {
            return &self.domain;
        }
        self.metadata.domain.as_deref().unwrap_or("")
    }
}
