//! # simguard-core
//!
//! Deterministic validation of energy-technology simulation results.
//!
//! This crate answers three questions about a simulation's numbers:
//! - Could this result exist physically?
//! - How uncertain is it, and where does the uncertainty come from?
//! - Does it agree with published reference cases?
//!
//! ## Key Guarantees
//!
//! 1. **Deterministic**: Same request always produces the same report, apart
//!    from its `validated_at` timestamp
//! 2. **Stateless**: Components hold only immutable configuration
//! 3. **Traceable**: Every correction and failed benchmark is reported as data
//! 4. **Swappable**: Each component sits behind a trait
//!
//! ## Example
//!
//! ```rust,ignore
//! use simguard_core::{validate_simulation, ReportStatus, ValidationRequest};
//!
//! let request: ValidationRequest = serde_yaml::from_str(&yaml)?;
//! let report = validate_simulation(&request)?;
//!
//! match report.status {
//!     ReportStatus::Passed => println!("OK: {}", report.summary),
//!     ReportStatus::NeedsReview => println!("REVIEW: {}", report.summary),
//!     ReportStatus::Failed => println!("FAILED: {:?}", report.physics.errors),
//! }
//! ```

pub mod benchmark;
pub mod normalize;
pub mod physics;
pub mod report;
pub mod types;
pub mod uncertainty;

// Re-export main types at crate root
pub use benchmark::{
    validate_benchmark_schema, BenchmarkDatabase, BenchmarkError, BenchmarkSuite,
    BenchmarkValidator,
};
pub use normalize::{keys_match, normalize_key};
pub use physics::{PhysicsCheck, PhysicsValidator};
pub use report::{ReportStatus, ReportSynthesizer, ValidationReport};
pub use types::{
    BenchmarkCase, BenchmarkOutput, ConvergenceAnalysis, InputValue, Inputs, MeshLevel, Metric,
    MetricValidation, Parameter, ParameterSensitivity, PhysicsValidationResult, RunMetadata,
    SimulationConfig, SimulationResult, UncertaintyResult, ValidationRequest, ValidationResult,
};
pub use uncertainty::{ConfigError, UncertaintyConfig, UncertaintyModel, UncertaintyQuantifier};

use thiserror::Error;

/// Errors that can occur while setting up validation
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Benchmark error: {0}")]
    Benchmark(#[from] BenchmarkError),
}

/// Runs physics, uncertainty and benchmark checks in order and merges the
/// outcome.
pub struct ValidationPipeline<
    P: PhysicsCheck = PhysicsValidator,
    U: UncertaintyModel = UncertaintyQuantifier,
    B: BenchmarkSuite = BenchmarkValidator,
> {
    physics: P,
    uncertainty: U,
    benchmarks: B,
    synthesizer: ReportSynthesizer,
}

impl ValidationPipeline {
    /// Pipeline with default components over the embedded benchmarks.
    pub fn new() -> Result<Self, ValidationError> {
        Ok(Self::with_components(
            PhysicsValidator::new(),
            UncertaintyQuantifier::default(),
            BenchmarkValidator::new()?,
        ))
    }
}

impl<P: PhysicsCheck, U: UncertaintyModel, B: BenchmarkSuite> ValidationPipeline<P, U, B> {
    pub fn with_components(physics: P, uncertainty: U, benchmarks: B) -> Self {
        Self {
            physics,
            uncertainty,
            benchmarks,
            synthesizer: ReportSynthesizer::new(),
        }
    }

    /// Validate one simulation run.
    ///
    /// Uncertainty and benchmark checks see the physics-corrected result;
    /// inputs and metadata pass through unchanged.
    pub fn run(&self, request: &ValidationRequest) -> ValidationReport {
        let physics = self.physics.validate(&request.result, &request.config);
        let corrected = physics.effective_result(&request.result);

        let uncertainty = self
            .uncertainty
            .quantify(&corrected, &request.inputs, &request.metadata);

        let domain = request.benchmark_domain();
        let benchmarks = self
            .benchmarks
            .validate_all(domain, &request.inputs, &corrected);
        let best_match = self.benchmarks.best_match_id(domain, &request.inputs);

        let report = self
            .synthesizer
            .synthesize(physics, corrected, uncertainty, benchmarks, best_match);

        tracing::info!(
            status = %report.status,
            domain,
            benchmarks = report.benchmarks.len(),
            "Validation complete"
        );

        report
    }
}

/// Validate a simulation run with the default components.
///
/// This is the main entry point for simguard validation.
///
/// # Returns
///
/// A `ValidationReport` containing:
/// - `status`: passed, needs_review, or failed
/// - `physics`: feasibility findings and corrections
/// - `uncertainty`: decomposed uncertainty and recommendations
/// - `benchmarks`: one result per applicable reference case
pub fn validate_simulation(request: &ValidationRequest) -> Result<ValidationReport, ValidationError> {
    Ok(ValidationPipeline::new()?.run(request))
}
