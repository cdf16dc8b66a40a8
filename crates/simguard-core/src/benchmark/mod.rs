//! Benchmark validation.
//!
//! **Question**: Does this result agree with published reference cases?
//!
//! The validator holds an immutable set of reference cases (the embedded
//! database plus any caller extensions) and answers pure read queries over
//! it: which cases apply to a run, how well a result agrees with one case,
//! and which case is the closest match for a set of inputs.

mod database;

pub use database::{validate_benchmark_schema, BenchmarkDatabase, BenchmarkError};

use std::collections::HashSet;

use crate::normalize::{find_by_key, keys_match, normalize_key};
use crate::types::{
    BenchmarkCase, InputValue, Inputs, MetricValidation, SimulationResult, ValidationResult,
};

/// Domain tag for cases that apply everywhere.
pub const GENERAL_DOMAIN: &str = "general";

/// Minimum share of a case's input keys the caller must supply.
pub const MIN_INPUT_OVERLAP: f64 = 0.5;

/// Relative window within which a numeric input counts as similar.
pub const SIMILARITY_WINDOW: f64 = 0.5;

/// Minimum share of passing metrics for a benchmark to pass.
pub const PASS_CONFIDENCE: f64 = 0.5;

/// Allowance on mean error relative to the case tolerance.
pub const OVERALL_ERROR_FACTOR: f64 = 1.5;

/// A suite of reference cases a result can be checked against.
pub trait BenchmarkSuite: Send + Sync {
    /// Validate a result against every applicable case.
    fn validate_all(
        &self,
        domain: &str,
        inputs: &Inputs,
        results: &SimulationResult,
    ) -> Vec<ValidationResult>;

    /// ID of the case most similar to the given inputs.
    fn best_match_id(&self, domain: &str, inputs: &Inputs) -> Option<String>;
}

/// Validator over an immutable set of benchmark cases.
#[derive(Debug, Clone)]
pub struct BenchmarkValidator {
    version: String,
    cases: Vec<BenchmarkCase>,
}

impl BenchmarkValidator {
    /// Create a validator over the embedded reference database.
    pub fn new() -> Result<Self, BenchmarkError> {
        let db = BenchmarkDatabase::embedded()?;
        Ok(Self {
            version: db.version.clone().unwrap_or_default(),
            cases: db.cases.clone(),
        })
    }

    /// Create a validator over the embedded database plus extra cases.
    pub fn with_cases(extra: Vec<BenchmarkCase>) -> Result<Self, BenchmarkError> {
        let mut validator = Self::new()?;
        validator.add_cases(extra)?;
        Ok(validator)
    }

    /// Create a validator over the embedded database plus an extension
    /// document.
    pub fn with_database(extension: BenchmarkDatabase) -> Result<Self, BenchmarkError> {
        Self::with_cases(extension.cases)
    }

    fn add_cases(&mut self, extra: Vec<BenchmarkCase>) -> Result<(), BenchmarkError> {
        let mut seen: HashSet<String> = self.cases.iter().map(|c| c.id.clone()).collect();
        for case in &extra {
            if !seen.insert(case.id.clone()) {
                return Err(BenchmarkError::DuplicateId(case.id.clone()));
            }
        }
        self.cases.extend(extra);
        Ok(())
    }

    /// Version of the embedded dataset.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// All cases, embedded first.
    pub fn benchmarks(&self) -> &[BenchmarkCase] {
        &self.cases
    }

    /// Look up a case by ID.
    pub fn get_benchmark(&self, id: &str) -> Option<&BenchmarkCase> {
        self.cases.iter().find(|c| c.id == id)
    }

    /// Cases tagged with exactly this domain.
    pub fn get_benchmarks_for_domain(&self, domain: &str) -> Vec<&BenchmarkCase> {
        self.cases
            .iter()
            .filter(|c| keys_match(&c.domain, domain))
            .collect()
    }

    /// Cases for this domain (or general) whose inputs the caller covers
    /// at least halfway.
    pub fn find_applicable_benchmarks(&self, domain: &str, inputs: &Inputs) -> Vec<&BenchmarkCase> {
        let caller_keys: HashSet<String> = inputs.keys().map(|k| normalize_key(k)).collect();

        self.cases
            .iter()
            .filter(|case| {
                keys_match(&case.domain, domain) || keys_match(&case.domain, GENERAL_DOMAIN)
            })
            .filter(|case| {
                if case.inputs.is_empty() {
                    return false;
                }
                let shared = case
                    .inputs
                    .keys()
                    .filter(|k| caller_keys.contains(&normalize_key(k)))
                    .count();
                shared as f64 / case.inputs.len() as f64 >= MIN_INPUT_OVERLAP
            })
            .collect()
    }

    /// Compare a result with one case's reference outputs.
    pub fn validate_against_benchmark(
        &self,
        benchmark: &BenchmarkCase,
        results: &SimulationResult,
    ) -> ValidationResult {
        let metrics: Vec<MetricValidation> = benchmark
            .outputs
            .iter()
            .filter_map(|(name, reference)| {
                let actual = results.metric(name)?.value;
                let expected = reference.value;
                let error = relative_error(actual, expected);
                let tolerance = match reference.uncertainty {
                    Some(u) => benchmark.tolerance.max(2.0 * u),
                    None => benchmark.tolerance,
                };

                Some(MetricValidation {
                    name: name.clone(),
                    expected,
                    actual,
                    error,
                    passed: error <= tolerance,
                    unit: reference.unit.clone(),
                })
            })
            .collect();

        let matched = metrics.len();
        let passed_count = metrics.iter().filter(|m| m.passed).count();

        let (overall_error, confidence) = if matched > 0 {
            (
                metrics.iter().map(|m| m.error).sum::<f64>() / matched as f64,
                passed_count as f64 / matched as f64,
            )
        } else {
            (0.0, 0.0)
        };

        let passed = matched > 0
            && confidence >= PASS_CONFIDENCE
            && overall_error <= benchmark.tolerance * OVERALL_ERROR_FACTOR;

        if passed {
            tracing::debug!(benchmark = %benchmark.id, overall_error, confidence, "Benchmark passed");
        } else {
            tracing::warn!(benchmark = %benchmark.id, overall_error, confidence, matched, "Benchmark failed");
        }

        ValidationResult {
            benchmark_id: benchmark.id.clone(),
            benchmark_name: benchmark.name.clone(),
            passed,
            details: build_details(benchmark, &metrics),
            metrics,
            overall_error,
            confidence,
        }
    }

    /// The applicable case most similar to the given inputs.
    ///
    /// Ties go to the case listed first.
    pub fn get_best_match(&self, domain: &str, inputs: &Inputs) -> Option<&BenchmarkCase> {
        self.find_applicable_benchmarks(domain, inputs)
            .into_iter()
            .map(|case| (case, input_similarity(case, inputs)))
            .fold(None, |best: Option<(&BenchmarkCase, f64)>, (case, score)| match best {
                Some((_, best_score)) if best_score >= score => best,
                _ => Some((case, score)),
            })
            .map(|(case, _)| case)
    }
}

impl BenchmarkSuite for BenchmarkValidator {
    fn validate_all(
        &self,
        domain: &str,
        inputs: &Inputs,
        results: &SimulationResult,
    ) -> Vec<ValidationResult> {
        self.find_applicable_benchmarks(domain, inputs)
            .into_iter()
            .map(|case| self.validate_against_benchmark(case, results))
            .collect()
    }

    fn best_match_id(&self, domain: &str, inputs: &Inputs) -> Option<String> {
        self.get_best_match(domain, inputs).map(|c| c.id.clone())
    }
}

/// Relative error, falling back to absolute error for a zero reference.
fn relative_error(actual: f64, expected: f64) -> f64 {
    if expected == 0.0 {
        actual.abs()
    } else {
        (actual - expected).abs() / expected.abs()
    }
}

/// Share of a case's inputs the caller matches: numeric values within 50%
/// of the reference, everything else by exact equality.
fn input_similarity(case: &BenchmarkCase, inputs: &Inputs) -> f64 {
    if case.inputs.is_empty() {
        return 0.0;
    }

    let matches = case
        .inputs
        .iter()
        .filter(|(key, reference)| {
            find_by_key(inputs, key)
                .map(|(_, value)| inputs_similar(value, reference))
                .unwrap_or(false)
        })
        .count();

    matches as f64 / case.inputs.len() as f64
}

fn inputs_similar(value: &InputValue, reference: &InputValue) -> bool {
    match (value.nominal(), reference.nominal()) {
        (Some(v), Some(r)) => (v - r).abs() <= SIMILARITY_WINDOW * r.abs(),
        (None, None) => value.as_text() == reference.as_text(),
        _ => false,
    }
}

/// Human-readable summary: counts, worst metric, operating conditions.
fn build_details(benchmark: &BenchmarkCase, metrics: &[MetricValidation]) -> String {
    if metrics.is_empty() {
        return format!(
            "No comparable metrics found for {} ({} declared outputs)",
            benchmark.name,
            benchmark.outputs.len()
        );
    }

    let passed = metrics.iter().filter(|m| m.passed).count();
    let mut details = format!(
        "{}/{} metrics within tolerance ({} failed) against {} [{}, {}]",
        passed,
        metrics.len(),
        metrics.len() - passed,
        benchmark.name,
        benchmark.source,
        benchmark.year
    );

    if let Some(worst) = metrics.iter().max_by(|a, b| a.error.total_cmp(&b.error)) {
        details.push_str(&format!(
            ". Largest deviation: {} ({:.2}% error, expected {} {}, got {})",
            worst.name,
            worst.error * 100.0,
            worst.expected,
            worst.unit,
            worst.actual
        ));
    }

    if let Some(conditions) = &benchmark.conditions {
        details.push_str(&format!(". Conditions: {}", conditions));
    }

    details
}
