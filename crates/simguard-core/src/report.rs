//! Report synthesis: merges component outputs into one verdict.
//!
//! Status rules, applied in order:
//! 1. Physics invalid → `failed`
//! 2. Any applicable benchmark failed, or confidence below 0.5 → `needs_review`
//! 3. Otherwise → `passed`

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{PhysicsValidationResult, SimulationResult, UncertaintyResult, ValidationResult};

/// Confidence below which a human should look at the result.
pub const REVIEW_CONFIDENCE: f64 = 0.5;

/// Overall verdict for a simulation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    Passed,
    NeedsReview,
    Failed,
}

impl std::fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReportStatus::Passed => write!(f, "passed"),
            ReportStatus::NeedsReview => write!(f, "needs_review"),
            ReportStatus::Failed => write!(f, "failed"),
        }
    }
}

/// Combined validation report for one run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub status: ReportStatus,

    pub physics: PhysicsValidationResult,

    /// Result after physics corrections (identical to the input when none
    /// were needed)
    pub corrected_result: SimulationResult,

    pub uncertainty: UncertaintyResult,

    /// One entry per applicable benchmark
    pub benchmarks: Vec<ValidationResult>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub best_match: Option<String>,

    pub summary: String,

    pub validated_at: DateTime<Utc>,
}

/// Aggregates component outputs into a `ValidationReport`.
pub struct ReportSynthesizer;

impl ReportSynthesizer {
    pub fn new() -> Self {
        Self
    }

    /// Merge component outputs into a report.
    pub fn synthesize(
        &self,
        physics: PhysicsValidationResult,
        corrected_result: SimulationResult,
        uncertainty: UncertaintyResult,
        benchmarks: Vec<ValidationResult>,
        best_match: Option<String>,
    ) -> ValidationReport {
        let status = self.determine_status(&physics, &uncertainty, &benchmarks);
        let summary = self.build_summary(status, &physics, &uncertainty, &benchmarks, best_match.as_deref());

        ValidationReport {
            status,
            physics,
            corrected_result,
            uncertainty,
            benchmarks,
            best_match,
            summary,
            validated_at: Utc::now(),
        }
    }

    fn determine_status(
        &self,
        physics: &PhysicsValidationResult,
        uncertainty: &UncertaintyResult,
        benchmarks: &[ValidationResult],
    ) -> ReportStatus {
        // Rule 1: physically impossible
        if !physics.is_valid {
            return ReportStatus::Failed;
        }

        // Rule 2: disagreement with references or low confidence
        if benchmarks.iter().any(|b| !b.passed) || uncertainty.confidence_level < REVIEW_CONFIDENCE {
            return ReportStatus::NeedsReview;
        }

        ReportStatus::Passed
    }

    fn build_summary(
        &self,
        status: ReportStatus,
        physics: &PhysicsValidationResult,
        uncertainty: &UncertaintyResult,
        benchmarks: &[ValidationResult],
        best_match: Option<&str>,
    ) -> String {
        let mut summary = match status {
            ReportStatus::Passed => String::from("Result is physically feasible and consistent with references. "),
            ReportStatus::NeedsReview => String::from("Result needs review. "),
            ReportStatus::Failed => format!(
                "Result violates physical limits ({} error{}). ",
                physics.errors.len(),
                if physics.errors.len() == 1 { "" } else { "s" }
            ),
        };

        if !physics.warnings.is_empty() {
            summary.push_str(&format!("{} correction(s) applied. ", physics.warnings.len()));
        }

        if benchmarks.is_empty() {
            summary.push_str("No applicable benchmarks. ");
        } else {
            let passed = benchmarks.iter().filter(|b| b.passed).count();
            summary.push_str(&format!("{}/{} benchmarks passed. ", passed, benchmarks.len()));
        }

        if let Some(id) = best_match {
            summary.push_str(&format!("Closest reference: {}. ", id));
        }

        summary.push_str(&format!(
            "Total uncertainty {:.1}%, confidence {:.0}%.",
            uncertainty.total * 100.0,
            uncertainty.confidence_level * 100.0
        ));

        summary
    }
}

impl Default for ReportSynthesizer {
    fn default() -> Self {
        Self::new()
    }
}
