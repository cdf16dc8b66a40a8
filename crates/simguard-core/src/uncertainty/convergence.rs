//! Solver convergence and grid-independence analysis.

use crate::types::{ConvergenceAnalysis, MeshLevel, RunMetadata};

/// Relative deviation from the extrapolated value below which a solution is
/// grid independent.
pub const GRID_INDEPENDENCE_THRESHOLD: f64 = 0.01;

/// Assumed order of accuracy for Richardson extrapolation.
pub const ASSUMED_ORDER: i32 = 2;

/// Result of a three-level Richardson extrapolation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RichardsonEstimate {
    pub estimate: f64,
    pub grid_independent: bool,
    pub observed_order: Option<f64>,
}

/// Assess convergence from run metadata.
pub fn analyze_convergence(metadata: &RunMetadata, tolerance: f64) -> ConvergenceAnalysis {
    let residual = metadata.residual.unwrap_or(0.0);
    let iterations = metadata.iterations.unwrap_or(0);
    let richardson = richardson_extrapolation(&metadata.mesh_refinement_study);

    ConvergenceAnalysis {
        converged: residual < tolerance && iterations > 0,
        residual,
        iterations,
        convergence_rate: convergence_rate(&metadata.residual_history),
        richardson_estimate: richardson.map(|r| r.estimate),
        grid_independent: richardson.map(|r| r.grid_independent),
        observed_order: richardson.and_then(|r| r.observed_order),
    }
}

/// Average log-reduction per iteration over the last two steps:
/// `ln(r_n / r_{n-2}) / 2`. Negative means the residual is falling.
pub fn convergence_rate(history: &[f64]) -> Option<f64> {
    if history.len() < 3 {
        return None;
    }

    let last = history[history.len() - 1];
    let earlier = history[history.len() - 3];
    if last <= 0.0 || earlier <= 0.0 {
        return None;
    }

    Some((last / earlier).ln() / 2.0)
}

/// Richardson extrapolation over the three finest levels of a refinement
/// study, assuming second-order convergence.
///
/// With `f1` the finest value, `f2` the next and `r = h2 / h1`:
/// `estimate = f1 + (f1 - f2) / (r^2 - 1)`.
pub fn richardson_extrapolation(levels: &[MeshLevel]) -> Option<RichardsonEstimate> {
    if levels.len() < 3 {
        return None;
    }

    let mut sorted: Vec<MeshLevel> = levels
        .iter()
        .copied()
        .filter(|l| l.spacing.is_finite() && l.spacing > 0.0 && l.value.is_finite())
        .collect();
    if sorted.len() < 3 {
        return None;
    }
    sorted.sort_by(|a, b| a.spacing.total_cmp(&b.spacing));

    let (fine, medium, coarse) = (sorted[0], sorted[1], sorted[2]);
    let ratio = medium.spacing / fine.spacing;
    if ratio <= 1.0 {
        return None;
    }

    let f1 = fine.value;
    let f2 = medium.value;
    let f3 = coarse.value;

    let estimate = f1 + (f1 - f2) / (ratio.powi(ASSUMED_ORDER) - 1.0);
    let deviation = (f1 - estimate).abs() / estimate.abs().max(f64::EPSILON);

    Some(RichardsonEstimate {
        estimate,
        grid_independent: deviation < GRID_INDEPENDENCE_THRESHOLD,
        observed_order: observed_order(f1, f2, f3, ratio),
    })
}

/// Observed order `p = ln((f3 - f2) / (f2 - f1)) / ln(r)`; only defined for
/// monotone convergence.
fn observed_order(f1: f64, f2: f64, f3: f64, ratio: f64) -> Option<f64> {
    let fine_delta = f2 - f1;
    if fine_delta == 0.0 {
        return None;
    }

    let quotient = (f3 - f2) / fine_delta;
    if quotient <= 0.0 || !quotient.is_finite() {
        return None;
    }

    let p = quotient.ln() / ratio.ln();
    p.is_finite().then_some(p)
}
