//! Uncertainty quantifier configuration.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Errors from loading or validating a configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Configuration for uncertainty quantification.
///
/// Every field has a default, so a partial YAML document (or `{}`) is a
/// valid configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct UncertaintyConfig {
    /// Target confidence level for reported intervals
    pub confidence_level: f64,

    /// Sample count suggested for a follow-up Monte Carlo study
    pub monte_carlo_samples: u32,

    /// Whether to run sensitivity analysis
    pub sensitivity_analysis: bool,

    /// Relative input perturbation used for sensitivity effects
    pub perturbation_fraction: f64,

    /// Residual below which a solver run counts as converged
    pub convergence_tolerance: f64,
}

impl Default for UncertaintyConfig {
    fn default() -> Self {
        Self {
            confidence_level: 0.95,
            monte_carlo_samples: 1000,
            sensitivity_analysis: true,
            perturbation_fraction: 0.05,
            convergence_tolerance: 1e-6,
        }
    }
}

impl UncertaintyConfig {
    /// Parse a configuration from YAML (JSON is valid YAML).
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let config: UncertaintyConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a configuration from a YAML or JSON file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    /// Check that every value is in range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.confidence_level > 0.0 && self.confidence_level <= 1.0) {
            return Err(ConfigError::Invalid(format!(
                "confidenceLevel must be in (0, 1], got {}",
                self.confidence_level
            )));
        }

        if self.monte_carlo_samples == 0 {
            return Err(ConfigError::Invalid(
                "monteCarloSamples must be positive".to_string(),
            ));
        }

        if !(self.perturbation_fraction > 0.0 && self.perturbation_fraction < 1.0) {
            return Err(ConfigError::Invalid(format!(
                "perturbationFraction must be in (0, 1), got {}",
                self.perturbation_fraction
            )));
        }

        if !(self.convergence_tolerance > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "convergenceTolerance must be positive, got {}",
                self.convergence_tolerance
            )));
        }

        Ok(())
    }
}
