//! Physical efficiency limits.
//!
//! Two independent ceilings bound any reported conversion efficiency:
//! - the **Carnot limit** derived from the hot/cold temperatures found in
//!   the configuration parameters, and
//! - a **domain limit** picked from an ordered keyword table over the
//!   configuration title and description.
//!
//! The keyword tables are ordered: the first matching entry wins, so
//! "geothermal binary ORC" resolves to the geothermal ceiling even though
//! later entries could also match.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::{Parameter, SimulationConfig};

/// Offset between Celsius and Kelvin.
pub const CELSIUS_OFFSET: f64 = 273.15;

/// Values above this are already Kelvin.
pub const KELVIN_THRESHOLD: f64 = 200.0;

/// Fallback ceiling for generic thermal conversion.
pub const DEFAULT_THERMAL_LIMIT: f64 = 0.50;

/// A domain keyword and its efficiency ceiling.
pub struct DomainLimit {
    pub pattern: Regex,
    pub domain: &'static str,
    pub limit: f64,
}

fn domain(pattern: &str, domain: &'static str, limit: f64) -> DomainLimit {
    DomainLimit {
        pattern: Regex::new(pattern).unwrap(),
        domain,
        limit,
    }
}

lazy_static! {
    // =========================================================================
    // METRIC AND PARAMETER PATTERNS
    // =========================================================================

    /// Efficiency-like metric names
    pub static ref EFFICIENCY_PATTERN: Regex = Regex::new(r"(?i)efficiency|eta").unwrap();

    /// Hot-side temperature parameter names
    pub static ref HOT_SIDE_PATTERN: Regex =
        Regex::new(r"(?i)source|hot|inlet|geofluid|brine").unwrap();

    /// Cold-side temperature parameter names
    pub static ref COLD_SIDE_PATTERN: Regex =
        Regex::new(r"(?i)sink|cold|ambient|condenser|rejection").unwrap();

    static ref TEMPERATURE_HINT: Regex = Regex::new(r"(?i)temp").unwrap();

    // =========================================================================
    // DOMAIN CEILINGS (ordered, first match wins)
    // =========================================================================

    pub static ref DOMAIN_LIMITS: Vec<DomainLimit> = vec![
        domain(r"(?i)geothermal|\borc\b|binary", "geothermal", 0.35),
        domain(r"(?i)solar|photovoltaic|\bpv\b", "solar", 0.47),
        domain(r"(?i)wind", "wind", 0.593),
        domain(r"(?i)fuel[\s_-]?cell", "fuel cell", 0.70),
        domain(r"(?i)combined[\s_-]?cycle|\bccgt\b", "combined cycle", 0.65),
        domain(r"(?i)rankine", "rankine", 0.45),
        domain(r"(?i)brayton", "brayton", 0.45),
    ];
}

/// Exact metric names that are efficiencies without saying so.
const EFFICIENCY_ALIASES: &[&str] = &["η", "pce", "rte", "eff"];

/// Whether a metric name denotes a conversion efficiency.
pub fn is_efficiency_metric(name: &str) -> bool {
    if EFFICIENCY_PATTERN.is_match(name) {
        return true;
    }
    let lower = name.trim().to_lowercase();
    EFFICIENCY_ALIASES.iter().any(|alias| lower == *alias)
}

/// Convert a temperature to Kelvin, treating small values as Celsius.
pub fn to_kelvin(value: f64) -> f64 {
    if value > KELVIN_THRESHOLD {
        value
    } else {
        value + CELSIUS_OFFSET
    }
}

/// Find a temperature parameter whose name matches `side`.
///
/// Names that also look like temperatures win over bare side matches, so
/// `brine_temperature` is preferred to `brine_flow_rate`.
fn find_temperature<'a>(parameters: &'a [Parameter], side: &Regex) -> Option<f64> {
    let candidates: Vec<&'a Parameter> = parameters
        .iter()
        .filter(|p| side.is_match(&p.name))
        .collect();

    candidates
        .iter()
        .find(|p| TEMPERATURE_HINT.is_match(&p.name))
        .or_else(|| candidates.first())
        .and_then(|p| p.value.nominal())
        .filter(|v| v.is_finite())
        .map(to_kelvin)
}

/// Carnot limit `max(0, 1 - Tcold/Thot)` from configuration parameters.
///
/// Returns `None` when either temperature is missing or not numeric.
pub fn carnot_limit(parameters: &[Parameter]) -> Option<f64> {
    let t_hot = find_temperature(parameters, &HOT_SIDE_PATTERN)?;
    let t_cold = find_temperature(parameters, &COLD_SIDE_PATTERN)?;

    if t_hot <= 0.0 {
        return None;
    }

    Some((1.0 - t_cold / t_hot).max(0.0))
}

/// Domain ceiling for a configuration, with the domain it resolved to.
pub fn domain_limit(config: &SimulationConfig) -> (&'static str, f64) {
    let text = format!("{} {}", config.title, config.description);

    DOMAIN_LIMITS
        .iter()
        .find(|entry| entry.pattern.is_match(&text))
        .map(|entry| (entry.domain, entry.limit))
        .unwrap_or(("thermal", DEFAULT_THERMAL_LIMIT))
}

/// What set the effective efficiency ceiling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LimitBasis {
    Carnot,
    Domain { domain: String },
}

impl fmt::Display for LimitBasis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LimitBasis::Carnot => write!(f, "Carnot limit"),
            LimitBasis::Domain { domain } => write!(f, "{} limit", domain),
        }
    }
}

/// Effective efficiency ceiling for a configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EfficiencyLimit {
    /// Fractional ceiling (0..1)
    pub value: f64,

    pub basis: LimitBasis,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub carnot: Option<f64>,

    pub domain_limit: f64,
}

impl EfficiencyLimit {
    /// Combine the Carnot and domain ceilings: the lower one wins.
    pub fn for_config(config: &SimulationConfig) -> Self {
        let carnot = carnot_limit(&config.parameters);
        let (domain, domain_value) = domain_limit(config);

        match carnot {
            Some(c) if c < domain_value => Self {
                value: c,
                basis: LimitBasis::Carnot,
                carnot,
                domain_limit: domain_value,
            },
            _ => Self {
                value: domain_value,
                basis: LimitBasis::Domain {
                    domain: domain.to_string(),
                },
                carnot,
                domain_limit: domain_value,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_efficiency_detection() {
        assert!(is_efficiency_metric("Thermal Efficiency"));
        assert!(is_efficiency_metric("eta_thermal"));
        assert!(is_efficiency_metric("PCE"));
        assert!(is_efficiency_metric("η"));
        assert!(!is_efficiency_metric("Net Power"));
        assert!(!is_efficiency_metric("LCOE"));
    }

    #[test]
    fn test_to_kelvin() {
        assert_eq!(to_kelvin(423.0), 423.0);
        assert!((to_kelvin(150.0) - 423.15).abs() < 1e-9);
        assert!((to_kelvin(25.0) - 298.15).abs() < 1e-9);
    }

    #[test]
    fn test_carnot_from_kelvin_parameters() {
        let params = vec![
            Parameter::new("source_temperature", 423.0),
            Parameter::new("sink_temperature", 298.0),
        ];
        let carnot = carnot_limit(&params).unwrap();
        assert!((carnot - (1.0 - 298.0 / 423.0)).abs() < 1e-12);
    }

    #[test]
    fn test_carnot_from_celsius_parameters() {
        let params = vec![
            Parameter::new("geofluid_temp", 150.0),
            Parameter::new("ambient_temp", 25.0),
        ];
        let carnot = carnot_limit(&params).unwrap();
        assert!((carnot - (1.0 - 298.15 / 423.15)).abs() < 1e-12);
    }

    #[test]
    fn test_carnot_prefers_temperature_names() {
        let params = vec![
            Parameter::new("brine_flow_rate", 80.0),
            Parameter::new("brine_temperature", 180.0),
            Parameter::new("condenser_temperature", 30.0),
        ];
        let carnot = carnot_limit(&params).unwrap();
        assert!((carnot - (1.0 - 303.15 / 453.15)).abs() < 1e-12);
    }

    #[test]
    fn test_carnot_missing_or_non_numeric() {
        let only_hot = vec![Parameter::new("hot_side_temperature", 500.0)];
        assert_eq!(carnot_limit(&only_hot), None);

        let text = vec![
            Parameter::new("source_temperature", "high"),
            Parameter::new("sink_temperature", 298.0),
        ];
        assert_eq!(carnot_limit(&text), None);
    }

    #[test]
    fn test_carnot_clamped_at_zero() {
        let params = vec![
            Parameter::new("inlet_temperature", 300.0),
            Parameter::new("rejection_temperature", 350.0),
        ];
        assert_eq!(carnot_limit(&params), Some(0.0));
    }

    #[test]
    fn test_domain_limit_order() {
        let config = SimulationConfig::new("Binary ORC plant", "Geothermal brine with solar preheat");
        assert_eq!(domain_limit(&config), ("geothermal", 0.35));

        let config = SimulationConfig::new("Rooftop PV", "");
        assert_eq!(domain_limit(&config), ("solar", 0.47));

        let config = SimulationConfig::new("Offshore wind farm", "");
        assert_eq!(domain_limit(&config), ("wind", 0.593));

        let config = SimulationConfig::new("PEM fuel-cell stack", "");
        assert_eq!(domain_limit(&config), ("fuel cell", 0.70));

        let config = SimulationConfig::new("Steam Rankine cycle", "");
        assert_eq!(domain_limit(&config), ("rankine", 0.45));
    }

    #[test]
    fn test_domain_limit_falls_back_to_thermal() {
        let config = SimulationConfig::new("Heat exchanger", "counterflow");
        assert_eq!(domain_limit(&config), ("thermal", DEFAULT_THERMAL_LIMIT));
    }

    #[test]
    fn test_effective_limit_takes_minimum() {
        let config = SimulationConfig::new("Geothermal plant", "")
            .with_parameter("source_temperature", 423.0)
            .with_parameter("sink_temperature", 298.0);
        let limit = EfficiencyLimit::for_config(&config);
        assert_eq!(limit.basis, LimitBasis::Carnot);
        assert!((limit.value - 0.29551).abs() < 1e-4);

        let hot_config = SimulationConfig::new("Geothermal plant", "")
            .with_parameter("source_temperature", 900.0)
            .with_parameter("sink_temperature", 298.0);
        let limit = EfficiencyLimit::for_config(&hot_config);
        assert_eq!(
            limit.basis,
            LimitBasis::Domain {
                domain: "geothermal".to_string()
            }
        );
        assert_eq!(limit.value, 0.35);
    }
}
