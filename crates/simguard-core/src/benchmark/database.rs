//! Benchmark case database loading and schema validation.
//!
//! The reference set ships embedded in the crate (`data/benchmarks.yaml`)
//! and is parsed once. Caller-supplied extension files use the same
//! document layout and must pass `data/benchmark.schema.json` before they
//! are accepted.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::sync::OnceLock;
use thiserror::Error;

use crate::types::BenchmarkCase;

/// Embedded reference database (loaded at compile time).
const BENCHMARKS_YAML: &str = include_str!("../../data/benchmarks.yaml");

/// Embedded database schema (loaded at compile time).
const BENCHMARK_SCHEMA_JSON: &str = include_str!("../../data/benchmark.schema.json");

/// Compiled JSON Schema validator (initialized once, reused).
static COMPILED_SCHEMA: OnceLock<Result<jsonschema::Validator, String>> = OnceLock::new();

/// Parsed embedded database (initialized once, shared read-only).
static EMBEDDED: OnceLock<Result<BenchmarkDatabase, String>> = OnceLock::new();

/// Errors from loading benchmark cases.
#[derive(Error, Debug)]
pub enum BenchmarkError {
    #[error("Failed to read benchmark file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("Failed to decode benchmark cases: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Benchmark schema validation failed: {}", .0.join("; "))]
    SchemaViolation(Vec<String>),

    #[error("Failed to load schema: {0}")]
    SchemaLoad(String),

    #[error("Duplicate benchmark ID: {0}")]
    DuplicateId(String),

    #[error("Embedded benchmark database is invalid: {0}")]
    Embedded(String),
}

/// A versioned set of benchmark cases.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BenchmarkDatabase {
    /// Dataset version (YYYY.N)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    pub cases: Vec<BenchmarkCase>,
}

impl BenchmarkDatabase {
    /// The embedded reference database.
    pub fn embedded() -> Result<&'static BenchmarkDatabase, BenchmarkError> {
        let result = EMBEDDED.get_or_init(|| {
            BenchmarkDatabase::from_yaml(BENCHMARKS_YAML).map_err(|e| e.to_string())
        });

        match result {
            Ok(db) => Ok(db),
            Err(e) => Err(BenchmarkError::Embedded(e.clone())),
        }
    }

    /// Parse and validate a database document from YAML (or JSON).
    pub fn from_yaml(yaml: &str) -> Result<Self, BenchmarkError> {
        let value: serde_json::Value = serde_yaml::from_str(yaml)?;
        validate_benchmark_schema(&value).map_err(BenchmarkError::SchemaViolation)?;

        let database: BenchmarkDatabase = serde_json::from_value(value)?;
        database.validate_unique_ids()?;
        Ok(database)
    }

    /// Parse and validate a database document from a file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, BenchmarkError> {
        let contents = fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    /// Ensure case IDs are unique within the document.
    fn validate_unique_ids(&self) -> Result<(), BenchmarkError> {
        let mut seen = HashSet::new();
        for case in &self.cases {
            if !seen.insert(&case.id) {
                return Err(BenchmarkError::DuplicateId(case.id.clone()));
            }
        }
        Ok(())
    }
}

/// Benchmark document schema, compiled on first use.
fn benchmark_schema() -> Result<&'static jsonschema::Validator, BenchmarkError> {
    COMPILED_SCHEMA
        .get_or_init(|| {
            let schema: serde_json::Value = serde_json::from_str(BENCHMARK_SCHEMA_JSON)
                .map_err(|e| format!("benchmark.schema.json is not JSON: {}", e))?;
            jsonschema::options()
                .build(&schema)
                .map_err(|e| format!("benchmark.schema.json does not compile: {}", e))
        })
        .as_ref()
        .map_err(|e| BenchmarkError::SchemaLoad(e.clone()))
}

/// Check a benchmark document (`{version?, cases: [...]}`) against the
/// case schema: kebab-case IDs, plausible years, positive tolerances and at
/// least one input and output per case.
///
/// Every violation is reported with the JSON pointer of the offending case
/// field, e.g. `/cases/3/tolerance`.
pub fn validate_benchmark_schema(document: &serde_json::Value) -> Result<(), Vec<String>> {
    let schema = benchmark_schema().map_err(|e| vec![e.to_string()])?;

    let violations: Vec<String> = schema
        .iter_errors(document)
        .map(|e| format!("{}: {}", e.instance_path, e))
        .collect();

    if violations.is_empty() {
        Ok(())
    } else {
        Err(violations)
    }
}
