//! simguard CLI
//!
//! Validate simulation results from the command line.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use simguard_core::{
    BenchmarkCase, BenchmarkDatabase, BenchmarkValidator, PhysicsValidator, ReportStatus,
    UncertaintyConfig, UncertaintyQuantifier, ValidationPipeline, ValidationReport,
    ValidationRequest,
};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "simguard")]
#[command(about = "Physics, uncertainty and benchmark validation for energy simulations")]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Validate a simulation run described by a YAML or JSON request file
    Validate {
        /// Validation request file
        request: PathBuf,

        /// Uncertainty configuration file
        #[arg(long)]
        uncertainty_config: Option<PathBuf>,

        /// Additional benchmark cases file
        #[arg(long)]
        benchmarks: Option<PathBuf>,

        /// Output format
        #[arg(long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },

    /// Inspect the benchmark database
    Benchmarks {
        #[command(subcommand)]
        command: BenchmarksCommand,
    },
}

#[derive(Subcommand)]
enum BenchmarksCommand {
    /// List benchmark cases
    List {
        /// Only cases for this domain
        #[arg(long)]
        domain: Option<String>,

        /// Additional benchmark cases file
        #[arg(long)]
        benchmarks: Option<PathBuf>,
    },

    /// Show one benchmark case
    Show {
        /// Benchmark ID
        id: String,

        /// Additional benchmark cases file
        #[arg(long)]
        benchmarks: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Json,
    Text,
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Validate {
            request,
            uncertainty_config,
            benchmarks,
            format,
        } => validate(
            &request,
            uncertainty_config.as_deref(),
            benchmarks.as_deref(),
            format,
        ),
        Command::Benchmarks { command } => {
            match command {
                BenchmarksCommand::List { domain, benchmarks } => {
                    list_benchmarks(domain.as_deref(), benchmarks.as_deref())?
                }
                BenchmarksCommand::Show { id, benchmarks } => {
                    show_benchmark(&id, benchmarks.as_deref())?
                }
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// `RUST_LOG` wins; otherwise `warn`, raised by `-v`.
fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn validate(
    request_path: &Path,
    uncertainty_config: Option<&Path>,
    benchmarks: Option<&Path>,
    format: Format,
) -> Result<ExitCode> {
    let contents = std::fs::read_to_string(request_path)
        .with_context(|| format!("Failed to read request {}", request_path.display()))?;
    let request: ValidationRequest = serde_yaml::from_str(&contents)
        .with_context(|| format!("Failed to parse request {}", request_path.display()))?;

    let config = match uncertainty_config {
        Some(path) => UncertaintyConfig::from_yaml_file(path)
            .with_context(|| format!("Failed to load uncertainty config {}", path.display()))?,
        None => UncertaintyConfig::default(),
    };

    let pipeline = ValidationPipeline::with_components(
        PhysicsValidator::new(),
        UncertaintyQuantifier::new(config),
        load_validator(benchmarks)?,
    );

    let report = pipeline.run(&request);

    match format {
        Format::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        Format::Text => print_report(&report),
    }

    Ok(if report.status == ReportStatus::Failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

fn load_validator(extension: Option<&Path>) -> Result<BenchmarkValidator> {
    let validator = match extension {
        Some(path) => {
            let database = BenchmarkDatabase::from_yaml_file(path)
                .with_context(|| format!("Failed to load benchmarks {}", path.display()))?;
            tracing::info!(cases = database.cases.len(), path = %path.display(), "Loaded extension benchmarks");
            BenchmarkValidator::with_database(database)?
        }
        None => BenchmarkValidator::new()?,
    };
    Ok(validator)
}

fn list_benchmarks(domain: Option<&str>, extension: Option<&Path>) -> Result<()> {
    let validator = load_validator(extension)?;

    let cases: Vec<&BenchmarkCase> = match domain {
        Some(domain) => validator.get_benchmarks_for_domain(domain),
        None => validator.benchmarks().iter().collect(),
    };

    println!("Benchmark database {} ({} cases)", validator.version(), cases.len());
    for case in cases {
        println!("  {:<36} {:<12} {} ({})", case.id, case.domain, case.name, case.year);
    }
    Ok(())
}

fn show_benchmark(id: &str, extension: Option<&Path>) -> Result<()> {
    let validator = load_validator(extension)?;
    let case = validator
        .get_benchmark(id)
        .with_context(|| format!("No benchmark with ID '{}'", id))?;

    println!("{}", serde_yaml::to_string(case)?);
    Ok(())
}

fn print_report(report: &ValidationReport) {
    println!("Status: {}", report.status);
    println!("{}", report.summary);

    if !report.physics.errors.is_empty() || !report.physics.warnings.is_empty() {
        println!();
        println!("Physics:");
        for error in &report.physics.errors {
            println!("  error: {}", error);
        }
        for warning in &report.physics.warnings {
            println!("  warning: {}", warning);
        }
    }

    let u = &report.uncertainty;
    println!();
    println!("Uncertainty:");
    println!("  aleatoric  {:>7.2}%", u.aleatoric * 100.0);
    println!("  epistemic  {:>7.2}%", u.epistemic * 100.0);
    println!("  numerical  {:>7.2}%", u.numerical * 100.0);
    println!("  total      {:>7.2}%", u.total * 100.0);
    println!("  confidence {:>7.2}%", u.confidence_level * 100.0);

    let dominant: Vec<_> = u.parameter_sensitivity.values().filter(|s| s.is_dominant).collect();
    if !dominant.is_empty() {
        println!("  dominant inputs:");
        for s in dominant {
            println!("    {} ({:.0}% of variance)", s.name, s.contribution * 100.0);
        }
    }
    if let Some(estimate) = u.convergence.richardson_estimate {
        println!("  richardson estimate {}", estimate);
    }

    if !report.benchmarks.is_empty() {
        println!();
        println!("Benchmarks:");
        for b in &report.benchmarks {
            let mark = if b.passed { "pass" } else { "FAIL" };
            println!("  [{}] {}: {}", mark, b.benchmark_id, b.details);
        }
    }

    if !u.recommendations.is_empty() {
        println!();
        println!("Recommendations:");
        for r in &u.recommendations {
            println!("  - {}", r);
        }
    }
}
