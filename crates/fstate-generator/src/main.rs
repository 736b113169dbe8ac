//! Forwarding State Generation CLI
//!
//! Runs the ISL-only forwarding state computation over every epoch of a
//! scenario and writes the dynamic state records.
//!
//! Usage:
//!   gen-fstate --scenario data/three_sat_line.json \
//!              --output-dir dynamic_state \
//!              --verbose

use anyhow::{Context, Result};
use clap::Parser;
use fstate_generator::{driver, GeneratorConfig, Scenario};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser, Debug)]
#[command(
    name = "gen-fstate",
    about = "Generate ISL-only forwarding state for an SX9-Orbital scenario"
)]
struct Args {
    /// Path to scenario JSON file
    #[arg(short, long)]
    scenario: PathBuf,

    /// Output directory (overrides config)
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Path to generator config JSON file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Do not write run_summary.json
    #[arg(long)]
    no_summary: bool,

    /// Do not write gsl_if_bandwidth_<t>.txt records
    #[arg(long)]
    no_gsl_if_bandwidth: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let filter = if args.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("{}", "=".repeat(60));
    info!("SX9-Orbital Forwarding State Generator");
    info!("{}", "=".repeat(60));

    let mut config = match &args.config {
        Some(path) => GeneratorConfig::load(path)
            .with_context(|| format!("loading config {:?}", path))?,
        None => GeneratorConfig::default(),
    };
    if let Some(dir) = args.output_dir {
        config.output_dir = dir;
    }
    if args.no_summary {
        config.write_summary = false;
    }
    if args.no_gsl_if_bandwidth {
        config.write_gsl_if_bandwidth = false;
    }

    let scenario = Scenario::load(&args.scenario)
        .with_context(|| format!("loading scenario {:?}", args.scenario))?;

    let summary = driver::run_scenario(&scenario, &config)?;

    // Summary
    info!("{}", "=".repeat(60));
    info!("SUMMARY");
    info!("{}", "=".repeat(60));
    info!("Epochs processed: {}", summary.epochs.len());
    info!("Changed entries written: {}", summary.total_changes());
    for epoch in &summary.epochs {
        info!(
            "  t={}ns: {} changed, {} dropped of {}",
            epoch.time_since_epoch_ns, epoch.changed_entries, epoch.dropped_entries, epoch.entries
        );
    }

    Ok(())
}
