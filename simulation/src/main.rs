//! Modemnet - modem packet network simulation
//!
//! Runs scenarios against the wired and wireless engines and prints a JSON
//! report for each.

use std::path::PathBuf;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use modemnet_logging::{LogConfig, ModemnetSubscriberBuilder};
use modemnet_modem::ModemConfig;
use serde::Serialize;

use modemnet_simulation::scenarios;

#[derive(Parser)]
#[command(
    name = "modemnet-sim",
    about = "Wired and wireless modem network simulation",
    version
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Human-readable logs instead of JSONL
    #[arg(long, global = true)]
    pretty: bool,

    /// Modem configuration (JSON)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the A-B-C wired split scenario
    Abc,

    /// Sweep wireless listeners outwards from one sender
    Range {
        /// Sender altitude
        #[arg(short, long, default_value = "64")]
        altitude: f64,

        /// Distance between listeners
        #[arg(short, long, default_value = "8")]
        step: f64,

        /// Number of listeners
        #[arg(short = 'n', long, default_value = "16")]
        count: usize,
    },

    /// Random cable churn checked against a BFS oracle
    Churn {
        /// Number of random operations
        #[arg(long, default_value = "1000")]
        steps: usize,

        /// RNG seed
        #[arg(long, default_value = "1")]
        seed: u64,

        /// Number of computers
        #[arg(long, default_value = "12")]
        nodes: usize,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_config = LogConfig {
        default_level: if cli.verbose { "debug" } else { "info" }.to_string(),
        ..LogConfig::default()
    };
    let _log_guard = ModemnetSubscriberBuilder::new()
        .with_config(log_config)
        .with_pretty(cli.pretty)
        .init()?;

    let config = match &cli.config {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            ModemConfig::from_json(&json).with_context(|| format!("loading {}", path.display()))?
        }
        None => ModemConfig::default(),
    };

    let passed = match cli.command {
        Commands::Abc => report(&scenarios::run_abc_scenario(config)?, |r| r.passed)?,
        Commands::Range {
            altitude,
            step,
            count,
        } => report(
            &scenarios::run_range_sweep(config, altitude, step, count)?,
            |r| r.passed,
        )?,
        Commands::Churn { steps, seed, nodes } => report(
            &scenarios::run_churn(config, steps, seed, nodes)?,
            |r| r.passed,
        )?,
    };

    if !passed {
        bail!("scenario failed");
    }
    Ok(())
}

fn report<R: Serialize>(report: &R, passed: impl Fn(&R) -> bool) -> anyhow::Result<bool> {
    println!("{}", serde_json::to_string_pretty(report)?);
    Ok(passed(report))
}
