//! Energy Market Simulation
//!
//! Consumers pick producers by trust and cost every tick; producers fail
//! stochastically and their trust follows the outcome.

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use market_core::config::default_config_toml;
use market_core::{build_coordinator, EventLogger, MarketConfig, MarketError, DEFAULT_CONFIG_PATH};

/// Command line arguments for the simulation
#[derive(Parser, Debug)]
#[command(name = "energy_market")]
#[command(about = "A discrete-time energy market driven by trust feedback")]
struct Args {
    /// Configuration file (TOML); falls back to market.toml, then built-in defaults
    #[arg(long)]
    config: Option<PathBuf>,

    /// Random seed for reproducibility (overrides the config)
    #[arg(long)]
    seed: Option<u64>,

    /// First tick on which consumers decide
    #[arg(long)]
    start_tick: Option<u64>,

    /// Ticks between decision rounds
    #[arg(long)]
    interval: Option<u64>,

    /// Last tick to execute
    #[arg(long)]
    stop_tick: Option<u64>,

    /// Write market events as JSONL to this path
    #[arg(long)]
    events: Option<PathBuf>,

    /// Write the run summary as JSON to this path
    #[arg(long)]
    summary: Option<PathBuf>,

    /// Print the default configuration and exit
    #[arg(long)]
    print_default_config: bool,
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    if args.print_default_config {
        print!("{}", default_config_toml());
        return ExitCode::SUCCESS;
    }

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn load_config(args: &Args) -> Result<MarketConfig, MarketError> {
    let mut config = match &args.config {
        Some(path) => MarketConfig::from_file(path)?,
        None if std::path::Path::new(DEFAULT_CONFIG_PATH).exists() => {
            MarketConfig::from_file(DEFAULT_CONFIG_PATH)?
        }
        None => {
            tracing::info!("No {} found. Using built-in population.", DEFAULT_CONFIG_PATH);
            MarketConfig::default()
        }
    };

    if let Some(seed) = args.seed {
        config.simulation.seed = seed;
    }
    if let Some(start_tick) = args.start_tick {
        config.simulation.start_tick = start_tick;
    }
    if let Some(interval) = args.interval {
        config.simulation.interval = interval;
    }
    if let Some(stop_tick) = args.stop_tick {
        config.simulation.stop_tick = stop_tick;
    }

    Ok(config)
}

fn run(args: Args) -> Result<(), MarketError> {
    let config = load_config(&args)?;
    let sim = &config.simulation;

    println!("Energy Market Simulation");
    println!("========================");
    println!("Seed: {}", sim.seed);
    println!("Ticks: {} to {} every {}", sim.start_tick, sim.stop_tick, sim.interval);
    println!();

    let (mut coordinator, population) = build_coordinator(&config)?;
    print!("{}", population);

    if let Some(path) = &args.events {
        coordinator = coordinator.with_event_logger(EventLogger::new(path)?);
        println!("Logging events to {}", path.display());
    }

    println!();
    println!("Starting simulation...");
    let summary = coordinator.run()?;

    println!();
    println!(
        "Simulation complete. {} decisions over {} ticks, {} unserved.",
        summary.decisions, summary.decision_ticks, summary.unserved
    );
    for producer in &summary.producers {
        println!(
            "  {:<20}| TRUST LEVEL: {:.4} - CAPACITY: {} - CHOSEN: {}",
            producer.name, producer.trust_level, producer.capacity, producer.times_chosen
        );
    }

    if let Some(path) = &args.summary {
        let json = summary
            .to_json_pretty()
            .map_err(|e| MarketError::Io(e.into()))?;
        std::fs::write(path, json)?;
        println!("Wrote summary to {}", path.display());
    }

    Ok(())
}
