//! Mars Colony Activity Simulation
//!
//! Runs a small settlement for a number of sols and writes every activity
//! event to a JSONL log.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use colony_events::MILLISOLS_PER_SOL;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use colony_core::events::{EventLogger, TickEvents};
use colony_core::setup::build_world;
use colony_core::systems::build_schedule;
use colony_core::{MarsClock, SimConfig};

/// Command line arguments for the simulation
#[derive(Parser, Debug)]
#[command(name = "colony_sim")]
#[command(about = "Mars settlement activity simulation")]
struct Args {
    /// TOML configuration file; defaults apply to anything it omits
    #[arg(long)]
    config: Option<PathBuf>,

    /// Random seed, overrides the configuration
    #[arg(long)]
    seed: Option<u64>,

    /// Number of sols to simulate
    #[arg(long, default_value_t = 3)]
    sols: u32,

    /// Number of colonists, overrides the configuration
    #[arg(long)]
    colonists: Option<usize>,

    /// Simulate a polar winter with no sunrise
    #[arg(long)]
    polar_night: bool,

    /// Where to write the event log
    #[arg(long, default_value = "output/events.jsonl")]
    events: PathBuf,

    /// Print the effective configuration as TOML and exit
    #[arg(long)]
    print_config: bool,
}

fn load_config(args: &Args) -> Result<SimConfig, colony_core::ConfigError> {
    let mut config = match &args.config {
        Some(path) => SimConfig::from_file(path)?,
        None => SimConfig::default(),
    };
    if let Some(seed) = args.seed {
        config.simulation.seed = seed;
    }
    if let Some(count) = args.colonists {
        config.colonists.count = count;
    }
    if args.polar_night {
        config.simulation.polar_night = true;
    }
    config.validate()?;
    Ok(config)
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            error!("Could not load configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if args.print_config {
        return match config.to_toml() {
            Ok(text) => {
                println!("{}", text);
                ExitCode::SUCCESS
            }
            Err(e) => {
                error!("Could not render configuration: {}", e);
                ExitCode::FAILURE
            }
        };
    }

    let mut logger = match EventLogger::new(&args.events) {
        Ok(logger) => logger,
        Err(e) => {
            error!(path = %args.events.display(), "Could not open event log: {}", e);
            return ExitCode::FAILURE;
        }
    };

    println!("Mars Colony Activity Simulation");
    println!("===============================");
    println!("Seed: {}", config.simulation.seed);
    println!("Sols: {}", args.sols);
    println!("Colonists: {}", config.colonists.count);
    println!("Tick length: {} millisols", config.simulation.tick_millisols);
    println!();

    let mut world = build_world(&config);
    let mut schedule = build_schedule();

    let total_ticks =
        (f64::from(args.sols) * MILLISOLS_PER_SOL / config.simulation.tick_millisols).ceil() as u64;
    let ticks_per_sol = (MILLISOLS_PER_SOL / config.simulation.tick_millisols).round() as u64;
    let mut counts: BTreeMap<&'static str, u64> = BTreeMap::new();

    info!(ticks = total_ticks, "Starting simulation");
    for tick in 0..total_ticks {
        schedule.run(&mut world);

        let events = world.resource_mut::<TickEvents>().drain();
        for event in &events {
            *counts.entry(event.kind_name()).or_default() += 1;
        }
        if let Err(e) = logger.log_batch(&events) {
            error!(tick, "Could not write events: {}", e);
            return ExitCode::FAILURE;
        }

        world.resource_mut::<MarsClock>().advance_tick();

        if ticks_per_sol > 0 && tick > 0 && tick % ticks_per_sol == 0 {
            let clock = world.resource::<MarsClock>();
            println!(
                "{} - {} events logged",
                clock.timestamp(),
                logger.event_count()
            );
        }
    }

    if let Err(e) = logger.flush() {
        error!("Could not flush event log: {}", e);
        return ExitCode::FAILURE;
    }

    println!();
    println!(
        "Simulation complete. Ran {} ticks, {} events written to {}.",
        total_ticks,
        logger.event_count(),
        args.events.display()
    );
    for (kind, count) in &counts {
        println!("  {:<20} {}", kind, count);
    }
    ExitCode::SUCCESS
}
