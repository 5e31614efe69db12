//! Asteroid Sim entry point
//!
//! Reads asteroid records, runs the collision simulation and writes the
//! collision log. Can also generate seeded asteroid fields.

use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};

use asteroid_sim::persistence::{load_asteroids, save_asteroids, save_collisions};
use asteroid_sim::scenario::{FieldParams, generate};
use asteroid_sim::sim::{Orchestrator, ReportPolicy};
use asteroid_sim::{BroadPhase, SimSettings};

#[derive(Parser, Debug)]
#[command(name = "asteroid-sim", version, about = "2D asteroid collision detection")]
struct Cli {
    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Simulate an asteroid file and write the collision log
    Run(RunArgs),
    /// Write a seeded random asteroid file
    Generate(GenerateArgs),
}

#[derive(clap::Args, Debug)]
struct RunArgs {
    /// Asteroid records (`id x y vx vy radius` per line)
    input: PathBuf,

    /// Collision log destination
    #[arg(short, long, default_value = "collisions.txt")]
    output: PathBuf,

    /// JSON settings file
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[arg(long)]
    step: Option<f64>,

    #[arg(long)]
    horizon: Option<f64>,

    #[arg(short, long)]
    workers: Option<usize>,

    /// `every-step` or `episode-start`
    #[arg(long)]
    policy: Option<String>,

    /// Use the spatial-hash broad phase with this cell size
    #[arg(long)]
    grid_cell: Option<f64>,

    /// Decimals for collision times
    #[arg(long)]
    decimals: Option<usize>,
}

#[derive(clap::Args, Debug)]
struct GenerateArgs {
    /// Asteroid file to write
    output: PathBuf,

    #[arg(short = 'n', long, default_value_t = 100)]
    count: usize,

    #[arg(short, long, default_value_t = 1)]
    seed: u64,

    #[arg(long)]
    extent: Option<f64>,

    #[arg(long)]
    max_speed: Option<f64>,

    #[arg(long)]
    max_radius: Option<f64>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    match cli.command {
        Command::Run(args) => run(args),
        Command::Generate(args) => generate_field(args),
    }
}

/// File settings first, then command-line overrides
fn resolve_settings(args: &RunArgs) -> Result<SimSettings> {
    let mut settings = match &args.config {
        Some(path) => SimSettings::load(path)
            .with_context(|| format!("loading settings from {}", path.display()))?,
        None => SimSettings::default(),
    };

    if let Some(step) = args.step {
        settings.time_step = step;
    }
    if let Some(horizon) = args.horizon {
        settings.horizon = horizon;
    }
    if let Some(workers) = args.workers {
        settings.workers = workers;
    }
    if let Some(policy) = &args.policy {
        settings.report_policy = ReportPolicy::from_str(policy)
            .ok_or_else(|| anyhow!("unknown report policy {:?}", policy))?;
    }
    if let Some(cell_size) = args.grid_cell {
        settings.broad_phase = BroadPhase::Grid { cell_size };
    }
    if let Some(decimals) = args.decimals {
        settings.time_decimals = decimals;
    }
    Ok(settings)
}

fn run(args: RunArgs) -> Result<()> {
    let settings = resolve_settings(&args)?;

    let loaded = load_asteroids(&args.input)
        .with_context(|| format!("loading asteroids from {}", args.input.display()))?;
    let mut orchestrator = Orchestrator::from_settings(loaded.bodies, &settings)?;
    let report = orchestrator.run()?;

    save_collisions(&args.output, &report.events, settings.time_decimals)
        .with_context(|| format!("writing {}", args.output.display()))?;

    log::info!(
        "{} collisions over {} steps ({} skipped records, {} data-quality warnings)",
        report.events.len(),
        report.steps,
        loaded.skipped.len(),
        report.warnings.len()
    );
    println!(
        "Collision detection complete. Results saved to {}.",
        args.output.display()
    );
    Ok(())
}

fn generate_field(args: GenerateArgs) -> Result<()> {
    let mut params = FieldParams::default();
    if let Some(extent) = args.extent {
        params.extent = extent;
    }
    if let Some(max_speed) = args.max_speed {
        params.max_speed = max_speed;
    }
    if let Some(max_radius) = args.max_radius {
        params.max_radius = max_radius;
        params.min_radius = params.min_radius.min(max_radius);
    }

    let bodies = generate(args.count, args.seed, &params)?;
    save_asteroids(&args.output, &bodies)
        .with_context(|| format!("writing {}", args.output.display()))?;
    println!("Wrote {} asteroids to {}.", bodies.len(), args.output.display());
    Ok(())
}
