use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use lsl_experiment::{ExperimentConfig, Viewport};
use lsl_timing::{HighPrecisionTimer, ManualTimer, Timer};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod participant;
mod plan;
mod session;

use participant::SimulatedParticipant;
use plan::SessionPlan;
use session::Session;

/// Runs a latent-state learning session with a simulated participant and writes one
/// JSON record per sorting trial.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Session plan (JSON); the built-in four-phase plan when omitted
    #[arg(long)]
    plan: Option<PathBuf>,

    /// Experiment settings (JSON); defaults when omitted
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long)]
    seed: Option<u64>,

    /// Where to write trial records; stdout when omitted
    #[arg(short, long)]
    output: Option<PathBuf>,

    #[arg(long, default_value = "1280x800", value_parser = parse_viewport)]
    viewport: Viewport,

    /// Chance that a release falls short of every bucket
    #[arg(long, default_value_t = 0.2)]
    miss_rate: f64,

    /// Move the simulated pointer in wall-clock time
    #[arg(long, default_value_t = false)]
    realtime: bool,

    #[arg(short, long, default_value_t = false)]
    verbose: bool,
}

fn parse_viewport(s: &str) -> Result<Viewport, String> {
    let (w, h) = s
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got {s:?}"))?;
    let width: f64 = w.trim().parse().map_err(|e| format!("width {w:?}: {e}"))?;
    let height: f64 = h.trim().parse().map_err(|e| format!("height {h:?}: {e}"))?;
    if !(width > 0.0 && height > 0.0) {
        return Err(format!("viewport {s} has no area"));
    }
    Ok(Viewport::new(width, height))
}

fn load_config(path: Option<&PathBuf>) -> Result<ExperimentConfig> {
    let Some(path) = path else {
        return Ok(ExperimentConfig::default());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading experiment config {}", path.display()))?;
    let config: ExperimentConfig = serde_json::from_str(&text)
        .with_context(|| format!("parsing experiment config {}", path.display()))?;
    config.validate()?;
    Ok(config)
}

fn run<T: Timer>(cli: &Cli, plan: SessionPlan, config: ExperimentConfig, timer: T) -> Result<()> {
    let seed = cli.seed.unwrap_or_else(rand::random);
    info!(seed, viewport = ?cli.viewport, miss_rate = cli.miss_rate, "starting session");

    let mut out: Box<dyn Write> = match &cli.output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("creating {}", path.display()))?,
        )),
        None => Box::new(io::stdout().lock()),
    };

    let mut session = Session::new(
        plan,
        config,
        cli.viewport,
        SimulatedParticipant::new(cli.miss_rate),
        timer,
        StdRng::seed_from_u64(seed),
    );
    let summary = session.run(&mut out)?;
    if let Some(path) = &cli.output {
        info!(trials = summary.trials, path = %path.display(), "records written");
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(io::stderr)
        .init();

    if !(0.0..=1.0).contains(&cli.miss_rate) {
        anyhow::bail!("--miss-rate must be within [0, 1], got {}", cli.miss_rate);
    }

    let plan = match &cli.plan {
        Some(path) => SessionPlan::load(path)?,
        None => SessionPlan::default(),
    };
    let config = load_config(cli.config.as_ref())?;

    if cli.realtime {
        run(&cli, plan, config, HighPrecisionTimer::new())
    } else {
        run(&cli, plan, config, ManualTimer::new())
    }
}
