//! # Walk Control
//!
//! Runs a walk of the simulated biped through the real-time control loop.
//!
//! Loads the walk configuration (timing, solver weights, feedback, gait and
//! the footstep program), builds the simulation backend, performs RT setup
//! and drives the walk until the plan is exhausted, a stop is requested
//! (Ctrl-C or `--max-ticks`) or a fatal fault halts it. Per-tick records can
//! be written as JSON lines with `--trace-out`.

use clap::Parser;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use walk_common::consts::DEFAULT_CONFIG_PATH;
use walk_common::error::{StopReason, TickOutcome};
use walk_control::config::load_config;
use walk_control::runner::{RunOptions, rt_setup, run};
use walk_control::sim;

/// Walk Control: preview-control walking loop
#[derive(Parser, Debug)]
#[command(name = "walk_control")]
#[command(version)]
#[command(about = "Real-time preview-control walking loop for a bipedal humanoid")]
struct Args {
    /// Path to the walk configuration TOML.
    #[arg(default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// CPU core to pin the RT thread to (default: 1).
    #[arg(long, default_value_t = 1)]
    cpu_core: usize,

    /// SCHED_FIFO priority (default: 80).
    #[arg(long, default_value_t = 80)]
    rt_priority: i32,

    /// Run ticks back to back instead of once per control period.
    #[arg(long)]
    no_pace: bool,

    /// Request a graceful stop after this many ticks.
    #[arg(long, value_name = "N")]
    max_ticks: Option<u64>,

    /// Write one JSON record per dispatched tick to this file.
    #[arg(long, value_name = "FILE")]
    trace_out: Option<PathBuf>,

    /// Enable verbose logging (DEBUG level).
    #[arg(short, long)]
    verbose: bool,

    /// Output logs in JSON format.
    #[arg(long)]
    json: bool,
}

fn main() {
    let args = Args::parse();

    match run_walk(&args) {
        Ok(TickOutcome::FatalFault(fault)) => {
            error!("FATAL: walk halted: {fault}");
            process::exit(1);
        }
        Ok(outcome) => info!("Walk Control shutdown complete ({outcome:?})"),
        Err(e) => {
            eprintln!("FATAL: {e}");
            error!("FATAL: {e}");
            process::exit(1);
        }
    }
}

fn run_walk(args: &Args) -> Result<TickOutcome, Box<dyn std::error::Error>> {
    let loaded = load_config(&args.config)?;
    setup_tracing(args, loaded.walk.shared.log_level.as_directive());
    info!("Walk Control v{} starting...", env!("CARGO_PKG_VERSION"));

    let timing = &loaded.walk.timing;
    info!(
        "Config OK: control={}ms, preview={}ms, window={}, lookahead={}, footsteps={}",
        timing.control_period_ms,
        timing.preview_period_ms,
        timing.preview_window_size,
        timing.lookahead_steps,
        loaded.footsteps.len(),
    );
    if !loaded.walk.feedback.drift_correction {
        warn!("Drift correction disabled; foot placement follows the plan open-loop");
    }

    let (plan, mut controller) = sim::build(&loaded)?;

    rt_setup(args.cpu_core, args.rt_priority)?;
    info!(
        "RT setup complete (cpu_core={}, priority={})",
        args.cpu_core, args.rt_priority
    );

    let stop = Arc::new(AtomicBool::new(false));
    let s = stop.clone();
    ctrlc::set_handler(move || {
        info!("Received shutdown signal");
        s.store(true, Ordering::SeqCst);
    })?;

    let mut trace = match &args.trace_out {
        Some(path) => Some(BufWriter::new(File::create(path)?)),
        None => None,
    };
    let options = RunOptions {
        paced: !args.no_pace,
        max_ticks: args.max_ticks,
    };

    // Start last: `run` stops the walk on its own errors.
    controller.start(plan)?;
    info!("Walk started (support={:?})", controller.support());

    let summary = run(
        &mut controller,
        &stop,
        options,
        trace.as_mut().map(|w| w as &mut dyn Write),
    )?;
    if let Some(mut w) = trace {
        w.flush()?;
    }

    match &summary.outcome {
        TickOutcome::GracefulStop(StopReason::PlanExhausted) => {
            info!("Footstep plan completed after {} reforms", summary.reforms)
        }
        TickOutcome::GracefulStop(StopReason::StopRequested) => {
            info!("Walk stopped on request after {} ticks", summary.ticks)
        }
        _ => {}
    }
    Ok(summary.outcome)
}

/// Setup tracing subscriber from the CLI flags and the configured level.
fn setup_tracing(args: &Args, configured: &str) {
    let directive = if args.verbose { "debug" } else { configured };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive));

    if args.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .compact()
            .init();
    }
}
