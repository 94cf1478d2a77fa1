//! Periodic run loop driving a walk to completion.
//!
//! ## RT Setup
//! 1. `mlockall(MCL_CURRENT | MCL_FUTURE)`: lock all pages.
//! 2. Prefault stack pages.
//! 3. `sched_setaffinity`: pin to an isolated CPU core.
//! 4. `sched_setscheduler(SCHED_FIFO, prio)`.
//!
//! ## Pacing
//! With the `rt` feature, absolute-time `clock_nanosleep` on
//! `CLOCK_MONOTONIC`. Otherwise `std::thread::sleep` for the rest of the
//! period, or no sleep at all when unpaced.
//!
//! One tick runs per period; the loop never overlaps two ticks. A stop flag
//! (set from a signal handler) is forwarded as a stop request at the next
//! tick boundary.

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};

use thiserror::Error;
use tracing::{debug, info, warn};
use walk_common::boundary::hardware::Hardware;
use walk_common::boundary::ik::IkEngine;
use walk_common::boundary::plan::FootstepPlan;
use walk_common::boundary::solver::MpcSolver;
use walk_common::error::TickOutcome;

use crate::cycle::{CycleStats, WalkController};
use crate::sim::SimulatedTime;

/// Errors during RT setup or the run loop.
#[derive(Debug, Error)]
pub enum RunError {
    /// RT system call failed.
    #[error("RT setup error: {0}")]
    RtSetup(String),
    /// Controller was not started.
    #[error("walk not running")]
    NotRunning,
    /// Trace output failed.
    #[error("trace output error: {0}")]
    Trace(#[from] std::io::Error),
    /// Trace record could not be encoded.
    #[error("trace encoding error: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Loop options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOptions {
    /// Sleep out each control period (wall-clock pacing).
    pub paced: bool,
    /// Stop after this many ticks (graceful stop request).
    pub max_ticks: Option<u64>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            paced: true,
            max_ticks: None,
        }
    }
}

/// How a walk ended.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub outcome: TickOutcome,
    pub ticks: u64,
    pub reforms: u64,
    pub stats: CycleStats,
}

// ─── RT Setup ───────────────────────────────────────────────────────

/// Lock all current and future memory pages.
///
/// No-op when the `rt` feature is not enabled.
#[cfg(feature = "rt")]
fn rt_mlockall() -> Result<(), RunError> {
    use nix::sys::mman::{MlockallFlags, mlockall};
    mlockall(MlockallFlags::MCL_CURRENT | MlockallFlags::MCL_FUTURE)
        .map_err(|e| RunError::RtSetup(format!("mlockall failed: {e}")))
}

#[cfg(not(feature = "rt"))]
fn rt_mlockall() -> Result<(), RunError> {
    Ok(())
}

/// Touch 256 KiB of stack so the loop does not page-fault on first use.
fn prefault_stack() {
    let mut buf = [0u8; 256 * 1024];
    for byte in buf.iter_mut() {
        // SAFETY: `byte` is a valid, aligned, exclusive reference.
        unsafe { core::ptr::write_volatile(byte, 0xFF) };
    }
    core::hint::black_box(&buf);
}

/// Pin the current thread to a CPU core.
#[cfg(feature = "rt")]
fn rt_set_affinity(cpu: usize) -> Result<(), RunError> {
    use nix::sched::{CpuSet, sched_setaffinity};
    use nix::unistd::Pid;

    let mut cpuset = CpuSet::new();
    cpuset
        .set(cpu)
        .map_err(|e| RunError::RtSetup(format!("CpuSet::set({cpu}) failed: {e}")))?;
    sched_setaffinity(Pid::from_raw(0), &cpuset)
        .map_err(|e| RunError::RtSetup(format!("sched_setaffinity failed: {e}")))
}

#[cfg(not(feature = "rt"))]
fn rt_set_affinity(_cpu: usize) -> Result<(), RunError> {
    Ok(())
}

/// Set SCHED_FIFO with the given RT priority.
#[cfg(feature = "rt")]
fn rt_set_scheduler(priority: i32) -> Result<(), RunError> {
    let param = libc::sched_param {
        sched_priority: priority,
    };
    // SAFETY: `param` is a valid sched_param for the calling thread.
    let ret = unsafe { libc::sched_setscheduler(0, libc::SCHED_FIFO, &param) };
    if ret != 0 {
        let err = std::io::Error::last_os_error();
        return Err(RunError::RtSetup(format!(
            "sched_setscheduler(SCHED_FIFO, {priority}) failed: {err}"
        )));
    }
    Ok(())
}

#[cfg(not(feature = "rt"))]
fn rt_set_scheduler(_priority: i32) -> Result<(), RunError> {
    Ok(())
}

/// Full RT setup. All calls are no-ops without the `rt` feature.
pub fn rt_setup(cpu_core: usize, rt_priority: i32) -> Result<(), RunError> {
    rt_mlockall()?;
    prefault_stack();
    rt_set_affinity(cpu_core)?;
    rt_set_scheduler(rt_priority)?;
    Ok(())
}

// ─── Loop ───────────────────────────────────────────────────────────

/// Drive a started walk until it stops or faults.
///
/// Each tick's record is written to `trace` as one JSON line. The simulated
/// hardware clock advances by one control period after every tick. A loop
/// error stops the walk before it is returned.
pub fn run<P, S, K, H>(
    controller: &mut WalkController<P, S, K, H>,
    stop: &AtomicBool,
    options: RunOptions,
    trace: Option<&mut dyn Write>,
) -> Result<RunSummary, RunError>
where
    P: FootstepPlan,
    S: MpcSolver,
    K: IkEngine,
    H: Hardware + SimulatedTime,
{
    if !controller.is_running() || !controller.hardware().trigger_registered() {
        return Err(RunError::NotRunning);
    }
    let period_ms = controller.config().timing.control_period_ms;

    #[cfg(feature = "rt")]
    let result = run_rt_loop(controller, stop, options, trace, period_ms);

    #[cfg(not(feature = "rt"))]
    let result = run_sim_loop(controller, stop, options, trace, period_ms);

    let outcome = match result {
        Ok(outcome) => outcome,
        Err(e) => {
            stop_after_error(controller, &e);
            return Err(e);
        }
    };

    let stats = controller.stats().clone();
    info!(
        ticks = stats.cycle_count,
        reforms = controller.reform_count(),
        avg_us = stats.avg_cycle_ns() / 1000,
        max_us = stats.max_cycle_ns / 1000,
        overruns = stats.overruns,
        "Run loop finished"
    );
    Ok(RunSummary {
        outcome,
        ticks: stats.cycle_count,
        reforms: controller.reform_count(),
        stats,
    })
}

/// Stop a walk the loop abandoned; the trigger is disconnected.
fn stop_after_error<P, S, K, H>(controller: &mut WalkController<P, S, K, H>, err: &RunError)
where
    P: FootstepPlan,
    S: MpcSolver,
    K: IkEngine,
    H: Hardware,
{
    if controller.is_running() {
        warn!(error = %err, "Run loop failed, stopping walk");
        controller.request_stop();
        let outcome = controller.tick();
        debug!(?outcome, "Walk stopped after loop error");
    }
}

/// One loop iteration shared by both pacings.
fn iterate<P, S, K, H>(
    controller: &mut WalkController<P, S, K, H>,
    stop: &AtomicBool,
    options: &RunOptions,
    trace: &mut Option<&mut dyn Write>,
    period_ms: u32,
) -> Result<TickOutcome, RunError>
where
    P: FootstepPlan,
    S: MpcSolver,
    K: IkEngine,
    H: Hardware + SimulatedTime,
{
    let over_limit = options.max_ticks.is_some_and(|n| controller.stats().cycle_count >= n);
    if stop.load(Ordering::Relaxed) || over_limit {
        controller.request_stop();
    }

    let outcome = controller.tick();
    if outcome == TickOutcome::Continue {
        if let Some(w) = trace.as_mut() {
            serde_json::to_writer(&mut **w, controller.record())?;
            w.write_all(b"\n")?;
        }
    }
    controller.hardware_mut().advance_ms(period_ms);

    let count = controller.stats().cycle_count;
    if count % 1000 == 0 {
        let stats = controller.stats();
        debug!(
            "Walk loop: {} ticks, avg={}us, max={}us, overruns={}",
            count,
            stats.avg_cycle_ns() / 1000,
            stats.max_cycle_ns / 1000,
            stats.overruns
        );
    }
    Ok(outcome)
}

#[cfg(not(feature = "rt"))]
fn run_sim_loop<P, S, K, H>(
    controller: &mut WalkController<P, S, K, H>,
    stop: &AtomicBool,
    options: RunOptions,
    mut trace: Option<&mut dyn Write>,
    period_ms: u32,
) -> Result<TickOutcome, RunError>
where
    P: FootstepPlan,
    S: MpcSolver,
    K: IkEngine,
    H: Hardware + SimulatedTime,
{
    use std::time::{Duration, Instant};

    let period = Duration::from_millis(period_ms as u64);
    loop {
        let start = Instant::now();
        let outcome = iterate(controller, stop, &options, &mut trace, period_ms)?;
        if outcome.is_terminal() {
            return Ok(outcome);
        }
        if options.paced {
            if let Some(remaining) = period.checked_sub(start.elapsed()) {
                std::thread::sleep(remaining);
            }
        }
    }
}

#[cfg(feature = "rt")]
fn run_rt_loop<P, S, K, H>(
    controller: &mut WalkController<P, S, K, H>,
    stop: &AtomicBool,
    options: RunOptions,
    mut trace: Option<&mut dyn Write>,
    period_ms: u32,
) -> Result<TickOutcome, RunError>
where
    P: FootstepPlan,
    S: MpcSolver,
    K: IkEngine,
    H: Hardware + SimulatedTime,
{
    use nix::time::{ClockId, ClockNanosleepFlags, clock_gettime, clock_nanosleep};

    let clock = ClockId::CLOCK_MONOTONIC;
    let period_ns = period_ms as i64 * 1_000_000;
    let mut next_wake =
        clock_gettime(clock).map_err(|e| RunError::RtSetup(format!("clock_gettime: {e}")))?;

    loop {
        next_wake = timespec_add_ns(next_wake, period_ns);
        let outcome = iterate(controller, stop, &options, &mut trace, period_ms)?;
        if outcome.is_terminal() {
            return Ok(outcome);
        }
        if options.paced {
            let _ = clock_nanosleep(clock, ClockNanosleepFlags::TIMER_ABSTIME, &next_wake);
        }
    }
}

// ─── Time Helpers ───────────────────────────────────────────────────

/// Add nanoseconds to a TimeSpec.
#[cfg(feature = "rt")]
fn timespec_add_ns(ts: nix::sys::time::TimeSpec, ns: i64) -> nix::sys::time::TimeSpec {
    use nix::sys::time::TimeSpec;
    let mut secs = ts.tv_sec();
    let mut nanos = ts.tv_nsec() + ns;
    while nanos >= 1_000_000_000 {
        secs += 1;
        nanos -= 1_000_000_000;
    }
    while nanos < 0 {
        secs -= 1;
        nanos += 1_000_000_000;
    }
    TimeSpec::new(secs, nanos)
}

// ─── Tests ──────────────────────────────────────────────────────────
