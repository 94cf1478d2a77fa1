//! Control cycle orchestrator: one walk, one tick per control period.
//!
//! ## Tick
//! 1. Read joint sensors, forward kinematics → sensed CoM.
//! 2. Feedback-correct the model position against the sensed CoM (per axis).
//! 3. Advance the model with the last control; reform the preview window
//!    when the clock expired. `Halt` ends the walk without dispatch.
//! 4. Solve the preview problem, keep the first control for the next tick.
//! 5. For each lookahead step `k`: CoM target from the predicted state,
//!    foot targets from the plan and the swing trajectory, IK, joint bounds.
//!    Commands are dispatched only after every step validated, stamped
//!    `now + k·control_period`.
//! 6. Decrement the clock.
//!
//! Terminal phases are `Stopped` and `Faulted`; ticks there are no-ops.
//! Stop requests and fault halts only take effect at tick boundaries.

use std::time::Instant;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, error, info, warn};
use walk_common::boundary::hardware::Hardware;
use walk_common::boundary::ik::{IkEngine, IkTarget, SensedPosture};
use walk_common::boundary::plan::{FootstepPlan, PreviewWindow};
use walk_common::boundary::solver::MpcSolver;
use walk_common::config::{ConfigError, WalkConfig};
use walk_common::consts::MAX_LOOKAHEAD;
use walk_common::error::{HardwareError, StopReason, TickOutcome, WalkFault};
use walk_common::types::{Control, Foot, FootPose, JointVector, Pose2, ProcessState, SupportState};

use crate::clock::ControlClock;
use crate::feedback;
use crate::model::ProcessModel;
use crate::preview::{ReformEvent, SupportMachine};
use crate::safety::HaltLatch;

// ─── Cycle Statistics ───────────────────────────────────────────────

/// O(1) per-tick timing statistics.
#[derive(Debug, Clone)]
pub struct CycleStats {
    /// Ticks executed while running.
    pub cycle_count: u64,
    /// Last tick duration [ns].
    pub last_cycle_ns: i64,
    /// Minimum tick duration [ns].
    pub min_cycle_ns: i64,
    /// Maximum tick duration [ns].
    pub max_cycle_ns: i64,
    /// Running sum for average computation.
    pub sum_cycle_ns: i64,
    /// Ticks that exceeded the loop budget.
    pub overruns: u64,
}

impl CycleStats {
    pub const fn new() -> Self {
        Self {
            cycle_count: 0,
            last_cycle_ns: 0,
            min_cycle_ns: i64::MAX,
            max_cycle_ns: 0,
            sum_cycle_ns: 0,
            overruns: 0,
        }
    }

    /// Record a tick duration. O(1), no allocation.
    #[inline]
    pub fn record(&mut self, duration_ns: i64) {
        self.cycle_count += 1;
        self.last_cycle_ns = duration_ns;
        if duration_ns < self.min_cycle_ns {
            self.min_cycle_ns = duration_ns;
        }
        if duration_ns > self.max_cycle_ns {
            self.max_cycle_ns = duration_ns;
        }
        self.sum_cycle_ns += duration_ns;
    }

    /// Average tick time [ns] (0 if no ticks).
    #[inline]
    pub fn avg_cycle_ns(&self) -> i64 {
        if self.cycle_count == 0 {
            0
        } else {
            self.sum_cycle_ns / self.cycle_count as i64
        }
    }
}

impl Default for CycleStats {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Walk Phase ─────────────────────────────────────────────────────

/// Lifecycle of the orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WalkPhase {
    /// Never started.
    Idle,
    /// Trigger registered, ticking.
    Running,
    /// Ended normally.
    Stopped,
    /// Ended on a fatal fault.
    Faulted,
}

/// Errors starting a walk.
#[derive(Debug, Error)]
pub enum StartError {
    #[error("walk already running")]
    AlreadyRunning,
    #[error("invalid walk configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("walk start failed: {0}")]
    Hardware(#[from] HardwareError),
}

/// Snapshot of the last running tick, for tracing.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TickRecord {
    pub tick: u64,
    pub time_ms: u64,
    pub support: SupportState,
    pub remaining_ms: u32,
    /// Model CoM position after correction and advance [m].
    pub model_com: [f64; 2],
    /// Sensed CoM [m].
    pub sensed_com: [f64; 3],
    pub control: Control,
    /// Targets of the first lookahead step.
    pub com_target: [f64; 3],
    pub left: FootPose,
    pub right: FootPose,
    pub active_constraints: usize,
}

// ─── Orchestrator ───────────────────────────────────────────────────

/// Closed-loop walking controller.
///
/// Owns every piece of mutable walk state; the collaborators are value
/// members re-initialized in place by [`WalkController::start`].
pub struct WalkController<P, S, K, H> {
    config: WalkConfig,
    plan: Option<P>,
    solver: S,
    ik: K,
    hw: H,
    model: ProcessModel,
    state: ProcessState,
    control: Control,
    clock: ControlClock,
    support: SupportMachine,
    window: PreviewWindow,
    latch: HaltLatch,
    phase: WalkPhase,
    terminal: Option<TickOutcome>,
    stop_requested: bool,
    stats: CycleStats,
    record: TickRecord,
    reforms: u64,
    /// Loop budget [ns].
    budget_ns: i64,
}

impl<P, S, K, H> WalkController<P, S, K, H>
where
    P: FootstepPlan,
    S: MpcSolver,
    K: IkEngine,
    H: Hardware,
{
    /// Create an idle controller. `config` is validated by [`Self::start`].
    pub fn new(config: WalkConfig, solver: S, ik: K, hw: H) -> Self {
        let timing = &config.timing;
        let gait = &config.gait;
        Self {
            model: ProcessModel::new(timing.control_period_ms, gait.com_height),
            clock: ControlClock::new(timing.control_period_ms, timing.preview_period_ms),
            support: SupportMachine::new(
                gait.initial_support,
                gait.step_height,
                config.feedback.drift_correction,
            ),
            budget_ns: timing.loop_budget_us as i64 * 1000,
            plan: None,
            solver,
            ik,
            hw,
            state: ProcessState::default(),
            control: Control::default(),
            window: PreviewWindow::new(),
            latch: HaltLatch::new(),
            phase: WalkPhase::Idle,
            terminal: None,
            stop_requested: false,
            stats: CycleStats::new(),
            record: TickRecord::default(),
            reforms: 0,
            config,
        }
    }

    /// Begin a walk over `plan`.
    ///
    /// Validates the configuration, seeds the model at rest above the sensed
    /// CoM, expires the clock so the first tick forms a window, sets walking
    /// stiffness and registers the periodic trigger. An invalid
    /// configuration leaves the hardware untouched.
    pub fn start(&mut self, plan: P) -> Result<(), StartError> {
        if self.phase == WalkPhase::Running {
            return Err(StartError::AlreadyRunning);
        }
        self.config.validate()?;

        let initial = self.config.gait.initial_support;
        self.support.reset(initial);
        self.clock.expire();
        self.control = Control::default();
        self.window.clear();
        self.latch.reset();
        self.terminal = None;
        self.stop_requested = false;
        self.stats = CycleStats::new();
        self.record = TickRecord::default();
        self.reforms = 0;
        self.solver.configure(self.config.timing.preview_window_size, &self.config.solver);

        let joints = self.hw.read_joint_sensors()?;
        let anchor = initial.anchor_foot();
        let (left, right) = plan.feet_positions(0);
        let anchor_pose = foot_of(anchor, left, right).on_ground();
        let sensed = self.ik.forward(&joints, anchor, &anchor_pose);
        self.state = ProcessState::at_rest(sensed.com[0], sensed.com[1]);
        self.plan = Some(plan);

        self.hw.set_actuator_stiffness(self.config.gait.walk_stiffness)?;
        if let Err(e) = self.hw.register_trigger() {
            self.latch.fault(&mut self.hw);
            self.phase = WalkPhase::Faulted;
            self.terminal = Some(TickOutcome::FatalFault(WalkFault::HardwareIo(e.clone())));
            return Err(e.into());
        }

        self.phase = WalkPhase::Running;
        info!(
            support = ?initial,
            com_x = self.state.x.position,
            com_y = self.state.y.position,
            "Walk started"
        );
        Ok(())
    }

    /// Request a graceful stop at the next tick boundary.
    pub fn request_stop(&mut self) {
        if self.phase == WalkPhase::Running && !self.stop_requested {
            info!("Stop requested");
            self.stop_requested = true;
        }
    }

    /// Run one control tick.
    ///
    /// A controller that is not running returns its terminal outcome; one
    /// that was never started reports a requested stop.
    pub fn tick(&mut self) -> TickOutcome {
        if self.phase != WalkPhase::Running {
            return self
                .terminal
                .clone()
                .unwrap_or(TickOutcome::GracefulStop(StopReason::StopRequested));
        }

        let started = Instant::now();
        let outcome = if self.stop_requested {
            self.finish(StopReason::StopRequested)
        } else {
            match self.step() {
                Ok(None) => TickOutcome::Continue,
                Ok(Some(reason)) => self.finish(reason),
                Err(fault) => self.halt(fault),
            }
        };
        self.record_timing(started.elapsed().as_nanos() as i64);
        outcome
    }

    /// Tick body. `Ok(Some(_))` ends the walk gracefully.
    fn step(&mut self) -> Result<Option<StopReason>, WalkFault> {
        let Some(plan) = self.plan.as_mut() else {
            return Ok(Some(StopReason::PlanExhausted));
        };
        let timing = &self.config.timing;
        let fb = &self.config.feedback;
        let com_height = self.config.gait.com_height;

        // 1. Sense.
        let joints = self.hw.read_joint_sensors()?;
        let anchor = self.support.support().anchor_foot();
        let (left, right) = plan.feet_positions(self.clock.elapsed_ms());
        let anchor_pose = foot_of(anchor, left, right).on_ground();
        let sensed: SensedPosture = self.ik.forward(&joints, anchor, &anchor_pose);

        // 2. Correct.
        let h_com = self.model.h_com();
        feedback::correct_axis(&mut self.state.x, sensed.com[0], h_com, fb.deadband, fb.gain);
        feedback::correct_axis(&mut self.state.y, sensed.com[1], h_com, fb.deadband, fb.gain);

        // 3. Advance, reform on expiry.
        self.state = self.model.advance(&self.state, &self.control);
        if self.clock.expired() {
            self.reforms += 1;
            let event = self.support.reform(
                plan,
                &self.state,
                &mut self.window,
                &sensed,
                &mut self.clock,
            );
            debug!(reform = self.reforms, ?event, "Preview window reformed");
            if event == ReformEvent::Halt {
                return Ok(Some(StopReason::PlanExhausted));
            }
        }

        // 4. Solve.
        let lookahead = timing.lookahead_steps.min(MAX_LOOKAHEAD);
        let control_ms = timing.control_period_ms;
        for i in 0..lookahead {
            self.window.set_duration(i, control_ms);
        }
        self.window.set_duration(lookahead, self.clock.remaining_ms());

        self.solver.set_parameters(&self.window, h_com);
        self.solver.form_initial_feasible_point(&self.window, &self.state);
        let active = self.solver.solve();
        self.control = self.solver.first_control();

        // 5. Lookahead targets, all validated before any dispatch.
        let support = self.support.support();
        let anchor = support.anchor_foot();
        let elapsed_ms = self.clock.elapsed_ms();
        let elapsed_ticks = self.clock.elapsed_ticks();
        let ticks_per_interval = timing.ticks_per_interval();
        let mut commands: heapless::Vec<JointVector, MAX_LOOKAHEAD> = heapless::Vec::new();

        for k in 1..=lookahead {
            let step = k as u8;
            let predicted = self.solver.predicted_state(k - 1);
            let com = [predicted.x.position, predicted.y.position, com_height];

            let (l, r) = plan.feet_positions(elapsed_ms + k as u32 * control_ms);
            let mut left = l.on_ground();
            let mut right = r.on_ground();
            if let (Some(swing_foot), Some(traj)) = (support.swing_foot(), self.support.swing()) {
                let theta = traj.progress(ticks_per_interval, elapsed_ticks, k as u32);
                match swing_foot {
                    Foot::Left => left = traj.pose_at(theta),
                    Foot::Right => right = traj.pose_at(theta),
                }
            }

            let target = IkTarget {
                com,
                left,
                right,
                anchor,
            };
            let solved = self.ik.solve(&target).map_err(|e| {
                debug!(step, error = %e, "IK failed");
                WalkFault::IkNonConvergence { step }
            })?;
            if let Some(joint) = self.ik.check_joint_bounds(&solved) {
                let angle = solved.get(joint).copied().unwrap_or(f64::NAN);
                return Err(WalkFault::JointBoundViolation { joint, step, angle });
            }

            if k == 1 {
                self.record.com_target = com;
                self.record.left = left;
                self.record.right = right;
            }
            if commands.push(solved).is_err() {
                break;
            }
        }

        let now = self.hw.now_ms();
        for (i, command) in commands.iter().enumerate() {
            let stamp = now + (i as u64 + 1) * control_ms as u64;
            self.hw.dispatch_command(command, stamp)?;
        }

        self.record.tick = self.stats.cycle_count + 1;
        self.record.time_ms = now;
        self.record.support = support;
        self.record.remaining_ms = self.clock.remaining_ms();
        self.record.model_com = [
            self.state.x.position + h_com * self.state.x.acceleration,
            self.state.y.position + h_com * self.state.y.acceleration,
        ];
        self.record.sensed_com = sensed.com;
        self.record.control = self.control;
        self.record.active_constraints = active;

        // 6. Clock.
        self.clock.tick();
        Ok(None)
    }

    fn finish(&mut self, reason: StopReason) -> TickOutcome {
        self.latch.stop(&mut self.hw, reason);
        self.phase = WalkPhase::Stopped;
        let outcome = TickOutcome::GracefulStop(reason);
        self.terminal = Some(outcome.clone());
        info!(
            ?reason,
            ticks = self.stats.cycle_count + 1,
            reforms = self.reforms,
            "Walk finished"
        );
        outcome
    }

    fn halt(&mut self, fault: WalkFault) -> TickOutcome {
        self.latch.fault(&mut self.hw);
        self.phase = WalkPhase::Faulted;
        error!(
            fault = %fault,
            tick = self.stats.cycle_count + 1,
            support = ?self.support.support(),
            "Walk halted"
        );
        let outcome = TickOutcome::FatalFault(fault);
        self.terminal = Some(outcome.clone());
        outcome
    }

    fn record_timing(&mut self, duration_ns: i64) {
        self.stats.record(duration_ns);
        if duration_ns > self.budget_ns {
            self.stats.overruns += 1;
            let n = self.stats.overruns;
            if overrun_logged(n) {
                warn!(
                    "Loop budget overrun #{}: tick took {}us (budget {}us)",
                    n,
                    duration_ns / 1000,
                    self.budget_ns / 1000
                );
            }
        }
    }

    // ─── Accessors ──────────────────────────────────────────────────

    #[inline]
    pub const fn phase(&self) -> WalkPhase {
        self.phase
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        self.phase == WalkPhase::Running
    }

    #[inline]
    pub const fn stats(&self) -> &CycleStats {
        &self.stats
    }

    #[inline]
    pub const fn record(&self) -> &TickRecord {
        &self.record
    }

    #[inline]
    pub const fn config(&self) -> &WalkConfig {
        &self.config
    }

    #[inline]
    pub const fn state(&self) -> &ProcessState {
        &self.state
    }

    /// Control applied by the next model advance.
    #[inline]
    pub const fn last_control(&self) -> Control {
        self.control
    }

    #[inline]
    pub const fn clock(&self) -> &ControlClock {
        &self.clock
    }

    #[inline]
    pub const fn support(&self) -> SupportState {
        self.support.support()
    }

    /// Preview window reforms in this walk, including the halting one.
    #[inline]
    pub const fn reform_count(&self) -> u64 {
        self.reforms
    }

    #[inline]
    pub const fn plan(&self) -> Option<&P> {
        self.plan.as_ref()
    }

    #[inline]
    pub const fn solver(&self) -> &S {
        &self.solver
    }

    #[inline]
    pub const fn ik(&self) -> &K {
        &self.ik
    }

    #[inline]
    pub fn ik_mut(&mut self) -> &mut K {
        &mut self.ik
    }

    #[inline]
    pub const fn hardware(&self) -> &H {
        &self.hw
    }

    #[inline]
    pub fn hardware_mut(&mut self) -> &mut H {
        &mut self.hw
    }
}

/// Overrun warnings: the first 10, then every 1000th.
#[inline]
const fn overrun_logged(n: u64) -> bool {
    n <= 10 || n % 1000 == 0
}

/// Pose of `foot` out of a (left, right) pair.
#[inline]
fn foot_of(foot: Foot, left: Pose2, right: Pose2) -> Pose2 {
    match foot {
        Foot::Left => left,
        Foot::Right => right,
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
