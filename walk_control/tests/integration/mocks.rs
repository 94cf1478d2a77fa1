//! Scripted collaborators shared by the integration tests.

use std::cell::Cell;
use std::time::{Duration, Instant};

use walk_common::boundary::hardware::Hardware;
use walk_common::boundary::ik::{IkEngine, IkTarget, SensedPosture};
use walk_common::boundary::plan::{
    FootstepPlan, FootstepSpec, PreviewWindow, ReformResult, SwingPhase, WindowStep,
};
use walk_common::boundary::solver::MpcSolver;
use walk_common::config::{SolverWeights, WalkConfig};
use walk_common::error::{HardwareError, IkError};
use walk_common::types::{
    Control, Foot, FootPose, JointVector, Pose2, ProcessState, SupportState,
};
use walk_control::cycle::WalkController;
use walk_control::sim::SimulatedTime;

pub type MockController = WalkController<MockPlan, MockSolver, MockIk, MockHw>;

pub const JOINTS: usize = 12;

pub fn left_foot() -> Pose2 {
    Pose2::new(0.0, 0.05, 0.0)
}

pub fn right_foot() -> Pose2 {
    Pose2::new(0.0, -0.05, 0.0)
}

pub fn controller_with_solver(config: WalkConfig, solver: MockSolver) -> MockController {
    WalkController::new(config, solver, MockIk::default(), MockHw::new())
}

pub fn controller(config: WalkConfig) -> MockController {
    controller_with_solver(config, MockSolver::default())
}

/// Start `ctl` on `plan`, panicking on failure.
pub fn started(mut ctl: MockController, plan: MockPlan) -> MockController {
    ctl.start(plan).expect("start");
    ctl
}

/// One tick, then advance the mock clock by a control period.
pub fn tick(ctl: &mut MockController) -> walk_common::error::TickOutcome {
    let outcome = ctl.tick();
    let period = ctl.config().timing.control_period_ms;
    ctl.hardware_mut().advance_ms(period);
    outcome
}

// ─── Plan ───────────────────────────────────────────────────────────

/// Plan replaying one scripted result per reform; `Halt` once exhausted.
///
/// Keeps its own support state, flipped by every `SwitchSupport` it hands
/// out, and swings the foot opposite to it.
pub struct MockPlan {
    script: Vec<ReformResult>,
    pub support: SupportState,
    /// Reform indices (0-based) whose switch the plan does not confirm.
    unconfirmed: Vec<usize>,
    pub reforms: usize,
    pub left: Pose2,
    pub right: Pose2,
    pub window_size: usize,
    pub preview_ms: u32,
    pub corrections: Vec<(f64, f64)>,
}

impl MockPlan {
    pub fn new(script: &[ReformResult]) -> Self {
        Self {
            script: script.to_vec(),
            support: SupportState::SingleRight,
            unconfirmed: Vec::new(),
            reforms: 0,
            left: left_foot(),
            right: right_foot(),
            window_size: 15,
            preview_ms: 100,
            corrections: Vec::new(),
        }
    }

    /// `n` reforms of `Continue`, then `Halt`.
    pub fn continuing(n: usize) -> Self {
        Self::new(&vec![ReformResult::Continue; n])
    }

    /// Support the plan starts from; match the controller's initial support.
    pub fn supported_by(mut self, support: SupportState) -> Self {
        self.support = support;
        self
    }

    pub fn unconfirmed(mut self, reform: usize) -> Self {
        self.unconfirmed.push(reform);
        self
    }
}

impl FootstepPlan for MockPlan {
    fn add_footstep(&mut self, _step: FootstepSpec) {}

    fn form_preview_window(
        &mut self,
        _state: &ProcessState,
        window: &mut PreviewWindow,
    ) -> ReformResult {
        let result = self
            .script
            .get(self.reforms)
            .copied()
            .unwrap_or(ReformResult::Halt);
        self.reforms += 1;
        match result {
            ReformResult::Halt => return result,
            ReformResult::SwitchSupport => self.support = self.support.switched(),
            ReformResult::Continue => {}
        }
        window.clear();
        let zmp = [0.0, (self.left.y + self.right.y) / 2.0];
        for _ in 0..self.window_size {
            window.push(WindowStep {
                zmp_ref: zmp,
                duration_ms: self.preview_ms,
                angle: 0.0,
                lower: [-0.03, -0.025],
                upper: [0.09, 0.025],
                feasible: zmp,
            });
        }
        result
    }

    fn feet_positions(&self, _offset_ms: u32) -> (Pose2, Pose2) {
        (self.left, self.right)
    }

    fn swing_phase(&self) -> Option<SwingPhase> {
        let foot = self.support.swing_foot()?;
        let previous = match foot {
            Foot::Left => self.left,
            Foot::Right => self.right,
        };
        Some(SwingPhase {
            foot,
            previous,
            next: Pose2::new(previous.x + 0.07, previous.y, 0.0),
            intervals_total: 2,
            intervals_elapsed: 0,
        })
    }

    fn is_support_switch_needed(&self) -> bool {
        self.script.get(self.reforms) == Some(&ReformResult::SwitchSupport)
            && !self.unconfirmed.contains(&self.reforms)
    }

    fn correct_next_swing_position(&mut self, dx: f64, dy: f64) {
        self.corrections.push((dx, dy));
    }
}

// ─── Solver ─────────────────────────────────────────────────────────

/// Solver predicting a body at rest over the initial state.
#[derive(Default)]
pub struct MockSolver {
    pub configured_size: Option<usize>,
    pub h_com: f64,
    /// Window durations seen by each `set_parameters` call.
    pub durations: Vec<Vec<u32>>,
    pub init: ProcessState,
    pub control: Control,
    /// Busy-wait this long in every `solve`.
    pub spin: Option<Duration>,
}

impl MpcSolver for MockSolver {
    fn configure(&mut self, window_size: usize, _weights: &SolverWeights) {
        self.configured_size = Some(window_size);
        self.durations.clear();
    }

    fn set_parameters(&mut self, window: &PreviewWindow, h_com: f64) {
        self.h_com = h_com;
        self.durations.push(window.steps().iter().map(|s| s.duration_ms).collect());
    }

    fn form_initial_feasible_point(&mut self, _window: &PreviewWindow, init: &ProcessState) {
        self.init = *init;
    }

    fn solve(&mut self) -> usize {
        if let Some(spin) = self.spin {
            let started = Instant::now();
            while started.elapsed() < spin {
                std::hint::spin_loop();
            }
        }
        0
    }

    fn predicted_state(&self, _step: usize) -> ProcessState {
        ProcessState::at_rest(self.init.x.position, self.init.y.position)
    }

    fn first_control(&self) -> Control {
        self.control
    }
}

// ─── IK ─────────────────────────────────────────────────────────────

/// IK recording its targets, with injectable failures.
pub struct MockIk {
    pub targets: Vec<IkTarget>,
    /// Fail the n-th `solve` call (0-based).
    pub fail_on: Option<usize>,
    /// Push `joint` out of bounds on the n-th `solve` call.
    pub out_of_bounds_on: Option<(usize, usize)>,
    /// CoM reported by the first forward call (walk start).
    pub start_com: [f64; 3],
    /// CoM reported by every later forward call.
    pub walk_com: [f64; 3],
    /// Sensed pose of the non-anchor foot.
    pub free_foot: Option<FootPose>,
    forward_calls: Cell<usize>,
}

impl Default for MockIk {
    fn default() -> Self {
        Self {
            targets: Vec::new(),
            fail_on: None,
            out_of_bounds_on: None,
            start_com: [0.0, 0.0, 0.26],
            walk_com: [0.0, 0.0, 0.26],
            free_foot: None,
            forward_calls: Cell::new(0),
        }
    }
}

impl IkEngine for MockIk {
    fn solve(&mut self, target: &IkTarget) -> Result<JointVector, IkError> {
        let call = self.targets.len();
        self.targets.push(*target);
        if self.fail_on == Some(call) {
            return Err(IkError::NonConvergence { residual: 0.01 });
        }
        let mut joints = JointVector::new();
        for _ in 0..JOINTS {
            let _ = joints.push(0.0);
        }
        if let Some((n, joint)) = self.out_of_bounds_on {
            if n == call {
                joints[joint] = 9.0;
            }
        }
        Ok(joints)
    }

    fn check_joint_bounds(&self, joints: &JointVector) -> Option<usize> {
        joints.iter().position(|q| q.abs() > 3.0)
    }

    fn forward(
        &self,
        _joints: &JointVector,
        anchor: Foot,
        anchor_pose: &FootPose,
    ) -> SensedPosture {
        let calls = self.forward_calls.get();
        self.forward_calls.set(calls + 1);
        let com = if calls == 0 { self.start_com } else { self.walk_com };

        let planned_free = match anchor {
            Foot::Left => right_foot().on_ground(),
            Foot::Right => left_foot().on_ground(),
        };
        let free = self.free_foot.unwrap_or(planned_free);
        let (left, right) = match anchor {
            Foot::Left => (*anchor_pose, free),
            Foot::Right => (free, *anchor_pose),
        };
        SensedPosture { com, left, right }
    }
}

// ─── Hardware ───────────────────────────────────────────────────────

/// Hardware recording every command, with injectable failures.
pub struct MockHw {
    pub now: u64,
    pub registered: bool,
    pub register_fails: bool,
    pub unregister_calls: u32,
    pub stiffness: Vec<f64>,
    pub dispatched: Vec<(JointVector, u64)>,
    /// Fail the n-th sensor read (0-based; read 0 is the walk start).
    pub fail_read_on: Option<usize>,
    pub reads: usize,
}

impl MockHw {
    pub fn new() -> Self {
        Self {
            now: 1000,
            registered: false,
            register_fails: false,
            unregister_calls: 0,
            stiffness: Vec::new(),
            dispatched: Vec::new(),
            fail_read_on: None,
            reads: 0,
        }
    }
}

impl Hardware for MockHw {
    fn register_trigger(&mut self) -> Result<(), HardwareError> {
        if self.register_fails {
            return Err(HardwareError::Trigger("no timer available".to_string()));
        }
        self.registered = true;
        Ok(())
    }

    fn unregister_trigger(&mut self) {
        self.registered = false;
        self.unregister_calls += 1;
    }

    fn trigger_registered(&self) -> bool {
        self.registered
    }

    fn read_joint_sensors(&mut self) -> Result<JointVector, HardwareError> {
        let read = self.reads;
        self.reads += 1;
        if self.fail_read_on == Some(read) {
            return Err(HardwareError::SensorRead("bus timeout".to_string()));
        }
        Ok(JointVector::new())
    }

    fn dispatch_command(
        &mut self,
        joints: &JointVector,
        timestamp_ms: u64,
    ) -> Result<(), HardwareError> {
        self.dispatched.push((joints.clone(), timestamp_ms));
        Ok(())
    }

    fn now_ms(&self) -> u64 {
        self.now
    }

    fn set_actuator_stiffness(&mut self, level: f64) -> Result<(), HardwareError> {
        self.stiffness.push(level);
        Ok(())
    }
}

impl SimulatedTime for MockHw {
    fn advance_ms(&mut self, ms: u32) {
        self.now += ms as u64;
    }
}
