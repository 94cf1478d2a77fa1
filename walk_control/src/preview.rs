//! Preview/support state machine.
//!
//! Runs once per preview-interval expiry: asks the footstep plan for a new
//! window, tracks which foot supports the robot, applies drift correction on
//! support switches and rebuilds the swing trajectory.

use tracing::{debug, warn};
use walk_common::boundary::ik::SensedPosture;
use walk_common::boundary::plan::{FootstepPlan, PreviewWindow, ReformResult, SwingPhase};
use walk_common::types::{Foot, Pose2, ProcessState, SupportState};

use crate::clock::ControlClock;
use crate::swing::SwingTrajectory;

/// What a reform did to the support state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReformEvent {
    /// New window, same support.
    Continued,
    /// New window, support flipped to the contained state.
    Switched(SupportState),
    /// Plan signalled a switch without a completed phase; support and swing kept.
    SwitchSuppressed,
    /// Plan exhausted; nothing else was touched.
    Halt,
}

/// Support state and swing trajectory owned by the orchestrator.
#[derive(Debug, Clone)]
pub struct SupportMachine {
    support: SupportState,
    swing: Option<SwingTrajectory>,
    step_height: f64,
    drift_correction: bool,
    /// Whether the last honored reform switched support.
    last_switched: bool,
    /// Offset applied by the last drift correction [m].
    last_drift: [f64; 2],
}

impl SupportMachine {
    pub const fn new(initial: SupportState, step_height: f64, drift_correction: bool) -> Self {
        Self {
            support: initial,
            swing: None,
            step_height,
            drift_correction,
            last_switched: false,
            last_drift: [0.0, 0.0],
        }
    }

    /// Re-initialize in place for a new walk.
    pub fn reset(&mut self, initial: SupportState) {
        self.support = initial;
        self.swing = None;
        self.last_switched = false;
        self.last_drift = [0.0, 0.0];
    }

    #[inline]
    pub const fn support(&self) -> SupportState {
        self.support
    }

    /// Active swing trajectory, `None` in double support.
    #[inline]
    pub const fn swing(&self) -> Option<&SwingTrajectory> {
        self.swing.as_ref()
    }

    #[inline]
    pub const fn last_drift(&self) -> [f64; 2] {
        self.last_drift
    }

    /// Form a new preview window and update support bookkeeping.
    ///
    /// `sensed` is this tick's forward-kinematics posture, used for drift
    /// correction when support switches. The clock is reset unless the plan
    /// halts.
    pub fn reform<P: FootstepPlan>(
        &mut self,
        plan: &mut P,
        state: &ProcessState,
        window: &mut PreviewWindow,
        sensed: &SensedPosture,
        clock: &mut ControlClock,
    ) -> ReformEvent {
        let switch_confirmed = plan.is_support_switch_needed();
        let result = plan.form_preview_window(state, window);

        let event = match result {
            ReformResult::Halt => return ReformEvent::Halt,
            ReformResult::Continue => ReformEvent::Continued,
            ReformResult::SwitchSupport if self.last_switched && !switch_confirmed => {
                warn!(
                    support = ?self.support,
                    "Consecutive support switch without a completed phase, ignoring"
                );
                // Support is unchanged, so the swing keeps its endpoints.
                if let Some(traj) = self.swing.as_mut() {
                    traj.advance_interval();
                }
                self.last_switched = false;
                clock.reset();
                return ReformEvent::SwitchSuppressed;
            }
            ReformResult::SwitchSupport => {
                self.support = self.support.switched();
                if self.drift_correction {
                    self.correct_drift(plan, sensed);
                }
                debug!(support = ?self.support, drift = ?self.last_drift, "Support switched");
                ReformEvent::Switched(self.support)
            }
        };

        self.last_switched = matches!(event, ReformEvent::Switched(_));
        self.swing = self.swing_from(plan.swing_phase());
        clock.reset();
        event
    }

    /// Trajectory for `phase` if it swings the foot this machine lifts.
    fn swing_from(&self, phase: Option<SwingPhase>) -> Option<SwingTrajectory> {
        let swing_foot = self.support.swing_foot()?;
        let phase = phase?;
        if phase.foot != swing_foot {
            warn!(
                support = ?self.support,
                plan_swing = ?phase.foot,
                "Plan swings the support foot, keeping both feet planted"
            );
            return None;
        }
        Some(SwingTrajectory::from_phase(&phase, self.step_height))
    }

    /// Shift the remaining plan by where the landed foot actually is.
    fn correct_drift<P: FootstepPlan>(&mut self, plan: &mut P, sensed: &SensedPosture) {
        let landed = self.support.anchor_foot();
        let (left, right) = plan.feet_positions(0);
        let planned: Pose2 = match landed {
            Foot::Left => left,
            Foot::Right => right,
        };
        let actual = sensed.foot(landed);
        let dx = actual.x - planned.x;
        let dy = actual.y - planned.y;
        plan.correct_next_swing_position(dx, dy);
        self.last_drift = [dx, dy];
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
