//! Footstep plan interface and the preview window it fills.

use serde::{Deserialize, Serialize};

use crate::consts::MAX_PREVIEW_WINDOW;
use crate::types::{Foot, Pose2, ProcessState};

/// Support type of a queued footstep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FootstepKind {
    /// Single support on the left foot placed at this step.
    SingleLeft,
    /// Single support on the right foot placed at this step.
    SingleRight,
    /// Double support centered at this step.
    Double,
}

impl FootstepKind {
    /// Foot placed by this step, `None` for double support.
    #[inline]
    pub const fn foot(self) -> Option<Foot> {
        match self {
            Self::SingleLeft => Some(Foot::Left),
            Self::SingleRight => Some(Foot::Right),
            Self::Double => None,
        }
    }
}

/// ZMP support rectangle around a footstep, in the step's frame [m].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FootConstraints {
    pub front: f64,
    pub left: f64,
    pub back: f64,
    pub right: f64,
}

impl Default for FootConstraints {
    fn default() -> Self {
        Self {
            front: 0.09,
            left: 0.025,
            back: 0.03,
            right: 0.025,
        }
    }
}

/// One footstep to append to a plan.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FootstepSpec {
    /// Displacement relative to the previous step, in its frame.
    pub delta: Pose2,
    /// Preview intervals spent in single support on this step.
    pub ss_intervals: u32,
    /// Total preview intervals of this step (single + double support).
    pub total_intervals: u32,
    pub constraints: FootConstraints,
    pub kind: FootstepKind,
}

/// Result of a preview window reform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReformResult {
    /// Window advanced, no structural change.
    Continue,
    /// Window advanced into single support on the other foot.
    SwitchSupport,
    /// Not enough planned footsteps to fill a window.
    Halt,
}

/// One interval of the preview window.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct WindowStep {
    /// Reference ZMP [m].
    pub zmp_ref: [f64; 2],
    /// Interval duration [ms].
    pub duration_ms: u32,
    /// Orientation of the support rectangle [rad].
    pub angle: f64,
    /// ZMP lower bounds relative to the reference, in the rectangle frame [m].
    pub lower: [f64; 2],
    /// ZMP upper bounds relative to the reference, in the rectangle frame [m].
    pub upper: [f64; 2],
    /// Feasible ZMP used to seed the solver [m].
    pub feasible: [f64; 2],
}

/// Preview window filled by the plan on every reform.
#[derive(Debug, Clone, Default)]
pub struct PreviewWindow {
    steps: heapless::Vec<WindowStep, MAX_PREVIEW_WINDOW>,
}

impl PreviewWindow {
    pub const fn new() -> Self {
        Self {
            steps: heapless::Vec::new(),
        }
    }

    #[inline]
    pub fn clear(&mut self) {
        self.steps.clear();
    }

    /// Append an interval. Returns false when the window is full.
    #[inline]
    pub fn push(&mut self, step: WindowStep) -> bool {
        self.steps.push(step).is_ok()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    #[inline]
    pub fn steps(&self) -> &[WindowStep] {
        &self.steps
    }

    /// Override the duration of interval `index`; out-of-range is ignored.
    #[inline]
    pub fn set_duration(&mut self, index: usize, duration_ms: u32) {
        if let Some(step) = self.steps.get_mut(index) {
            step.duration_ms = duration_ms;
        }
    }
}

/// Bookkeeping of the active single-support phase.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SwingPhase {
    /// Foot in the air during this phase.
    pub foot: Foot,
    /// Swing foot pose at lift-off.
    pub previous: Pose2,
    /// Swing foot pose at touchdown.
    pub next: Pose2,
    /// Preview intervals in this single-support phase.
    pub intervals_total: u32,
    /// Preview intervals already completed before the executing one.
    pub intervals_elapsed: u32,
}

/// Queued footsteps and the preview windows derived from them.
pub trait FootstepPlan {
    /// Append a footstep to the queue.
    fn add_footstep(&mut self, step: FootstepSpec);

    /// Advance by one preview interval and fill `window`.
    ///
    /// Called exactly once per preview interval expiry.
    fn form_preview_window(
        &mut self,
        state: &ProcessState,
        window: &mut PreviewWindow,
    ) -> ReformResult;

    /// Planned (left, right) foot poses `offset_ms` after the start of the
    /// executing preview interval. A swinging foot is reported at lift-off.
    fn feet_positions(&self, offset_ms: u32) -> (Pose2, Pose2);

    /// Active single-support phase, `None` in double support.
    fn swing_phase(&self) -> Option<SwingPhase>;

    /// Whether the next reform enters a new single-support phase.
    fn is_support_switch_needed(&self) -> bool;

    /// Shift the not-yet-landed footsteps by a sensed offset [m].
    fn correct_next_swing_position(&mut self, dx: f64, dy: f64);
}
