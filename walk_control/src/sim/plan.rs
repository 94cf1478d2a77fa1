//! Footstep queue expanded into preview intervals.
//!
//! Every footstep is placed relative to the previous one. A single-support
//! step spends `ss_intervals` preview intervals on its foot while the other
//! foot swings to its next placement, then the remaining intervals in double
//! support with the swing foot landed. A double-support step keeps the ZMP
//! on its own pose for all its intervals.

use tracing::debug;
use walk_common::boundary::plan::{
    FootConstraints, FootstepKind, FootstepPlan, FootstepSpec, PreviewWindow, ReformResult,
    SwingPhase, WindowStep,
};
use walk_common::types::{Foot, Pose2, ProcessState, SupportState};

/// A footstep in world coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Placed {
    pose: Pose2,
    ss_intervals: u32,
    total_intervals: u32,
    constraints: FootConstraints,
    kind: FootstepKind,
}

/// Position of the executing preview interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Cursor {
    step: usize,
    interval: u32,
}

/// Footstep plan over a queue of placed steps.
#[derive(Debug, Clone)]
pub struct StepQueuePlan {
    steps: Vec<Placed>,
    window_size: usize,
    preview_period_ms: u32,
    /// Executing interval, `None` before the first reform.
    cursor: Option<Cursor>,
    /// Foot the plan currently stands on, `None` in double support.
    support_foot: Option<Foot>,
}

impl StepQueuePlan {
    /// Empty plan. `initial` is the support the robot starts in.
    pub fn new(window_size: usize, preview_period_ms: u32, initial: SupportState) -> Self {
        let support_foot = match initial {
            SupportState::SingleLeft => Some(Foot::Left),
            SupportState::SingleRight => Some(Foot::Right),
            SupportState::Double => None,
        };
        Self {
            steps: Vec::new(),
            window_size,
            preview_period_ms,
            cursor: None,
            support_foot,
        }
    }

    /// Queued footsteps.
    #[inline]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// World pose of footstep `index`.
    pub fn step_pose(&self, index: usize) -> Option<Pose2> {
        self.steps.get(index).map(|s| s.pose)
    }

    /// Intervals left from the executing one (inclusive) to the end.
    pub fn remaining_intervals(&self) -> u32 {
        let Some(c) = self.cursor.or_else(|| self.first_cursor()) else {
            return 0;
        };
        let mut n = 0;
        for (i, s) in self.steps.iter().enumerate().skip(c.step) {
            n += if i == c.step {
                s.total_intervals.saturating_sub(c.interval)
            } else {
                s.total_intervals
            };
        }
        n
    }

    fn first_cursor(&self) -> Option<Cursor> {
        self.cursor_from(0)
    }

    /// First interval of the first step at or after `step` that has any.
    fn cursor_from(&self, step: usize) -> Option<Cursor> {
        self.steps
            .iter()
            .enumerate()
            .skip(step)
            .find(|(_, s)| s.total_intervals > 0)
            .map(|(i, _)| Cursor {
                step: i,
                interval: 0,
            })
    }

    fn next_cursor(&self, c: Cursor) -> Option<Cursor> {
        let step = self.steps.get(c.step)?;
        if c.interval + 1 < step.total_intervals {
            Some(Cursor {
                step: c.step,
                interval: c.interval + 1,
            })
        } else {
            self.cursor_from(c.step + 1)
        }
    }

    /// Cursor `n` intervals after `c`, stopping at the last interval.
    fn advance_by(&self, mut c: Cursor, n: u32) -> Cursor {
        for _ in 0..n {
            match self.next_cursor(c) {
                Some(next) => c = next,
                None => break,
            }
        }
        c
    }

    /// Latest step of `foot` at or before `step`.
    fn last_of(&self, foot: Foot, step: usize) -> Option<&Placed> {
        self.steps
            .iter()
            .take(step + 1)
            .rev()
            .find(|s| s.kind.foot() == Some(foot))
    }

    /// Earliest step of `foot` after `step`.
    fn next_of(&self, foot: Foot, step: usize) -> Option<&Placed> {
        self.steps
            .iter()
            .skip(step + 1)
            .find(|s| s.kind.foot() == Some(foot))
    }

    /// Whether `c` is in the single-support part of its step.
    fn in_single_support(&self, c: Cursor) -> Option<Foot> {
        let s = self.steps.get(c.step)?;
        match s.kind.foot() {
            Some(f) if c.interval < s.ss_intervals => Some(f),
            _ => None,
        }
    }

    /// Planned pose of `foot` during interval `c`.
    fn foot_pose(&self, c: Cursor, foot: Foot) -> Pose2 {
        if let Some(step) = self.steps.get(c.step) {
            // Swing already landed in the double-support tail of the step.
            if step.kind.foot() == Some(foot.other()) && c.interval >= step.ss_intervals {
                if let Some(next) = self.next_of(foot, c.step) {
                    return next.pose;
                }
            }
        }
        self.last_of(foot, c.step)
            .or_else(|| self.next_of(foot, c.step))
            .map(|s| s.pose)
            .unwrap_or_default()
    }

    fn window_step(&self, c: Cursor) -> WindowStep {
        let Some(s) = self.steps.get(c.step) else {
            return WindowStep::default();
        };
        let zmp = match s.kind {
            FootstepKind::Double => s.pose,
            _ if c.interval < s.ss_intervals => s.pose,
            _ => match self.steps.get(c.step + 1) {
                Some(n) => Pose2::new(
                    (s.pose.x + n.pose.x) / 2.0,
                    (s.pose.y + n.pose.y) / 2.0,
                    s.pose.yaw,
                ),
                None => s.pose,
            },
        };
        WindowStep {
            zmp_ref: [zmp.x, zmp.y],
            duration_ms: self.preview_period_ms,
            angle: s.pose.yaw,
            lower: [-s.constraints.back, -s.constraints.right],
            upper: [s.constraints.front, s.constraints.left],
            feasible: [zmp.x, zmp.y],
        }
    }

    /// Whether entering `c` flips support.
    fn switches_at(&self, c: Cursor) -> bool {
        c.interval == 0
            && matches!(self.in_single_support(c), Some(f) if Some(f) != self.support_foot)
    }
}

impl FootstepPlan for StepQueuePlan {
    fn add_footstep(&mut self, step: FootstepSpec) {
        let base = self.steps.last().map(|s| s.pose).unwrap_or_default();
        self.steps.push(Placed {
            pose: base.compose(&step.delta),
            ss_intervals: step.ss_intervals.min(step.total_intervals),
            total_intervals: step.total_intervals,
            constraints: step.constraints,
            kind: step.kind,
        });
    }

    fn form_preview_window(
        &mut self,
        _state: &ProcessState,
        window: &mut PreviewWindow,
    ) -> ReformResult {
        let next = match self.cursor {
            None => self.first_cursor(),
            Some(c) => self.next_cursor(c),
        };
        let Some(c) = next else {
            return ReformResult::Halt;
        };
        self.cursor = Some(c);
        if (self.remaining_intervals() as usize) < self.window_size {
            debug!(remaining = self.remaining_intervals(), "Footstep plan exhausted");
            return ReformResult::Halt;
        }

        window.clear();
        let mut w = c;
        for _ in 0..self.window_size {
            if !window.push(self.window_step(w)) {
                break;
            }
            w = self.advance_by(w, 1);
        }

        if self.switches_at(c) {
            self.support_foot = self.in_single_support(c);
            ReformResult::SwitchSupport
        } else {
            ReformResult::Continue
        }
    }

    fn feet_positions(&self, offset_ms: u32) -> (Pose2, Pose2) {
        let Some(c) = self.cursor.or_else(|| self.first_cursor()) else {
            let left = self.last_of(Foot::Left, self.steps.len()).map(|s| s.pose);
            let right = self.last_of(Foot::Right, self.steps.len()).map(|s| s.pose);
            return (left.unwrap_or_default(), right.unwrap_or_default());
        };
        let c = self.advance_by(c, offset_ms / self.preview_period_ms.max(1));
        (self.foot_pose(c, Foot::Left), self.foot_pose(c, Foot::Right))
    }

    fn swing_phase(&self) -> Option<SwingPhase> {
        let c = self.cursor?;
        let support = self.in_single_support(c)?;
        let swing = support.other();
        let next = self.next_of(swing, c.step)?.pose;
        let previous = self
            .last_of(swing, c.step)
            .map(|s| s.pose)
            .unwrap_or(next);
        let step = self.steps.get(c.step)?;
        Some(SwingPhase {
            foot: swing,
            previous,
            next,
            intervals_total: step.ss_intervals,
            intervals_elapsed: c.interval,
        })
    }

    fn is_support_switch_needed(&self) -> bool {
        let next = match self.cursor {
            None => self.first_cursor(),
            Some(c) => self.next_cursor(c),
        };
        next.is_some_and(|c| self.switches_at(c))
    }

    fn correct_next_swing_position(&mut self, dx: f64, dy: f64) {
        let from = self.cursor.map(|c| c.step).unwrap_or(0);
        for s in self.steps.iter_mut().skip(from) {
            s.pose.x += dx;
            s.pose.y += dy;
        }
    }
}
