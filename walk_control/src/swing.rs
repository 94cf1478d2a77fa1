//! Swing-foot trajectory between lift-off and touchdown.
//!
//! Horizontal motion is linear in the progress fraction `θ`, running from
//! the touchdown x at `θ = 0` to the lift-off x at `θ = 1`. Height is a
//! parabola in x through `(x0, 0)`, `(xm, step_height)` and `(x1, 0)`.
//! Lateral position and yaw are those of the touchdown pose.

use walk_common::boundary::plan::SwingPhase;
use walk_common::types::{FootPose, Pose2};

/// Endpoints closer than this are treated as a step in place [m].
const DEGENERATE_SPAN: f64 = 1e-9;

/// Parabolic swing between two planar foot poses.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SwingTrajectory {
    /// Lift-off pose.
    p0: Pose2,
    /// Touchdown pose.
    p1: Pose2,
    step_height: f64,
    /// `z = a·x² + b·x + c`.
    a: f64,
    b: f64,
    c: f64,
    /// Step in place: height follows `4hθ(1−θ)` instead of the parabola in x.
    in_place: bool,
    /// Phase bookkeeping used to compute `θ`.
    intervals_total: u32,
    intervals_elapsed: u32,
}

impl SwingTrajectory {
    /// Trajectory between `previous` (lift-off) and `next` (touchdown).
    pub fn new(previous: Pose2, next: Pose2, step_height: f64) -> Self {
        let x0 = previous.x;
        let x1 = next.x;
        let mut traj = Self {
            p0: previous,
            p1: next,
            step_height,
            a: 0.0,
            b: 0.0,
            c: 0.0,
            in_place: (x1 - x0).abs() < DEGENERATE_SPAN,
            intervals_total: 1,
            intervals_elapsed: 0,
        };
        if !traj.in_place {
            let xm = (x0 + x1) / 2.0;
            let b_coef = -(x1 + x0);
            traj.a = step_height / (xm * xm - x0 * x0 + b_coef * (xm - x0));
            traj.b = traj.a * b_coef;
            traj.c = -traj.a * x0 * x0 - traj.b * x0;
        }
        traj
    }

    /// Trajectory for the plan's active single-support phase.
    pub fn from_phase(phase: &SwingPhase, step_height: f64) -> Self {
        let mut traj = Self::new(phase.previous, phase.next, step_height);
        traj.intervals_total = phase.intervals_total.max(1);
        traj.intervals_elapsed = phase.intervals_elapsed.min(traj.intervals_total);
        traj
    }

    /// Count one more completed preview interval of the same phase.
    #[inline]
    pub fn advance_interval(&mut self) {
        self.intervals_elapsed = (self.intervals_elapsed + 1).min(self.intervals_total);
    }

    /// Lift-off pose.
    #[inline]
    pub const fn previous(&self) -> Pose2 {
        self.p0
    }

    /// Touchdown pose.
    #[inline]
    pub const fn next(&self) -> Pose2 {
        self.p1
    }

    /// Parabola coefficients `(a, b, c)`.
    #[inline]
    pub const fn coefficients(&self) -> (f64, f64, f64) {
        (self.a, self.b, self.c)
    }

    /// Height of the parabola at `x` [m].
    #[inline]
    pub fn height_at_x(&self, x: f64) -> f64 {
        self.a * x * x + self.b * x + self.c
    }

    /// Progress fraction `k` ticks past the current tick.
    ///
    /// `ticks_into_interval` counts control ticks already elapsed in the
    /// executing preview interval.
    pub fn progress(&self, ticks_per_interval: u32, ticks_into_interval: u32, k: u32) -> f64 {
        let total = (self.intervals_total * ticks_per_interval.max(1)) as f64;
        let elapsed =
            (self.intervals_elapsed * ticks_per_interval + ticks_into_interval + k) as f64;
        (elapsed / total).clamp(0.0, 1.0)
    }

    /// Foot pose at progress `theta` in `[0, 1]`.
    pub fn pose_at(&self, theta: f64) -> FootPose {
        let theta = theta.clamp(0.0, 1.0);
        let x = (1.0 - theta) * self.p1.x + theta * self.p0.x;
        let z = if self.in_place {
            4.0 * self.step_height * theta * (1.0 - theta)
        } else {
            self.height_at_x(x)
        };
        FootPose {
            x,
            y: self.p1.y,
            z,
            yaw: self.p1.yaw,
        }
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
