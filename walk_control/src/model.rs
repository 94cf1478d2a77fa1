//! Discrete double-integrator process model driven by jerk.
//!
//! Exact zero-order-hold update over one control period `T`:
//!
//! ```text
//! p' = p + v·T + a·T²/2 + u·(T³/6 − h·T)
//! v' = v + a·T + u·T²/2
//! a' = a + u·T
//! ```
//!
//! `h = com_height / g` couples ZMP and CoM (table-cart model) and enters
//! only the position row.

use walk_common::consts::GRAVITY;
use walk_common::types::{AxisState, Control, ProcessState};

/// Fixed propagation coefficients derived from the control period and CoM height.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProcessModel {
    /// Sample time [s].
    t: f64,
    /// CoM height over gravity [s²].
    h_com: f64,
    /// Position gain on jerk: T³/6 − h·T.
    b_position: f64,
    /// Velocity gain on jerk: T²/2.
    b_velocity: f64,
}

impl ProcessModel {
    /// Build the model for a control period [ms] and CoM height [m].
    pub fn new(control_period_ms: u32, com_height: f64) -> Self {
        let t = control_period_ms as f64 / 1000.0;
        let h_com = com_height / GRAVITY;
        Self {
            t,
            h_com,
            b_position: t * t * t / 6.0 - h_com * t,
            b_velocity: t * t / 2.0,
        }
    }

    /// Sample time [s].
    #[inline]
    pub const fn sample_time(&self) -> f64 {
        self.t
    }

    /// CoM height over gravity [s²].
    #[inline]
    pub const fn h_com(&self) -> f64 {
        self.h_com
    }

    /// Advance one axis by one control period under jerk `u`.
    #[inline]
    pub fn advance_axis(&self, s: &AxisState, u: f64) -> AxisState {
        let t = self.t;
        AxisState {
            position: s.position
                + s.velocity * t
                + s.acceleration * t * t / 2.0
                + u * self.b_position,
            velocity: s.velocity + s.acceleration * t + u * self.b_velocity,
            acceleration: s.acceleration + u * t,
        }
    }

    /// Advance both axes with the previously applied control.
    #[inline]
    pub fn advance(&self, state: &ProcessState, control: &Control) -> ProcessState {
        ProcessState {
            x: self.advance_axis(&state.x, control.x),
            y: self.advance_axis(&state.y, control.y),
        }
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
