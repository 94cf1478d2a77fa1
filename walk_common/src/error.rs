//! Fault taxonomy and per-tick outcome.
//!
//! Plan exhaustion is an expected termination (`StopReason::PlanExhausted`),
//! not an error. Every `WalkFault` is fatal: the controller disconnects the
//! periodic trigger and drops actuator stiffness to zero. None are retried.

use thiserror::Error;

/// Error types for hardware boundary operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HardwareError {
    /// Joint sensor read failed.
    #[error("joint sensor read failed: {0}")]
    SensorRead(String),

    /// Command dispatch failed.
    #[error("command dispatch failed: {0}")]
    Dispatch(String),

    /// Periodic trigger registration failed.
    #[error("periodic trigger registration failed: {0}")]
    Trigger(String),

    /// Stiffness command failed.
    #[error("stiffness command failed: {0}")]
    Stiffness(String),
}

/// Error types for the inverse kinematics engine.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum IkError {
    /// No joint configuration reaches the target.
    #[error("IK did not converge (residual {residual:.6} m)")]
    NonConvergence {
        /// Remaining position error [m].
        residual: f64,
    },
}

/// Fatal fault raised by the control cycle.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum WalkFault {
    /// IK engine could not reach the target of a lookahead step.
    #[error("IK non-convergence at lookahead step {step}")]
    IkNonConvergence {
        /// Lookahead step (1-based).
        step: u8,
    },

    /// A solved joint angle lies outside its bounds.
    #[error("joint {joint} out of bounds at lookahead step {step} (angle {angle:.4} rad)")]
    JointBoundViolation {
        /// Index of the violated joint.
        joint: usize,
        /// Lookahead step (1-based).
        step: u8,
        /// Offending angle [rad].
        angle: f64,
    },

    /// Sensor read, dispatch or trigger failure.
    #[error("hardware I/O failure: {0}")]
    HardwareIo(#[from] HardwareError),
}

/// Why a walk ended without a fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// No more planned footsteps fit the preview window.
    PlanExhausted,
    /// A remote stop request was honored at a tick boundary.
    StopRequested,
}

/// Outcome of one control tick.
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// Commands dispatched, walking continues.
    Continue,
    /// Walk ended normally; nothing was dispatched on this tick.
    GracefulStop(StopReason),
    /// Walk halted by a fatal fault; nothing was dispatched on this tick.
    FatalFault(WalkFault),
}

impl TickOutcome {
    /// Returns true if the walk is over (stopped or faulted).
    #[inline]
    pub const fn is_terminal(&self) -> bool {
        !matches!(self, Self::Continue)
    }
}
