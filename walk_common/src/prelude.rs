//! Prelude module for common re-exports.
//!
//! ```rust
//! use walk_common::prelude::*;
//! ```

// ─── Configuration ──────────────────────────────────────────────────
pub use crate::config::{
    ConfigError, ConfigLoader, FeedbackConfig, GaitConfig, LogLevel, SharedConfig,
    SolverWeights, TimingConfig, WalkConfig,
};

// ─── Types ──────────────────────────────────────────────────────────
pub use crate::types::{
    AxisState, Control, Foot, FootPose, JointVector, Pose2, ProcessState, SupportState,
};

// ─── Boundary ───────────────────────────────────────────────────────
pub use crate::boundary::hardware::Hardware;
pub use crate::boundary::ik::{IkEngine, IkTarget, SensedPosture};
pub use crate::boundary::plan::{
    FootConstraints, FootstepKind, FootstepPlan, FootstepSpec, PreviewWindow, ReformResult,
    SwingPhase, WindowStep,
};
pub use crate::boundary::solver::MpcSolver;

// ─── Errors ─────────────────────────────────────────────────────────
pub use crate::error::{HardwareError, IkError, StopReason, TickOutcome, WalkFault};

// ─── System Constants ───────────────────────────────────────────────
pub use crate::consts::{GRAVITY, MAX_JOINTS, MAX_LOOKAHEAD, MAX_PREVIEW_WINDOW};
