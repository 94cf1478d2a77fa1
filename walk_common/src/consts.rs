//! System-wide constants for the walking controller.
//!
//! Single source of truth for capacities, physical constants, default
//! parameters and their validation bounds.

use static_assertions::const_assert;

// ─── Capacities ─────────────────────────────────────────────────────

/// Maximum number of actuated joints in a command vector.
pub const MAX_JOINTS: usize = 32;

/// Maximum preview window length [intervals].
pub const MAX_PREVIEW_WINDOW: usize = 64;

/// Maximum number of lookahead commands dispatched per tick.
pub const MAX_LOOKAHEAD: usize = 4;

const_assert!(MAX_LOOKAHEAD >= 1);
const_assert!(MAX_PREVIEW_WINDOW > MAX_LOOKAHEAD);

// ─── Physics ────────────────────────────────────────────────────────

/// Gravitational acceleration [m/s²].
pub const GRAVITY: f64 = 9.81;

// ─── Timing ─────────────────────────────────────────────────────────

/// Default control period [ms].
pub const CONTROL_PERIOD_MS_DEFAULT: u32 = 10;
pub const CONTROL_PERIOD_MS_MIN: u32 = 1;
pub const CONTROL_PERIOD_MS_MAX: u32 = 100;

/// Default preview sampling period [ms].
pub const PREVIEW_PERIOD_MS_DEFAULT: u32 = 100;
pub const PREVIEW_PERIOD_MS_MAX: u32 = 1000;

/// Default preview window size [intervals].
pub const PREVIEW_WINDOW_DEFAULT: usize = 15;

/// Default lookahead: one tick of command latency plus the current tick.
pub const LOOKAHEAD_STEPS_DEFAULT: usize = 2;

/// Default per-tick loop-time budget [µs].
pub const LOOP_BUDGET_US_DEFAULT: u64 = 8_000;

// ─── Solver ─────────────────────────────────────────────────────────

pub const SOLVER_ALPHA_DEFAULT: f64 = 300.0;
pub const SOLVER_BETA_DEFAULT: f64 = 800.0;
pub const SOLVER_GAMMA_DEFAULT: f64 = 1.0;
pub const SOLVER_REGULARIZATION_DEFAULT: f64 = 0.01;
pub const SOLVER_TOLERANCE_DEFAULT: f64 = 1e-7;

// ─── Feedback ───────────────────────────────────────────────────────

/// Default CoM feedback gain (dimensionless, 0 = open loop).
pub const FEEDBACK_GAIN_DEFAULT: f64 = 0.5;
pub const FEEDBACK_GAIN_MAX: f64 = 1.0;

/// Default CoM feedback deadband [m].
pub const FEEDBACK_DEADBAND_DEFAULT: f64 = 0.015;
pub const FEEDBACK_DEADBAND_MAX: f64 = 0.1;

// ─── Gait ───────────────────────────────────────────────────────────

/// Default step length [m].
pub const STEP_LENGTH_DEFAULT: f64 = 0.035;
/// Default lateral distance between feet [m].
pub const STEP_WIDTH_DEFAULT: f64 = 0.1;
/// Default swing apex height [m].
pub const STEP_HEIGHT_DEFAULT: f64 = 0.0135;
pub const STEP_HEIGHT_MAX: f64 = 0.1;

/// Default constant CoM height [m].
pub const COM_HEIGHT_DEFAULT: f64 = 0.26;
pub const COM_HEIGHT_MIN: f64 = 0.05;
pub const COM_HEIGHT_MAX: f64 = 2.0;

/// Actuator stiffness while walking (0 = limp, 1 = full).
pub const WALK_STIFFNESS_DEFAULT: f64 = 1.0;

/// Default configuration file path for the control binary.
pub const DEFAULT_CONFIG_PATH: &str = "config/walk.toml";
