//! Configuration loading traits and the walking configuration record.
//!
//! All parameters are supplied once at walk start and never re-read
//! mid-walk. Numeric fields are bounds-checked by [`WalkConfig::validate`];
//! optional fields use `#[serde(default)]`.
//!
//! # TOML Example
//!
//! ```toml
//! [shared]
//! service_name = "walk-sim-01"
//!
//! [timing]
//! control_period_ms = 10
//! preview_period_ms = 100
//!
//! [feedback]
//! gain = 0.5
//! deadband = 0.015
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::consts::*;
use crate::types::SupportState;

/// Error type for configuration loading operations.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// Configuration file not found at specified path.
    #[error("Configuration file not found")]
    FileNotFound,

    /// TOML parsing failed.
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    /// Semantic validation failed.
    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

/// Log level for application logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Directive string understood by `tracing_subscriber::EnvFilter`.
    pub const fn as_directive(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

/// Common fields identifying the running controller instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SharedConfig {
    /// Logging verbosity level.
    #[serde(default)]
    pub log_level: LogLevel,

    /// Controller instance identifier.
    pub service_name: String,
}

impl Default for SharedConfig {
    fn default() -> Self {
        Self {
            log_level: LogLevel::Info,
            service_name: "walk_control".to_string(),
        }
    }
}

impl SharedConfig {
    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.service_name.is_empty() {
            return Err(ConfigError::ValidationError(
                "service_name cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Trait for loading configuration from TOML files.
///
/// - Returns `ConfigError::FileNotFound` if the file does not exist
/// - Returns `ConfigError::ParseError` if TOML syntax is invalid
pub trait ConfigLoader: Sized + serde::de::DeserializeOwned {
    /// Load configuration from a TOML file.
    fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::FileNotFound
            } else {
                ConfigError::ParseError(e.to_string())
            }
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }
}

impl<T: serde::de::DeserializeOwned> ConfigLoader for T {}

// ─── Walk Config ────────────────────────────────────────────────────

/// Complete walking controller configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WalkConfig {
    #[serde(default)]
    pub shared: SharedConfig,
    #[serde(default)]
    pub timing: TimingConfig,
    #[serde(default)]
    pub solver: SolverWeights,
    #[serde(default)]
    pub feedback: FeedbackConfig,
    #[serde(default)]
    pub gait: GaitConfig,
}

impl WalkConfig {
    /// Validate all sections.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.shared.validate()?;
        self.timing.validate()?;
        self.solver.validate()?;
        self.feedback.validate()?;
        self.gait.validate()?;
        Ok(())
    }
}

fn invalid(msg: String) -> ConfigError {
    ConfigError::ValidationError(msg)
}

/// Sampling periods and per-tick budget.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TimingConfig {
    /// Control tick period [ms].
    #[serde(default = "default_control_period")]
    pub control_period_ms: u32,

    /// Preview sampling period [ms]. Must be a multiple of the control period.
    #[serde(default = "default_preview_period")]
    pub preview_period_ms: u32,

    /// Preview window length [intervals].
    #[serde(default = "default_window")]
    pub preview_window_size: usize,

    /// Loop-time budget for one tick [µs]. Overruns are logged only.
    #[serde(default = "default_loop_budget")]
    pub loop_budget_us: u64,

    /// Commands dispatched per tick: hardware latency in ticks + 1.
    #[serde(default = "default_lookahead")]
    pub lookahead_steps: usize,
}

fn default_control_period() -> u32 {
    CONTROL_PERIOD_MS_DEFAULT
}
fn default_preview_period() -> u32 {
    PREVIEW_PERIOD_MS_DEFAULT
}
fn default_window() -> usize {
    PREVIEW_WINDOW_DEFAULT
}
fn default_loop_budget() -> u64 {
    LOOP_BUDGET_US_DEFAULT
}
fn default_lookahead() -> usize {
    LOOKAHEAD_STEPS_DEFAULT
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            control_period_ms: CONTROL_PERIOD_MS_DEFAULT,
            preview_period_ms: PREVIEW_PERIOD_MS_DEFAULT,
            preview_window_size: PREVIEW_WINDOW_DEFAULT,
            loop_budget_us: LOOP_BUDGET_US_DEFAULT,
            lookahead_steps: LOOKAHEAD_STEPS_DEFAULT,
        }
    }
}

impl TimingConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.control_period_ms < CONTROL_PERIOD_MS_MIN
            || self.control_period_ms > CONTROL_PERIOD_MS_MAX
        {
            return Err(invalid(format!(
                "control_period_ms {} out of range [{}, {}]",
                self.control_period_ms, CONTROL_PERIOD_MS_MIN, CONTROL_PERIOD_MS_MAX
            )));
        }
        if self.preview_period_ms < self.control_period_ms
            || self.preview_period_ms > PREVIEW_PERIOD_MS_MAX
        {
            return Err(invalid(format!(
                "preview_period_ms {} out of range [{}, {}]",
                self.preview_period_ms, self.control_period_ms, PREVIEW_PERIOD_MS_MAX
            )));
        }
        if self.preview_period_ms % self.control_period_ms != 0 {
            return Err(invalid(format!(
                "preview_period_ms {} is not a multiple of control_period_ms {}",
                self.preview_period_ms, self.control_period_ms
            )));
        }
        if self.lookahead_steps == 0 || self.lookahead_steps > MAX_LOOKAHEAD {
            return Err(invalid(format!(
                "lookahead_steps {} out of range [1, {}]",
                self.lookahead_steps, MAX_LOOKAHEAD
            )));
        }
        // Lookahead slots plus the remaining-time slot.
        if self.preview_window_size <= self.lookahead_steps
            || self.preview_window_size > MAX_PREVIEW_WINDOW
        {
            return Err(invalid(format!(
                "preview_window_size {} out of range [{}, {}]",
                self.preview_window_size,
                self.lookahead_steps + 1,
                MAX_PREVIEW_WINDOW
            )));
        }
        let period_us = self.control_period_ms as u64 * 1000;
        if self.loop_budget_us == 0 || self.loop_budget_us > period_us {
            return Err(invalid(format!(
                "loop_budget_us {} out of range [1, {}]",
                self.loop_budget_us, period_us
            )));
        }
        Ok(())
    }

    /// Control ticks per preview interval.
    #[inline]
    pub const fn ticks_per_interval(&self) -> u32 {
        self.preview_period_ms / self.control_period_ms
    }
}

/// MPC solver weights.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SolverWeights {
    /// Velocity penalty.
    #[serde(default = "default_alpha")]
    pub alpha: f64,
    /// ZMP tracking penalty.
    #[serde(default = "default_beta")]
    pub beta: f64,
    /// Jerk penalty.
    #[serde(default = "default_gamma")]
    pub gamma: f64,
    #[serde(default = "default_regularization")]
    pub regularization: f64,
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,
}

fn default_alpha() -> f64 {
    SOLVER_ALPHA_DEFAULT
}
fn default_beta() -> f64 {
    SOLVER_BETA_DEFAULT
}
fn default_gamma() -> f64 {
    SOLVER_GAMMA_DEFAULT
}
fn default_regularization() -> f64 {
    SOLVER_REGULARIZATION_DEFAULT
}
fn default_tolerance() -> f64 {
    SOLVER_TOLERANCE_DEFAULT
}

impl Default for SolverWeights {
    fn default() -> Self {
        Self {
            alpha: SOLVER_ALPHA_DEFAULT,
            beta: SOLVER_BETA_DEFAULT,
            gamma: SOLVER_GAMMA_DEFAULT,
            regularization: SOLVER_REGULARIZATION_DEFAULT,
            tolerance: SOLVER_TOLERANCE_DEFAULT,
        }
    }
}

impl SolverWeights {
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, v) in [
            ("alpha", self.alpha),
            ("beta", self.beta),
            ("gamma", self.gamma),
        ] {
            if !v.is_finite() || v < 0.0 {
                return Err(invalid(format!("solver.{name} {v} must be finite and >= 0")));
            }
        }
        if !self.regularization.is_finite() || self.regularization <= 0.0 {
            return Err(invalid(format!(
                "solver.regularization {} must be > 0",
                self.regularization
            )));
        }
        if !self.tolerance.is_finite() || self.tolerance <= 0.0 || self.tolerance >= 1.0 {
            return Err(invalid(format!(
                "solver.tolerance {} out of range (0, 1)",
                self.tolerance
            )));
        }
        Ok(())
    }
}

/// Sensor feedback on the CoM estimate.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FeedbackConfig {
    /// Fraction of the excess error removed per tick (0 = open loop).
    #[serde(default = "default_gain")]
    pub gain: f64,
    /// Error magnitude ignored per tick [m].
    #[serde(default = "default_deadband")]
    pub deadband: f64,
    /// Re-anchor the next swing target on the sensed foot at support switch.
    #[serde(default = "default_drift_correction")]
    pub drift_correction: bool,
}

fn default_gain() -> f64 {
    FEEDBACK_GAIN_DEFAULT
}
fn default_deadband() -> f64 {
    FEEDBACK_DEADBAND_DEFAULT
}
fn default_drift_correction() -> bool {
    true
}

impl Default for FeedbackConfig {
    fn default() -> Self {
        Self {
            gain: FEEDBACK_GAIN_DEFAULT,
            deadband: FEEDBACK_DEADBAND_DEFAULT,
            drift_correction: true,
        }
    }
}

impl FeedbackConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=FEEDBACK_GAIN_MAX).contains(&self.gain) {
            return Err(invalid(format!(
                "feedback.gain {} out of range [0, {}]",
                self.gain, FEEDBACK_GAIN_MAX
            )));
        }
        if !(0.0..=FEEDBACK_DEADBAND_MAX).contains(&self.deadband) {
            return Err(invalid(format!(
                "feedback.deadband {} out of range [0, {}]",
                self.deadband, FEEDBACK_DEADBAND_MAX
            )));
        }
        Ok(())
    }

    /// Open-loop configuration: no CoM feedback, no drift correction.
    pub const fn open_loop() -> Self {
        Self {
            gain: 0.0,
            deadband: 0.0,
            drift_correction: false,
        }
    }
}

/// Step geometry and body constants.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GaitConfig {
    /// Nominal forward step [m].
    #[serde(default = "default_step_length")]
    pub step_length: f64,
    /// Nominal lateral distance between feet [m].
    #[serde(default = "default_step_width")]
    pub step_width: f64,
    /// Swing apex height [m].
    #[serde(default = "default_step_height")]
    pub step_height: f64,
    /// Constant CoM height [m].
    #[serde(default = "default_com_height")]
    pub com_height: f64,
    /// Support state at walk start.
    #[serde(default)]
    pub initial_support: SupportState,
    /// Actuator stiffness while walking [0, 1].
    #[serde(default = "default_stiffness")]
    pub walk_stiffness: f64,
}

fn default_step_length() -> f64 {
    STEP_LENGTH_DEFAULT
}
fn default_step_width() -> f64 {
    STEP_WIDTH_DEFAULT
}
fn default_step_height() -> f64 {
    STEP_HEIGHT_DEFAULT
}
fn default_com_height() -> f64 {
    COM_HEIGHT_DEFAULT
}
fn default_stiffness() -> f64 {
    WALK_STIFFNESS_DEFAULT
}

impl Default for GaitConfig {
    fn default() -> Self {
        Self {
            step_length: STEP_LENGTH_DEFAULT,
            step_width: STEP_WIDTH_DEFAULT,
            step_height: STEP_HEIGHT_DEFAULT,
            com_height: COM_HEIGHT_DEFAULT,
            initial_support: SupportState::default(),
            walk_stiffness: WALK_STIFFNESS_DEFAULT,
        }
    }
}

impl GaitConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.step_length.abs()) {
            return Err(invalid(format!(
                "gait.step_length {} out of range [-1, 1]",
                self.step_length
            )));
        }
        if !(0.0..=1.0).contains(&self.step_width) {
            return Err(invalid(format!(
                "gait.step_width {} out of range [0, 1]",
                self.step_width
            )));
        }
        if !(0.0..=STEP_HEIGHT_MAX).contains(&self.step_height) {
            return Err(invalid(format!(
                "gait.step_height {} out of range [0, {}]",
                self.step_height, STEP_HEIGHT_MAX
            )));
        }
        if !(COM_HEIGHT_MIN..=COM_HEIGHT_MAX).contains(&self.com_height) {
            return Err(invalid(format!(
                "gait.com_height {} out of range [{}, {}]",
                self.com_height, COM_HEIGHT_MIN, COM_HEIGHT_MAX
            )));
        }
        if !(0.0..=1.0).contains(&self.walk_stiffness) || self.walk_stiffness == 0.0 {
            return Err(invalid(format!(
                "gait.walk_stiffness {} out of range (0, 1]",
                self.walk_stiffness
            )));
        }
        Ok(())
    }
}
