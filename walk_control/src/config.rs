//! Controller configuration file: walk parameters, footstep program and
//! simulated robot.
//!
//! ```toml
//! [timing]
//! control_period_ms = 10
//!
//! [[footsteps]]
//! dx = 0.0
//! dy = 0.05
//! ss_intervals = 0
//! total_intervals = 0
//! kind = "single_left"
//! ```
//!
//! Footsteps omitting `ss_intervals`, `total_intervals` or `constraints`
//! inherit them from the previous entry; omitting `kind` alternates single
//! support feet. An empty program walks straight using `[gait]`.

use std::path::Path;

use serde::Deserialize;
use walk_common::boundary::plan::{FootConstraints, FootstepKind, FootstepSpec};
use walk_common::config::{ConfigError, ConfigLoader, GaitConfig, WalkConfig};
use walk_common::types::Pose2;

use crate::sim::SimConfig;

/// Steps of the default straight walk.
pub const STRAIGHT_WALK_STEPS: usize = 5;

/// Intervals of the closing double support of the straight walk.
const FINAL_DS_INTERVALS: u32 = 30;

/// One `[[footsteps]]` entry.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct FootstepEntry {
    /// Displacement from the previous step, in its frame [m].
    pub dx: f64,
    pub dy: f64,
    /// [rad]
    #[serde(default)]
    pub dyaw: f64,
    pub ss_intervals: Option<u32>,
    pub total_intervals: Option<u32>,
    pub constraints: Option<FootConstraints>,
    pub kind: Option<FootstepKind>,
}

/// Raw file layout.
#[derive(Debug, Clone, Deserialize)]
struct ControlFile {
    #[serde(flatten)]
    walk: WalkConfig,
    #[serde(default)]
    footsteps: Vec<FootstepEntry>,
    #[serde(default)]
    simulation: SimConfig,
}

/// Complete validated configuration bundle, ready for runtime use.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub walk: WalkConfig,
    pub footsteps: Vec<FootstepSpec>,
    pub simulation: SimConfig,
}

/// Load and validate the controller configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<LoadedConfig, ConfigError> {
    let file = ControlFile::load(path)?;
    finish(file)
}

/// Load config from a TOML string (for testing).
pub fn load_config_from_str(toml_str: &str) -> Result<LoadedConfig, ConfigError> {
    let file: ControlFile =
        toml::from_str(toml_str).map_err(|e| ConfigError::ParseError(e.to_string()))?;
    finish(file)
}

fn finish(file: ControlFile) -> Result<LoadedConfig, ConfigError> {
    file.walk.validate()?;
    file.simulation.validate()?;
    let footsteps = if file.footsteps.is_empty() {
        straight_walk(&file.walk.gait, STRAIGHT_WALK_STEPS)
    } else {
        resolve_footsteps(&file.footsteps)?
    };
    Ok(LoadedConfig {
        walk: file.walk,
        footsteps,
        simulation: file.simulation,
    })
}

/// Resolve inherited fields and automatic kinds.
pub fn resolve_footsteps(entries: &[FootstepEntry]) -> Result<Vec<FootstepSpec>, ConfigError> {
    let mut ss = 0;
    let mut total = 0;
    let mut constraints = FootConstraints::default();
    let mut last_single: Option<FootstepKind> = None;
    let mut out = Vec::with_capacity(entries.len());

    for (i, e) in entries.iter().enumerate() {
        ss = e.ss_intervals.unwrap_or(ss);
        total = e.total_intervals.unwrap_or(total);
        constraints = e.constraints.unwrap_or(constraints);
        if ss > total {
            return Err(ConfigError::ValidationError(format!(
                "footsteps[{i}]: ss_intervals {ss} exceeds total_intervals {total}"
            )));
        }
        for (name, v) in [
            ("front", constraints.front),
            ("left", constraints.left),
            ("back", constraints.back),
            ("right", constraints.right),
        ] {
            if !v.is_finite() || v < 0.0 {
                return Err(ConfigError::ValidationError(format!(
                    "footsteps[{i}]: constraint {name} {v} must be finite and >= 0"
                )));
            }
        }
        if !(e.dx.is_finite() && e.dy.is_finite() && e.dyaw.is_finite()) {
            return Err(ConfigError::ValidationError(format!(
                "footsteps[{i}]: displacement must be finite"
            )));
        }

        let kind = match e.kind {
            Some(k) => k,
            None => match last_single {
                Some(FootstepKind::SingleLeft) => FootstepKind::SingleRight,
                Some(_) => FootstepKind::SingleLeft,
                None if e.dy < 0.0 => FootstepKind::SingleRight,
                None => FootstepKind::SingleLeft,
            },
        };
        if kind != FootstepKind::Double {
            last_single = Some(kind);
        }

        out.push(FootstepSpec {
            delta: Pose2::new(e.dx, e.dy, e.dyaw),
            ss_intervals: ss,
            total_intervals: total,
            constraints,
            kind,
        });
    }
    Ok(out)
}

/// Straight walk of `steps` alternating steps between two double supports.
///
/// Starts on the left foot, opens with two intervals of double support,
/// takes one step in place with the right foot, then `steps` steps of
/// `step_length`, and closes with a long double support so the preview
/// window can reach the last footstep.
pub fn straight_walk(gait: &GaitConfig, steps: usize) -> Vec<FootstepSpec> {
    let half = gait.step_width / 2.0;
    let base = FootConstraints::default();
    let wide_left = FootConstraints { left: 0.075, ..base };
    let wide_right = FootConstraints {
        right: 0.075,
        ..base
    };
    let step = |dx: f64, dy: f64, ss: u32, total: u32, c: FootConstraints, kind| FootstepSpec {
        delta: Pose2::new(dx, dy, 0.0),
        ss_intervals: ss,
        total_intervals: total,
        constraints: c,
        kind,
    };

    let mut out = Vec::with_capacity(steps + 5);
    out.push(step(0.0, half, 0, 0, base, FootstepKind::SingleLeft));
    out.push(step(0.0, -half, 2, 2, wide_left, FootstepKind::Double));
    out.push(step(0.0, -half, 2, 3, base, FootstepKind::SingleRight));
    let mut dy = gait.step_width;
    let mut kind = FootstepKind::SingleLeft;
    for _ in 0..steps {
        out.push(step(gait.step_length, dy, 2, 3, base, kind));
        dy = -dy;
        kind = match kind {
            FootstepKind::SingleLeft => FootstepKind::SingleRight,
            _ => FootstepKind::SingleLeft,
        };
    }
    let last_left = kind == FootstepKind::SingleRight;
    let (to_center, closing) = if last_left {
        (-half, FootstepKind::SingleRight)
    } else {
        (half, FootstepKind::SingleLeft)
    };
    out.push(step(
        0.0,
        to_center,
        FINAL_DS_INTERVALS,
        FINAL_DS_INTERVALS,
        wide_right,
        FootstepKind::Double,
    ));
    out.push(step(0.0, to_center, 0, 0, base, closing));
    out
}
