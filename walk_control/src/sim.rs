//! Simulation backend for every collaborator of the controller.
//!
//! Stand-ins only: the robot is an ideal position-servoed biped with planar
//! legs, the solver ignores support bounds.

pub mod hardware;
pub mod ik;
pub mod plan;
pub mod solver;

use serde::{Deserialize, Serialize};
use walk_common::boundary::ik::{IkEngine, IkTarget};
use walk_common::boundary::plan::FootstepPlan;
use walk_common::config::ConfigError;
use walk_common::error::IkError;

pub use hardware::{SimHardware, SimulatedTime};
pub use ik::{LegGeometry, LegLimits, PlanarLegIk};
pub use plan::StepQueuePlan;
pub use solver::ZmpTrackingSolver;

use crate::config::LoadedConfig;
use crate::cycle::WalkController;

/// Controller wired to the simulation backend.
pub type SimController = WalkController<StepQueuePlan, ZmpTrackingSolver, PlanarLegIk, SimHardware>;

/// `[simulation]` section.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub geometry: LegGeometry,
    pub limits: LegLimits,
}

impl SimConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let g = &self.geometry;
        for (name, v) in [
            ("thigh", g.thigh),
            ("shin", g.shin),
            ("foot_height", g.foot_height),
            ("hip_width", g.hip_width),
        ] {
            if !v.is_finite() || v <= 0.0 {
                return Err(ConfigError::ValidationError(format!(
                    "simulation.geometry.{name} {v} must be > 0"
                )));
            }
        }
        if !g.com_to_hip.is_finite() || g.com_to_hip < 0.0 {
            return Err(ConfigError::ValidationError(format!(
                "simulation.geometry.com_to_hip {} must be >= 0",
                g.com_to_hip
            )));
        }
        for (i, (lo, hi)) in self.limits.min.iter().zip(self.limits.max.iter()).enumerate() {
            if lo >= hi {
                return Err(ConfigError::ValidationError(format!(
                    "simulation.limits joint {i}: min {lo} >= max {hi}"
                )));
            }
        }
        Ok(())
    }
}

/// Build the plan and an idle simulated controller standing over it.
///
/// The robot starts with its CoM at the configured height above the
/// midpoint of the planned initial feet.
pub fn build(config: &LoadedConfig) -> Result<(StepQueuePlan, SimController), IkError> {
    let walk = &config.walk;
    let mut plan = StepQueuePlan::new(
        walk.timing.preview_window_size,
        walk.timing.preview_period_ms,
        walk.gait.initial_support,
    );
    for step in &config.footsteps {
        plan.add_footstep(*step);
    }

    let mut ik = PlanarLegIk::new(config.simulation.geometry, config.simulation.limits);
    let (left, right) = plan.feet_positions(0);
    let standing = ik.solve(&IkTarget {
        com: [
            (left.x + right.x) / 2.0,
            (left.y + right.y) / 2.0,
            walk.gait.com_height,
        ],
        left: left.on_ground(),
        right: right.on_ground(),
        anchor: walk.gait.initial_support.anchor_foot(),
    })?;

    let controller = WalkController::new(
        walk.clone(),
        ZmpTrackingSolver::new(),
        ik,
        SimHardware::new(standing),
    );
    Ok((plan, controller))
}
