//! Robot platform boundary.
//!
//! # Timing Contracts
//!
//! | Operation | RT Constraint |
//! |-----------|---------------|
//! | `read_joint_sensors()` | **HARD**, bounded |
//! | `dispatch_command()` | **HARD**, bounded |
//! | `register_trigger()` | None (walk start) |
//! | `unregister_trigger()` | Idempotent |

use crate::error::HardwareError;
use crate::types::JointVector;

/// Sensors, actuators, clock and periodic trigger of the host platform.
///
/// The host invokes the registered handler once per control period and
/// never overlaps two invocations.
pub trait Hardware {
    /// Connect the control tick to the platform's periodic trigger.
    fn register_trigger(&mut self) -> Result<(), HardwareError>;

    /// Disconnect the periodic trigger. Safe to call more than once.
    fn unregister_trigger(&mut self);

    /// Whether the periodic trigger is connected.
    fn trigger_registered(&self) -> bool;

    /// Current joint angles [rad].
    fn read_joint_sensors(&mut self) -> Result<JointVector, HardwareError>;

    /// Queue joint angles for execution at `timestamp_ms`.
    fn dispatch_command(
        &mut self,
        joints: &JointVector,
        timestamp_ms: u64,
    ) -> Result<(), HardwareError>;

    /// Platform time [ms].
    fn now_ms(&self) -> u64;

    /// Set stiffness of all actuators (0 = limp, 1 = full).
    fn set_actuator_stiffness(&mut self, level: f64) -> Result<(), HardwareError>;
}
