//! Deadbanded, gain-limited correction of the model position against the
//! sensed CoM.
//!
//! The model state lives in ZMP coordinates (`position = CoM − h_com·a`),
//! so the CoM estimate compared against the sensor is `position + h_com·a`;
//! the correction shifts the position by the same amount.
//!
//! Only the part of the error exceeding the deadband is corrected, scaled by
//! the gain. With gain in `[0, 1]` the corrected error never exceeds the raw
//! error in magnitude.

use walk_common::types::AxisState;

/// Remove the deadband from an error, keeping its sign.
#[inline]
pub fn apply_deadband(error: f64, deadband: f64) -> f64 {
    if error.abs() <= deadband {
        0.0
    } else if error > 0.0 {
        error - deadband
    } else {
        error + deadband
    }
}

/// Corrected model position for one axis.
#[inline]
pub fn correct(model_position: f64, sensed_position: f64, deadband: f64, gain: f64) -> f64 {
    let error = model_position - sensed_position;
    model_position - gain * apply_deadband(error, deadband)
}

/// Correct one axis of the model state in place against the sensed CoM.
#[inline]
pub fn correct_axis(axis: &mut AxisState, sensed_com: f64, h_com: f64, deadband: f64, gain: f64) {
    let com = axis.position + h_com * axis.acceleration;
    axis.position += correct(com, sensed_com, deadband, gain) - com;
}

// ─── Tests ──────────────────────────────────────────────────────────
