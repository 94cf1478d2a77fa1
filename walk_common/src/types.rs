//! Core value types shared by the control loop and its collaborators.
//!
//! All types are `Copy` (or fixed-capacity) so the control tick never
//! allocates.

use serde::{Deserialize, Serialize};

use crate::consts::MAX_JOINTS;

/// Fixed-capacity joint-angle vector [rad].
pub type JointVector = heapless::Vec<f64, MAX_JOINTS>;

// ─── Feet & Support ─────────────────────────────────────────────────

/// One of the two feet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Foot {
    Left,
    Right,
}

impl Foot {
    /// The opposite foot.
    #[inline]
    pub const fn other(self) -> Self {
        match self {
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }
}

/// Which foot (or feet) carries the robot's weight.
///
/// Changes only on a support switch signalled by the footstep plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SupportState {
    SingleLeft,
    #[default]
    SingleRight,
    Double,
}

impl SupportState {
    /// State after one support switch.
    ///
    /// Single support flips to the other foot. Double support has no
    /// opposite; it hands over to left single support, which is how every
    /// footstep program opens after the initial double-support phase.
    #[inline]
    pub const fn switched(self) -> Self {
        match self {
            Self::SingleLeft => Self::SingleRight,
            Self::SingleRight => Self::SingleLeft,
            Self::Double => Self::SingleLeft,
        }
    }

    /// Foot the kinematic chain is rooted at.
    #[inline]
    pub const fn anchor_foot(self) -> Foot {
        match self {
            Self::SingleLeft | Self::Double => Foot::Left,
            Self::SingleRight => Foot::Right,
        }
    }

    /// Foot in the air, if any.
    #[inline]
    pub const fn swing_foot(self) -> Option<Foot> {
        match self {
            Self::SingleLeft => Some(Foot::Right),
            Self::SingleRight => Some(Foot::Left),
            Self::Double => None,
        }
    }
}

// ─── Poses ──────────────────────────────────────────────────────────

/// Planar pose on the ground: position [m] and yaw [rad].
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Pose2 {
    pub x: f64,
    pub y: f64,
    pub yaw: f64,
}

impl Pose2 {
    pub const fn new(x: f64, y: f64, yaw: f64) -> Self {
        Self { x, y, yaw }
    }

    /// Apply a displacement expressed in this pose's local frame.
    pub fn compose(&self, delta: &Pose2) -> Pose2 {
        let (s, c) = self.yaw.sin_cos();
        Pose2 {
            x: self.x + c * delta.x - s * delta.y,
            y: self.y + s * delta.x + c * delta.y,
            yaw: self.yaw + delta.yaw,
        }
    }

    /// Lift onto the ground plane (z = 0).
    #[inline]
    pub const fn on_ground(&self) -> FootPose {
        FootPose {
            x: self.x,
            y: self.y,
            z: 0.0,
            yaw: self.yaw,
        }
    }
}

/// Foot pose in space. Only yaw is supported for orientation.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FootPose {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub yaw: f64,
}

impl FootPose {
    /// Project onto the ground plane.
    #[inline]
    pub const fn planar(&self) -> Pose2 {
        Pose2 {
            x: self.x,
            y: self.y,
            yaw: self.yaw,
        }
    }
}

// ─── Process State ──────────────────────────────────────────────────

/// Double-integrator state of one horizontal axis.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AxisState {
    /// Position [m].
    pub position: f64,
    /// Velocity [m/s].
    pub velocity: f64,
    /// Acceleration [m/s²].
    pub acceleration: f64,
}

impl AxisState {
    /// State at rest at the given position.
    #[inline]
    pub const fn at_rest(position: f64) -> Self {
        Self {
            position,
            velocity: 0.0,
            acceleration: 0.0,
        }
    }
}

/// Process state for both horizontal axes.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ProcessState {
    pub x: AxisState,
    pub y: AxisState,
}

impl ProcessState {
    /// State at rest above the given ground point.
    #[inline]
    pub const fn at_rest(x: f64, y: f64) -> Self {
        Self {
            x: AxisState::at_rest(x),
            y: AxisState::at_rest(y),
        }
    }
}

/// Jerk control for both axes [m/s³].
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Control {
    pub x: f64,
    pub y: f64,
}
