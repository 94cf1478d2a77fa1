//! Inverse kinematics engine interface.

use crate::error::IkError;
use crate::types::{Foot, FootPose, JointVector};

/// Whole-body target for one lookahead step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IkTarget {
    /// CoM position [m].
    pub com: [f64; 3],
    pub left: FootPose,
    pub right: FootPose,
    /// Foot the kinematic chain is rooted at.
    pub anchor: Foot,
}

/// Posture recovered from sensed joint angles.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SensedPosture {
    /// CoM position [m].
    pub com: [f64; 3],
    pub left: FootPose,
    pub right: FootPose,
}

impl SensedPosture {
    /// Pose of the given foot.
    #[inline]
    pub const fn foot(&self, foot: Foot) -> FootPose {
        match foot {
            Foot::Left => self.left,
            Foot::Right => self.right,
        }
    }
}

/// Geometric model mapping CoM and feet poses to joint angles.
pub trait IkEngine {
    /// Solve for joint angles reaching `target`.
    fn solve(&mut self, target: &IkTarget) -> Result<JointVector, IkError>;

    /// Index of the first joint outside its bounds, if any.
    fn check_joint_bounds(&self, joints: &JointVector) -> Option<usize>;

    /// Forward kinematics from sensed joints, rooted at `anchor` placed at
    /// `anchor_pose`.
    fn forward(
        &self,
        joints: &JointVector,
        anchor: Foot,
        anchor_pose: &FootPose,
    ) -> SensedPosture;
}
