//! Planar two-link leg kinematics.
//!
//! Each leg has six joints: hip yaw, hip roll, hip pitch, knee, ankle pitch,
//! ankle roll (left leg 0..6, right leg 6..12). The torso is kept upright
//! with zero yaw; feet stay flat. Pitch is positive with the thigh forward,
//! the knee is positive when bent.

use serde::{Deserialize, Serialize};
use walk_common::boundary::ik::{IkEngine, IkTarget, SensedPosture};
use walk_common::error::IkError;
use walk_common::types::{Foot, FootPose, JointVector};

/// Joints per leg.
pub const LEG_JOINTS: usize = 6;
/// Joints of both legs.
pub const SIM_JOINTS: usize = 2 * LEG_JOINTS;

/// Leg geometry [m].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LegGeometry {
    pub thigh: f64,
    pub shin: f64,
    /// Ankle joint above the sole.
    pub foot_height: f64,
    /// Distance between the hip joints.
    pub hip_width: f64,
    /// CoM above the hip joints.
    pub com_to_hip: f64,
}

impl Default for LegGeometry {
    fn default() -> Self {
        Self {
            thigh: 0.12,
            shin: 0.12,
            foot_height: 0.045,
            hip_width: 0.1,
            com_to_hip: 0.04,
        }
    }
}

/// Per-joint limits of one leg [rad], in joint order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LegLimits {
    pub min: [f64; LEG_JOINTS],
    pub max: [f64; LEG_JOINTS],
}

impl Default for LegLimits {
    fn default() -> Self {
        Self {
            min: [-1.0, -0.5, -1.0, -0.1, -1.3, -0.5],
            max: [1.0, 0.5, 1.6, 2.2, 1.3, 0.5],
        }
    }
}

/// Analytic IK / FK for two planar legs.
#[derive(Debug, Clone, Default)]
pub struct PlanarLegIk {
    geometry: LegGeometry,
    limits: LegLimits,
}

/// Ankle position relative to the hip joint, in the leg's yawed frame.
#[derive(Debug, Clone, Copy)]
struct LegVector {
    forward: f64,
    lateral: f64,
    down: f64,
}

impl PlanarLegIk {
    pub const fn new(geometry: LegGeometry, limits: LegLimits) -> Self {
        Self { geometry, limits }
    }

    #[inline]
    pub const fn geometry(&self) -> &LegGeometry {
        &self.geometry
    }

    /// Lateral offset of a hip joint from the hip center.
    fn hip_offset(&self, foot: Foot) -> f64 {
        match foot {
            Foot::Left => self.geometry.hip_width / 2.0,
            Foot::Right => -self.geometry.hip_width / 2.0,
        }
    }

    /// Joint angles placing `foot` relative to the hip center.
    fn solve_leg(
        &self,
        hip_center: [f64; 3],
        side: Foot,
        foot: &FootPose,
    ) -> Result<[f64; LEG_JOINTS], IkError> {
        let g = &self.geometry;
        let dx = foot.x - hip_center[0];
        let dy = foot.y - (hip_center[1] + self.hip_offset(side));
        let dz = foot.z + g.foot_height - hip_center[2];

        let yaw = foot.yaw;
        let (s, c) = yaw.sin_cos();
        let forward = c * dx + s * dy;
        let lateral = -s * dx + c * dy;
        if dz >= 0.0 {
            return Err(IkError::NonConvergence { residual: dz });
        }

        let roll = lateral.atan2(-dz);
        let h = (lateral * lateral + dz * dz).sqrt();
        let reach = (forward * forward + h * h).sqrt();
        let (t, sh) = (g.thigh, g.shin);
        if reach > t + sh || reach < (t - sh).abs() || reach <= f64::EPSILON {
            return Err(IkError::NonConvergence {
                residual: reach - (t + sh),
            });
        }

        let knee_cos = (t * t + sh * sh - reach * reach) / (2.0 * t * sh);
        let knee = std::f64::consts::PI - knee_cos.acos();
        let hip_pitch =
            forward.atan2(h) + ((t * t + reach * reach - sh * sh) / (2.0 * t * reach)).acos();
        let ankle_pitch = -(hip_pitch - knee);
        Ok([yaw, roll, hip_pitch, knee, ankle_pitch, -roll])
    }

    /// Ankle relative to the hip joint, rotated back into the world frame.
    fn leg_vector(&self, q: &[f64]) -> LegVector {
        let g = &self.geometry;
        let (yaw, roll, hip_pitch, knee) = (q[0], q[1], q[2], q[3]);
        let forward = g.thigh * hip_pitch.sin() + g.shin * (hip_pitch - knee).sin();
        let h = g.thigh * hip_pitch.cos() + g.shin * (hip_pitch - knee).cos();
        let lateral = h * roll.sin();
        let down = h * roll.cos();
        let (s, c) = yaw.sin_cos();
        LegVector {
            forward: c * forward - s * lateral,
            lateral: s * forward + c * lateral,
            down,
        }
    }

    fn leg_slice(joints: &JointVector, foot: Foot) -> [f64; LEG_JOINTS] {
        let base = match foot {
            Foot::Left => 0,
            Foot::Right => LEG_JOINTS,
        };
        let mut q = [0.0; LEG_JOINTS];
        for (i, v) in q.iter_mut().enumerate() {
            *v = joints.get(base + i).copied().unwrap_or(0.0);
        }
        q
    }
}

impl IkEngine for PlanarLegIk {
    fn solve(&mut self, target: &IkTarget) -> Result<JointVector, IkError> {
        let hip_center = [
            target.com[0],
            target.com[1],
            target.com[2] - self.geometry.com_to_hip,
        ];
        let left = self.solve_leg(hip_center, Foot::Left, &target.left)?;
        let right = self.solve_leg(hip_center, Foot::Right, &target.right)?;

        let mut joints = JointVector::new();
        for q in left.iter().chain(right.iter()) {
            if joints.push(*q).is_err() {
                break;
            }
        }
        Ok(joints)
    }

    fn check_joint_bounds(&self, joints: &JointVector) -> Option<usize> {
        joints.iter().enumerate().find_map(|(i, q)| {
            let j = i % LEG_JOINTS;
            (*q < self.limits.min[j] || *q > self.limits.max[j]).then_some(i)
        })
    }

    fn forward(
        &self,
        joints: &JointVector,
        anchor: Foot,
        anchor_pose: &FootPose,
    ) -> SensedPosture {
        let g = &self.geometry;
        let a = self.leg_vector(&Self::leg_slice(joints, anchor));
        let hip = [
            anchor_pose.x - a.forward,
            anchor_pose.y - a.lateral,
            anchor_pose.z + g.foot_height + a.down,
        ];
        let center = [hip[0], hip[1] - self.hip_offset(anchor), hip[2]];

        let other = anchor.other();
        let oq = Self::leg_slice(joints, other);
        let o = self.leg_vector(&oq);
        let other_pose = FootPose {
            x: center[0] + o.forward,
            y: center[1] + self.hip_offset(other) + o.lateral,
            z: center[2] - o.down - g.foot_height,
            yaw: oq[0],
        };
        let anchor_foot = FootPose {
            yaw: Self::leg_slice(joints, anchor)[0],
            ..*anchor_pose
        };

        let com = [center[0], center[1], center[2] + g.com_to_hip];
        let (left, right) = match anchor {
            Foot::Left => (anchor_foot, other_pose),
            Foot::Right => (other_pose, anchor_foot),
        };
        SensedPosture { com, left, right }
    }
}
