//! Simulated hardware boundary.
//!
//! Joints are ideal position servos: a dispatched command takes effect when
//! the simulated clock reaches its timestamp, provided the actuators are
//! stiff. Time only moves through [`SimulatedTime::advance_ms`].

use heapless::Deque;
use tracing::trace;
use walk_common::boundary::hardware::Hardware;
use walk_common::error::HardwareError;
use walk_common::types::JointVector;

/// Commands queued ahead of their timestamp.
const PENDING_CAPACITY: usize = 16;

/// Hardware whose clock is driven by the run loop.
pub trait SimulatedTime {
    /// Move the clock forward and apply due commands.
    fn advance_ms(&mut self, ms: u32);
}

/// In-memory robot with a simulated millisecond clock.
#[derive(Debug)]
pub struct SimHardware {
    now_ms: u64,
    joints: JointVector,
    pending: Deque<(u64, JointVector), PENDING_CAPACITY>,
    stiffness: f64,
    registered: bool,
    dispatched: u64,
    dropped: u64,
}

impl SimHardware {
    /// Robot standing still at `joints`, limp, clock at 0.
    pub fn new(joints: JointVector) -> Self {
        Self {
            now_ms: 0,
            joints,
            pending: Deque::new(),
            stiffness: 0.0,
            registered: false,
            dispatched: 0,
            dropped: 0,
        }
    }

    /// Current joint angles.
    #[inline]
    pub fn joints(&self) -> &JointVector {
        &self.joints
    }

    /// Commanded stiffness level.
    #[inline]
    pub const fn stiffness(&self) -> f64 {
        self.stiffness
    }

    /// Commands accepted so far.
    #[inline]
    pub const fn dispatched(&self) -> u64 {
        self.dispatched
    }

    /// Commands rejected because the queue was full.
    #[inline]
    pub const fn dropped(&self) -> u64 {
        self.dropped
    }

    fn apply_due(&mut self) {
        while let Some((stamp, _)) = self.pending.front() {
            if *stamp > self.now_ms {
                break;
            }
            if let Some((_, joints)) = self.pending.pop_front() {
                if self.stiffness > 0.0 {
                    self.joints = joints;
                }
            }
        }
    }
}

impl SimulatedTime for SimHardware {
    fn advance_ms(&mut self, ms: u32) {
        self.now_ms += ms as u64;
        self.apply_due();
    }
}

impl Hardware for SimHardware {
    fn register_trigger(&mut self) -> Result<(), HardwareError> {
        if self.registered {
            return Err(HardwareError::Trigger("already registered".to_string()));
        }
        self.registered = true;
        Ok(())
    }

    fn unregister_trigger(&mut self) {
        self.registered = false;
    }

    fn trigger_registered(&self) -> bool {
        self.registered
    }

    fn read_joint_sensors(&mut self) -> Result<JointVector, HardwareError> {
        Ok(self.joints.clone())
    }

    fn dispatch_command(
        &mut self,
        joints: &JointVector,
        timestamp_ms: u64,
    ) -> Result<(), HardwareError> {
        if timestamp_ms <= self.now_ms {
            return Err(HardwareError::Dispatch(format!(
                "timestamp {timestamp_ms} ms is not in the future (now {} ms)",
                self.now_ms
            )));
        }
        // A newer command for the same or an earlier instant supersedes queued ones.
        while let Some((stamp, _)) = self.pending.back() {
            if *stamp < timestamp_ms {
                break;
            }
            self.pending.pop_back();
        }
        if self.pending.push_back((timestamp_ms, joints.clone())).is_err() {
            self.dropped += 1;
            return Err(HardwareError::Dispatch("command queue full".to_string()));
        }
        self.dispatched += 1;
        trace!(timestamp_ms, "Command queued");
        Ok(())
    }

    fn now_ms(&self) -> u64 {
        self.now_ms
    }

    fn set_actuator_stiffness(&mut self, level: f64) -> Result<(), HardwareError> {
        if !(0.0..=1.0).contains(&level) {
            return Err(HardwareError::Stiffness(format!(
                "level {level} outside [0, 1]"
            )));
        }
        self.stiffness = level;
        if level == 0.0 {
            self.pending.clear();
        }
        Ok(())
    }
}
