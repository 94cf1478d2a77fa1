//! Halt latch for the two cancellation paths: graceful stop and fault halt.
//!
//! Graceful stop: disconnect the periodic trigger.
//! Fault halt: disconnect the periodic trigger, then drop actuator
//! stiffness to zero.
//!
//! Both are idempotent. Disconnecting is repeated on every call (the
//! hardware boundary tolerates it); stiffness is commanded only once.

use tracing::{error, info};
use walk_common::boundary::hardware::Hardware;
use walk_common::error::StopReason;

/// How the latch was engaged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HaltKind {
    /// Walk ended normally.
    Graceful(StopReason),
    /// Walk ended on a fatal fault.
    Fault,
}

/// Latch for the stop/halt sequence of one walk.
#[derive(Debug, Default)]
pub struct HaltLatch {
    /// First halt that engaged the latch.
    engaged: Option<HaltKind>,
    /// Zero stiffness already commanded.
    limp: bool,
}

impl HaltLatch {
    pub const fn new() -> Self {
        Self {
            engaged: None,
            limp: false,
        }
    }

    /// First halt that engaged the latch.
    #[inline]
    pub const fn engaged(&self) -> Option<HaltKind> {
        self.engaged
    }

    /// Whether zero stiffness was commanded.
    #[inline]
    pub const fn is_limp(&self) -> bool {
        self.limp
    }

    /// Graceful stop: disconnect the trigger.
    ///
    /// Returns true if this call engaged the latch.
    pub fn stop<H: Hardware>(&mut self, hw: &mut H, reason: StopReason) -> bool {
        hw.unregister_trigger();
        if self.engaged.is_some() {
            return false;
        }
        self.engaged = Some(HaltKind::Graceful(reason));
        info!(?reason, "Walk stopped");
        true
    }

    /// Fault halt: disconnect the trigger and go limp.
    ///
    /// A failing stiffness command is logged, not propagated; the trigger is
    /// already disconnected at that point. Returns true if this call engaged
    /// the latch.
    pub fn fault<H: Hardware>(&mut self, hw: &mut H) -> bool {
        hw.unregister_trigger();
        if !self.limp {
            if let Err(e) = hw.set_actuator_stiffness(0.0) {
                error!(error = %e, "Failed to drop actuator stiffness");
            }
            self.limp = true;
        }
        if matches!(self.engaged, Some(HaltKind::Fault)) {
            return false;
        }
        self.engaged = Some(HaltKind::Fault);
        true
    }

    /// Re-arm for a new walk.
    pub fn reset(&mut self) {
        self.engaged = None;
        self.limp = false;
    }
}
