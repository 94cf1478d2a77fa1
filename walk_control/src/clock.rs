//! Control clock: remaining time of the executing preview interval.
//!
//! Invariant: `0 <= remaining <= preview_period`. Decremented by one control
//! period per tick; a new preview window is requested exactly when it
//! reaches 0, after which it is reset to the preview period.

/// Preview interval countdown in integer milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlClock {
    control_period_ms: u32,
    preview_period_ms: u32,
    remaining_ms: u32,
}

impl ControlClock {
    /// New clock, already expired so the first tick forms a window.
    ///
    /// `preview_period_ms` must be a positive multiple of `control_period_ms`
    /// (enforced by config validation).
    pub const fn new(control_period_ms: u32, preview_period_ms: u32) -> Self {
        Self {
            control_period_ms,
            preview_period_ms,
            remaining_ms: 0,
        }
    }

    #[inline]
    pub const fn control_period_ms(&self) -> u32 {
        self.control_period_ms
    }

    #[inline]
    pub const fn preview_period_ms(&self) -> u32 {
        self.preview_period_ms
    }

    /// Remaining time of the executing preview interval [ms].
    #[inline]
    pub const fn remaining_ms(&self) -> u32 {
        self.remaining_ms
    }

    /// Time elapsed in the executing preview interval [ms].
    #[inline]
    pub const fn elapsed_ms(&self) -> u32 {
        self.preview_period_ms - self.remaining_ms
    }

    /// Control ticks elapsed in the executing preview interval.
    #[inline]
    pub const fn elapsed_ticks(&self) -> u32 {
        self.elapsed_ms() / self.control_period_ms
    }

    /// Whether a new preview window must be formed this tick.
    #[inline]
    pub const fn expired(&self) -> bool {
        self.remaining_ms == 0
    }

    /// Start a new preview interval.
    #[inline]
    pub fn reset(&mut self) {
        self.remaining_ms = self.preview_period_ms;
    }

    /// Force expiry (walk start).
    #[inline]
    pub fn expire(&mut self) {
        self.remaining_ms = 0;
    }

    /// End-of-tick decrement, saturating at 0.
    #[inline]
    pub fn tick(&mut self) {
        self.remaining_ms = self.remaining_ms.saturating_sub(self.control_period_ms);
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
