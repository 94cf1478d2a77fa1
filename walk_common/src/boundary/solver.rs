//! MPC solver interface.

use crate::boundary::plan::PreviewWindow;
use crate::config::SolverWeights;
use crate::types::{Control, ProcessState};

/// Optimizer producing the CoM/ZMP control sequence over a preview window.
///
/// Call order per tick: `set_parameters` → `form_initial_feasible_point`
/// → `solve` → `next_state` / `predicted_state` / `first_control`.
///
/// The initial state is in process-model coordinates, whose position is the
/// ZMP (`CoM − h_com·acceleration`). Predicted states are CoM states.
pub trait MpcSolver {
    /// (Re)size and reweight the solver. Called once per walk start.
    fn configure(&mut self, window_size: usize, weights: &SolverWeights);

    /// Load the window's time partition, references and bounds.
    ///
    /// `h_com` is the CoM height divided by gravity [s²].
    fn set_parameters(&mut self, window: &PreviewWindow, h_com: f64);

    /// Seed the solver from the window's feasible ZMP and the initial state.
    fn form_initial_feasible_point(&mut self, window: &PreviewWindow, init: &ProcessState);

    /// Solve; returns the number of active inequality constraints.
    fn solve(&mut self) -> usize;

    /// State after the first interval of the window.
    fn next_state(&self) -> ProcessState {
        self.predicted_state(0)
    }

    /// State after interval `step` (0-based) of the window.
    fn predicted_state(&self, step: usize) -> ProcessState;

    /// Jerk applied over the first interval.
    fn first_control(&self) -> Control;
}
