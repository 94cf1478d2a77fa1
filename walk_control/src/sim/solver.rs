//! Unconstrained ZMP-tracking preview solver.
//!
//! Minimizes over the jerk sequence of each axis
//!
//! ```text
//! β/2 Σ (z_{k+1} − zref_k)² + α/2 Σ v_{k+1}² + (γ + ε)/2 Σ u_k²
//! ```
//!
//! where `z` is the ZMP (the model's position coordinate), `v` the velocity
//! and `ε` the regularization. Support bounds are ignored; the problem is a
//! dense least-squares solved by Cholesky, with one factorization shared by
//! both axes.

use nalgebra::{DMatrix, DVector};
use tracing::debug;
use walk_common::boundary::plan::PreviewWindow;
use walk_common::boundary::solver::MpcSolver;
use walk_common::config::SolverWeights;
use walk_common::types::{AxisState, Control, ProcessState};

/// Dense preview solver over the window's variable interval durations.
#[derive(Debug, Clone, Default)]
pub struct ZmpTrackingSolver {
    weights: SolverWeights,
    h_com: f64,
    /// Interval durations [s].
    durations: Vec<f64>,
    zref: Vec<[f64; 2]>,
    init: ProcessState,
    controls: Vec<Control>,
    /// CoM states at the end of each interval.
    predicted: Vec<ProcessState>,
}

/// Exact zero-order-hold step over `t` in ZMP coordinates.
#[inline]
fn propagate(s: &AxisState, u: f64, t: f64, h: f64) -> AxisState {
    AxisState {
        position: s.position
            + s.velocity * t
            + s.acceleration * t * t / 2.0
            + u * (t * t * t / 6.0 - h * t),
        velocity: s.velocity + s.acceleration * t + u * t * t / 2.0,
        acceleration: s.acceleration + u * t,
    }
}

/// ZMP coordinates → CoM coordinates.
#[inline]
fn to_com(s: &AxisState, h: f64) -> AxisState {
    AxisState {
        position: s.position + h * s.acceleration,
        ..*s
    }
}

impl ZmpTrackingSolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Optimal jerk sequence of the last solve.
    #[inline]
    pub fn controls(&self) -> &[Control] {
        &self.controls
    }

    fn simulate(&mut self) {
        self.predicted.clear();
        let h = self.h_com;
        let mut x = self.init.x;
        let mut y = self.init.y;
        for (u, t) in self.controls.iter().zip(self.durations.iter()) {
            x = propagate(&x, u.x, *t, h);
            y = propagate(&y, u.y, *t, h);
            self.predicted.push(ProcessState {
                x: to_com(&x, h),
                y: to_com(&y, h),
            });
        }
    }
}

impl MpcSolver for ZmpTrackingSolver {
    fn configure(&mut self, window_size: usize, weights: &SolverWeights) {
        self.weights = *weights;
        self.durations = Vec::with_capacity(window_size);
        self.zref = Vec::with_capacity(window_size);
        self.controls = Vec::with_capacity(window_size);
        self.predicted = Vec::with_capacity(window_size);
    }

    fn set_parameters(&mut self, window: &PreviewWindow, h_com: f64) {
        self.h_com = h_com;
        self.durations.clear();
        self.zref.clear();
        for step in window.steps() {
            self.durations.push(step.duration_ms as f64 / 1000.0);
            self.zref.push(step.zmp_ref);
        }
    }

    fn form_initial_feasible_point(&mut self, _window: &PreviewWindow, init: &ProcessState) {
        self.init = *init;
        self.controls.clear();
        self.controls.resize(self.durations.len(), Control::default());
    }

    fn solve(&mut self) -> usize {
        let n = self.durations.len();
        if n == 0 {
            self.predicted.clear();
            return 0;
        }
        let SolverWeights {
            alpha,
            beta,
            gamma,
            regularization,
            ..
        } = self.weights;
        let h = self.h_com;

        // Rows of the state as linear functions of the jerk sequence.
        let mut gz = DVector::<f64>::zeros(n);
        let mut gv = DVector::<f64>::zeros(n);
        let mut ga = DVector::<f64>::zeros(n);
        // Free responses per axis.
        let mut fx = self.init.x;
        let mut fy = self.init.y;

        let mut hess = DMatrix::<f64>::zeros(n, n);
        let mut gx = DVector::<f64>::zeros(n);
        let mut gy = DVector::<f64>::zeros(n);

        for k in 0..n {
            let t = self.durations[k];
            let nz = &gz + &gv * t + &ga * (t * t / 2.0);
            let nv = &gv + &ga * t;
            gz = nz;
            gv = nv;
            gz[k] += t * t * t / 6.0 - h * t;
            gv[k] += t * t / 2.0;
            ga[k] += t;

            fx = propagate(&fx, 0.0, t, h);
            fy = propagate(&fy, 0.0, t, h);

            hess.ger(beta, &gz, &gz, 1.0);
            hess.ger(alpha, &gv, &gv, 1.0);
            gx.axpy(beta * (fx.position - self.zref[k][0]), &gz, 1.0);
            gx.axpy(alpha * fx.velocity, &gv, 1.0);
            gy.axpy(beta * (fy.position - self.zref[k][1]), &gz, 1.0);
            gy.axpy(alpha * fy.velocity, &gv, 1.0);
        }
        for i in 0..n {
            hess[(i, i)] += gamma + regularization;
        }

        match hess.cholesky() {
            Some(chol) => {
                let ux = chol.solve(&(-gx));
                let uy = chol.solve(&(-gy));
                for (i, c) in self.controls.iter_mut().enumerate() {
                    c.x = ux[i];
                    c.y = uy[i];
                }
            }
            None => {
                debug!(n, "Preview Hessian not positive definite, holding zero jerk");
                for c in self.controls.iter_mut() {
                    *c = Control::default();
                }
            }
        }
        self.simulate();
        0
    }

    fn predicted_state(&self, step: usize) -> ProcessState {
        self.predicted
            .get(step)
            .or_else(|| self.predicted.last())
            .copied()
            .unwrap_or(ProcessState {
                x: to_com(&self.init.x, self.h_com),
                y: to_com(&self.init.y, self.h_com),
            })
    }

    fn first_control(&self) -> Control {
        self.controls.first().copied().unwrap_or_default()
    }
}
