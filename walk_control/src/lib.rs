//! # Walk Control Library
//!
//! Real-time control loop of a preview-control walking pattern generator for
//! a bipedal humanoid. Every control period the loop reads the joint sensors,
//! corrects the modelled CoM state towards the sensed one, re-forms the
//! preview window at interval boundaries, solves the MPC problem, converts
//! the predicted CoM and foot trajectories to joint commands through inverse
//! kinematics and dispatches them with timestamps covering the actuator
//! latency.
//!
//! ## Layers
//!
//! 1. **model** / **feedback**: third-order CoM process model and deadband
//!    state correction
//! 2. **clock** / **preview** / **swing**: interval timing, support-state
//!    machine and swing-foot trajectories
//! 3. **cycle**: the per-tick orchestrator and its halt latch (**safety**)
//! 4. **runner**: RT setup and the periodic loop
//! 5. **sim**: simulated plan, solver, IK and hardware
//!
//! ## Zero-Allocation Tick
//!
//! All per-tick buffers are fixed capacity (`heapless`). The tick itself
//! performs no heap allocation; collaborators behind the boundary traits may.

#![deny(clippy::disallowed_types)]

pub mod clock;
pub mod config;
pub mod cycle;
pub mod feedback;
pub mod model;
pub mod preview;
pub mod runner;
pub mod safety;
pub mod sim;
pub mod swing;
