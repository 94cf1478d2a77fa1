//! Interfaces of the external collaborators of the control loop.
//!
//! - [`plan`] - Footstep plan: queued footsteps, preview windows, feet poses
//! - [`solver`] - MPC solver over the preview window
//! - [`ik`] - Inverse / forward kinematics and joint bounds
//! - [`hardware`] - Sensors, command dispatch, clock, stiffness, periodic trigger

pub mod hardware;
pub mod ik;
pub mod plan;
pub mod solver;
