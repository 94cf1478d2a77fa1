//! Walk Common Library
//!
//! Shared types, boundary traits and configuration for the biped walking
//! controller.
//!
//! # Module Structure
//!
//! - [`types`] - Poses, process state, support state, joint vectors
//! - [`boundary`] - Footstep plan, MPC solver, IK engine and hardware traits
//! - [`error`] - Fault taxonomy and per-tick outcome
//! - [`config`] - Configuration loading and the walk configuration record
//! - [`consts`] - Capacities, defaults and bounds
//! - [`prelude`] - Common re-exports for convenience

pub mod boundary;
pub mod config;
pub mod consts;
pub mod error;
pub mod prelude;
pub mod types;
