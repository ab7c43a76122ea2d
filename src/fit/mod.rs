//! Growth estimation.
//!
//! Responsibilities:
//!
//! - fit exponential growth to trailing windows and derive doubling times
//! - build smoothed phase trajectories (level vs. daily change)
//!
//! Both are pure functions of their inputs and safe to call from any worker.

pub mod exponential;
pub mod trajectory;

pub use exponential::*;
pub use trajectory::*;
