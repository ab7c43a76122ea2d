//! `epicurves` library crate.
//!
//! The binary (`epicurves`) is a thin wrapper around this library so that:
//!
//! - fitting and smoothing are testable without spawning processes
//! - the report pipelines can be driven from integration tests
//! - code stays easy to navigate as the project grows

pub mod app;
pub mod cli;
pub mod domain;
pub mod error;
pub mod fit;
pub mod io;
pub mod math;
pub mod plot;
pub mod report;
