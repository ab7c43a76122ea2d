//! Input/output helpers.
//!
//! - CSV ingest for the DPC and JHU layouts (`ingest`)
//! - fit summaries as JSON (`export`)

pub mod export;
pub mod ingest;

pub use export::*;
pub use ingest::*;
