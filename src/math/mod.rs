//! Numerical building blocks: SVD least squares and Savitzky–Golay smoothing.

pub mod ols;
pub mod savgol;

pub use ols::*;
pub use savgol::*;
