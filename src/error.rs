//! Error types.
//!
//! `AppError` is what the binary reports: a message plus a process exit code.
//! Smoothing configuration errors get their own type so callers can tell a
//! caller bug apart from bad input data.

/// Exit code for unreadable inputs, bad flags and filesystem failures.
pub const EXIT_INPUT: u8 = 2;
/// Exit code when the inputs contain no usable observations.
pub const EXIT_NO_DATA: u8 = 3;
/// Exit code for numerical failures (invalid smoothing configuration).
pub const EXIT_COMPUTE: u8 = 4;
/// Exit code for chart/report writing failures.
pub const EXIT_OUTPUT: u8 = 5;
/// Exit code when the report was written but some geographies failed.
pub const EXIT_PARTIAL: u8 = 6;

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

/// An inconsistent Savitzky–Golay configuration.
///
/// This is a programming-contract violation, not a data problem: the caller
/// chose the parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SmoothError {
    /// The window must hold at least one point.
    EmptyWindow,
    /// The window must be odd so it has a centre point.
    EvenWindow { window_size: usize },
    /// The polynomial needs fewer coefficients than the window has points.
    OrderTooHigh { poly_order: usize, window_size: usize },
}

impl std::fmt::Display for SmoothError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SmoothError::EmptyWindow => write!(f, "invalid smoothing parameter: window size must be >= 1"),
            SmoothError::EvenWindow { window_size } => {
                write!(f, "invalid smoothing parameter: window size {window_size} must be odd")
            }
            SmoothError::OrderTooHigh {
                poly_order,
                window_size,
            } => write!(
                f,
                "invalid smoothing parameter: polynomial order {poly_order} must be less than window size {window_size}"
            ),
        }
    }
}

impl std::error::Error for SmoothError {}

impl From<SmoothError> for AppError {
    fn from(err: SmoothError) -> Self {
        AppError::new(EXIT_COMPUTE, err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn smooth_error_maps_to_compute_exit_code() {
        let err: AppError = SmoothError::EvenWindow { window_size: 4 }.into();
        assert_eq!(err.exit_code(), EXIT_COMPUTE);
        assert!(err.message().contains("must be odd"));
    }
}
