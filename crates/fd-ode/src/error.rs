//! Error types for the integration engine.

use fd_core::FdError;
use thiserror::Error;

/// Errors encountered while advancing an ODE state.
///
/// Numerical non-convergence (`StepUnderflow`, `TooManySteps`) is reported as
/// a value carrying how far integration progressed; the state vector passed to
/// the driver keeps the last successfully advanced state.
#[derive(Error, Debug)]
pub enum OdeError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] FdError),

    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    #[error("State dimension mismatch: system expects {expected}, state has {got}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("Step size underflow at t={t} (h={h})")]
    StepUnderflow { t: f64, h: f64 },

    #[error("Step budget exhausted after {max_steps} steps at t={t_reached}")]
    TooManySteps { t_reached: f64, max_steps: usize },

    #[error("Non-finite state component at t={t}")]
    NonFiniteState { t: f64 },

    #[error("Model error: {message}")]
    Model { message: String },
}

pub type OdeResult<T> = Result<T, OdeError>;
