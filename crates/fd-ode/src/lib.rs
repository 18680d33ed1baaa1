//! Adaptive time integration for flight-dynamics state vectors.
//!
//! Provides:
//! - OdeSystem trait for pluggable dynamic models (dy/dt = f(t, y))
//! - Cash-Karp embedded RK5(4) stepper with adaptive step-size control
//! - Fixed-step RK4 / forward Euler fallback methods
//! - Propagator: advance-to-time driver with step budget, overshoot clamping,
//!   and trajectory recording
//!
//! A physics model implements [`OdeSystem`], hands its state vector to a
//! [`Propagator`] once per simulation tick, and inspects the returned
//! [`Advance`] (or error) to decide on recovery policy. Failures carry how
//! far integration progressed; the state keeps the last accepted value.

pub mod driver;
pub mod error;
pub mod fixed;
pub mod stepper;
pub mod system;

// Internal modules
mod tableau;

// Re-exports for public API
pub use driver::{Advance, AdvanceOptions, MethodKind, Propagator, Trajectory, integrate};
pub use error::{OdeError, OdeResult};
pub use fixed::{FixedStep, ForwardEuler, Rk4};
pub use stepper::{CashKarp45, StepController, StepReport};
pub use system::{FnSystem, OdeSystem};
