//! OdeSystem trait for pluggable dynamic models.

use nalgebra::DVector;

use crate::error::OdeResult;

/// Trait for a system of ordinary differential equations dy/dt = f(t, y).
///
/// An implementor is typically a vehicle dynamics model: the state vector
/// packs position, velocity, attitude and rate components, and `rhs` applies
/// the force and moment balance.
///
/// Contract:
/// - `dimension()` is fixed for the lifetime of one integration problem.
/// - `rhs` writes the derivative into `dydt`, which is pre-sized to
///   `dimension()`.
/// - `rhs` must be deterministic in `(t, y)`: the adaptive stepper evaluates
///   it several times per trial step and the embedded error estimate is only
///   meaningful when repeated evaluations agree exactly.
///
/// Note: Takes &mut self to allow models to cache intermediate solves for
/// performance.
pub trait OdeSystem {
    /// Number of components in the state vector.
    fn dimension(&self) -> usize;

    /// Compute the state derivative dydt = f(t, y).
    fn rhs(&mut self, t: f64, y: &DVector<f64>, dydt: &mut DVector<f64>) -> OdeResult<()>;
}

/// Closure adapter: wraps an infallible derivative function and a dimension.
///
/// Handy for tests, demos, and callers whose model is a plain function.
pub struct FnSystem<F> {
    dim: usize,
    f: F,
}

impl<F> FnSystem<F>
where
    F: FnMut(f64, &DVector<f64>, &mut DVector<f64>),
{
    pub fn new(dim: usize, f: F) -> Self {
        Self { dim, f }
    }
}

impl<F> OdeSystem for FnSystem<F>
where
    F: FnMut(f64, &DVector<f64>, &mut DVector<f64>),
{
    fn dimension(&self) -> usize {
        self.dim
    }

    fn rhs(&mut self, t: f64, y: &DVector<f64>, dydt: &mut DVector<f64>) -> OdeResult<()> {
        (self.f)(t, y, dydt);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fn_system_reports_dimension() {
        let sys = FnSystem::new(3, |_t, _y, _dydt| {});
        assert_eq!(sys.dimension(), 3);
    }

    #[test]
    fn fn_system_writes_derivative() {
        let mut sys = FnSystem::new(2, |_t, y: &DVector<f64>, dydt: &mut DVector<f64>| {
            dydt[0] = y[1];
            dydt[1] = -y[0];
        });
        let y = DVector::from_vec(vec![1.0, 0.5]);
        let mut dydt = DVector::zeros(2);
        sys.rhs(0.0, &y, &mut dydt).unwrap();
        assert_eq!(dydt[0], 0.5);
        assert_eq!(dydt[1], -1.0);
    }

    #[test]
    fn repeated_evaluation_is_bit_identical() {
        let mut sys = FnSystem::new(2, |t, y: &DVector<f64>, dydt: &mut DVector<f64>| {
            dydt[0] = (t * y[0]).sin() + y[1];
            dydt[1] = y[0] * y[1] - t;
        });
        let y = DVector::from_vec(vec![0.3, -1.7]);
        let mut a = DVector::zeros(2);
        let mut b = DVector::zeros(2);
        sys.rhs(0.42, &y, &mut a).unwrap();
        sys.rhs(0.42, &y, &mut b).unwrap();
        assert_eq!(a, b);
    }
}
