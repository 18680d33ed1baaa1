//! Fixed-step time integrators.
//!
//! These are the fallback methods a caller can select when a tick must cost a
//! predictable number of derivative evaluations, or when the adaptive method
//! reports failure and the caller opts to push through at a fixed step.

use nalgebra::DVector;

use crate::error::OdeResult;
use crate::system::OdeSystem;

/// Trait for fixed-step integrators.
pub trait FixedStep {
    /// Advance state by one time step of size `h`, writing into `y_out`.
    fn step<S: OdeSystem>(
        &mut self,
        system: &mut S,
        t: f64,
        y: &DVector<f64>,
        h: f64,
        y_out: &mut DVector<f64>,
    ) -> OdeResult<()>;
}

/// Classical RK4 (Runge-Kutta 4th order) integrator.
#[derive(Clone, Debug)]
pub struct Rk4 {
    k1: DVector<f64>,
    k2: DVector<f64>,
    k3: DVector<f64>,
    k4: DVector<f64>,
    y_tmp: DVector<f64>,
}

impl Default for Rk4 {
    fn default() -> Self {
        Self::new()
    }
}

impl Rk4 {
    pub fn new() -> Self {
        Self {
            k1: DVector::zeros(0),
            k2: DVector::zeros(0),
            k3: DVector::zeros(0),
            k4: DVector::zeros(0),
            y_tmp: DVector::zeros(0),
        }
    }

    fn redimension(&mut self, dim: usize) {
        if self.y_tmp.len() == dim {
            return;
        }
        self.k1 = DVector::zeros(dim);
        self.k2 = DVector::zeros(dim);
        self.k3 = DVector::zeros(dim);
        self.k4 = DVector::zeros(dim);
        self.y_tmp = DVector::zeros(dim);
    }
}

impl FixedStep for Rk4 {
    fn step<S: OdeSystem>(
        &mut self,
        system: &mut S,
        t: f64,
        y: &DVector<f64>,
        h: f64,
        y_out: &mut DVector<f64>,
    ) -> OdeResult<()> {
        let dim = y.len();
        self.redimension(dim);

        system.rhs(t, y, &mut self.k1)?;

        for n in 0..dim {
            self.y_tmp[n] = y[n] + 0.5 * h * self.k1[n];
        }
        system.rhs(t + 0.5 * h, &self.y_tmp, &mut self.k2)?;

        for n in 0..dim {
            self.y_tmp[n] = y[n] + 0.5 * h * self.k2[n];
        }
        system.rhs(t + 0.5 * h, &self.y_tmp, &mut self.k3)?;

        for n in 0..dim {
            self.y_tmp[n] = y[n] + h * self.k3[n];
        }
        system.rhs(t + h, &self.y_tmp, &mut self.k4)?;

        // Combine: y_new = y + (h/6) * (k1 + 2*k2 + 2*k3 + k4)
        for n in 0..dim {
            y_out[n] =
                y[n] + (h / 6.0) * (self.k1[n] + 2.0 * self.k2[n] + 2.0 * self.k3[n] + self.k4[n]);
        }

        Ok(())
    }
}

/// Forward Euler (explicit, 1st order, fast for testing).
/// Calls rhs() once per step instead of 4 times (RK4).
#[derive(Clone, Debug)]
pub struct ForwardEuler {
    dydt: DVector<f64>,
}

impl Default for ForwardEuler {
    fn default() -> Self {
        Self::new()
    }
}

impl ForwardEuler {
    pub fn new() -> Self {
        Self {
            dydt: DVector::zeros(0),
        }
    }
}

impl FixedStep for ForwardEuler {
    fn step<S: OdeSystem>(
        &mut self,
        system: &mut S,
        t: f64,
        y: &DVector<f64>,
        h: f64,
        y_out: &mut DVector<f64>,
    ) -> OdeResult<()> {
        let dim = y.len();
        if self.dydt.len() != dim {
            self.dydt = DVector::zeros(dim);
        }
        system.rhs(t, y, &mut self.dydt)?;
        for n in 0..dim {
            y_out[n] = y[n] + h * self.dydt[n];
        }
        Ok(())
    }
}
