//! Quality-controlled Cash-Karp step with adaptive step-size control.

use nalgebra::DVector;
use tracing::{debug, trace};

use crate::error::{OdeError, OdeResult};
use crate::system::OdeSystem;
use crate::tableau::{A, B, B_ERR, C, STAGES};

/// Floor added to the per-component error scale so that components passing
/// through zero do not blow up the scaled error.
pub(crate) const TINY: f64 = f64::EPSILON;

/// Step-size controller for the embedded pair.
///
/// Accepted steps grow by `safety * err^grow_exponent`, capped at `max_grow`;
/// rejected steps shrink by `safety * err^shrink_exponent`, clamped to no
/// less than `max_shrink`. `err` is the scaled error ratio (1.0 at tolerance).
#[derive(Clone, Copy, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StepController {
    /// Safety margin applied to every step-size update
    pub safety: f64,
    /// Exponent for growing the step after acceptance
    pub grow_exponent: f64,
    /// Exponent for shrinking the step after rejection
    pub shrink_exponent: f64,
    /// Maximum growth factor per step
    pub max_grow: f64,
    /// Minimum shrink factor per step
    pub max_shrink: f64,
    /// Maximum shrink retries within a single step call
    pub max_retries: usize,
}

impl Default for StepController {
    fn default() -> Self {
        Self {
            safety: 0.9,
            grow_exponent: -0.2,
            shrink_exponent: -0.25,
            max_grow: 4.0,
            max_shrink: 0.25,
            max_retries: 40,
        }
    }
}

impl StepController {
    /// Error ratio below which the growth cap takes over from the power law.
    pub fn err_cutoff(&self) -> f64 {
        (self.max_grow / self.safety).powf(1.0 / self.grow_exponent)
    }

    /// Step size suggested after an accepted step with scaled error `err`.
    pub fn grow(&self, h: f64, err: f64) -> f64 {
        if err < self.err_cutoff() {
            self.max_grow * h
        } else {
            self.safety * err.powf(self.grow_exponent) * h
        }
    }

    /// Step size to retry with after a rejected step with scaled error `err`.
    pub fn shrink(&self, h: f64, err: f64) -> f64 {
        let factor = (self.safety * err.powf(self.shrink_exponent)).max(self.max_shrink);
        factor * h
    }
}

/// Outcome of a single accepted adaptive step.
#[derive(Clone, Copy, Debug)]
#[must_use]
pub struct StepReport {
    /// Step size actually taken
    pub hdid: f64,
    /// Suggested size for the following step
    pub hnext: f64,
    /// Rejected trials before acceptance
    pub rejections: usize,
}

/// Cash-Karp embedded Runge-Kutta 5(4) stepper.
///
/// Scratch buffers are sized on first use and resized only when the system
/// dimension changes; stepping itself performs no allocation.
#[derive(Clone, Debug)]
pub struct CashKarp45 {
    pub controller: StepController,
    k: [DVector<f64>; STAGES],
    y_tmp: DVector<f64>,
    y_new: DVector<f64>,
    y_err: DVector<f64>,
}

impl Default for CashKarp45 {
    fn default() -> Self {
        Self::new(StepController::default())
    }
}

impl CashKarp45 {
    pub fn new(controller: StepController) -> Self {
        Self {
            controller,
            k: std::array::from_fn(|_| DVector::zeros(0)),
            y_tmp: DVector::zeros(0),
            y_new: DVector::zeros(0),
            y_err: DVector::zeros(0),
        }
    }

    /// Current scratch dimension.
    pub fn dimension(&self) -> usize {
        self.y_tmp.len()
    }

    /// Resize scratch buffers to `dim`; no-op when the dimension is unchanged.
    pub fn redimension(&mut self, dim: usize) {
        if self.y_tmp.len() == dim {
            return;
        }
        for k in &mut self.k {
            *k = DVector::zeros(dim);
        }
        self.y_tmp = DVector::zeros(dim);
        self.y_new = DVector::zeros(dim);
        self.y_err = DVector::zeros(dim);
    }

    /// Take one quality-controlled step from `(t, y)` with trial size `htry`.
    ///
    /// `dydt` must hold the derivative at `(t, y)`. On acceptance the advanced
    /// state is written into `y_out` and the report carries the size actually
    /// used plus the suggestion for the next step. The step shrinks and
    /// retries while the scaled local error exceeds `eps`; if the size
    /// underflows (`t + h == t`) or the retry bound is exhausted, the step
    /// fails with [`OdeError::StepUnderflow`].
    ///
    /// `htry` may be negative for backward integration; the sign is preserved
    /// through all adjustments.
    pub fn step<S: OdeSystem>(
        &mut self,
        system: &mut S,
        t: f64,
        y: &DVector<f64>,
        dydt: &DVector<f64>,
        htry: f64,
        eps: f64,
        y_out: &mut DVector<f64>,
    ) -> OdeResult<StepReport> {
        self.redimension(system.dimension());
        let mut h = htry;
        let mut rejections = 0usize;

        loop {
            self.evaluate_stages(system, t, y, dydt, h)?;
            let err = self.scaled_error(y, dydt, h, eps);

            if err <= 1.0 {
                y_out.copy_from(&self.y_new);
                return Ok(StepReport {
                    hdid: h,
                    hnext: self.controller.grow(h, err),
                    rejections,
                });
            }

            rejections += 1;
            if rejections > self.controller.max_retries {
                debug!(t, h, rejections, "retry budget exhausted");
                return Err(OdeError::StepUnderflow { t, h });
            }

            h = self.controller.shrink(h, err);
            if t + h == t {
                debug!(t, h, "step size underflow");
                return Err(OdeError::StepUnderflow { t, h });
            }
            trace!(t, h, err, "step rejected");
        }
    }

    /// Evaluate the six stages and form the fifth-order solution plus the
    /// embedded error estimate.
    fn evaluate_stages<S: OdeSystem>(
        &mut self,
        system: &mut S,
        t: f64,
        y: &DVector<f64>,
        dydt: &DVector<f64>,
        h: f64,
    ) -> OdeResult<()> {
        let dim = y.len();

        // Stage 0 reuses the caller-supplied derivative at (t, y).
        self.k[0].copy_from(dydt);

        for i in 1..STAGES {
            for n in 0..dim {
                let mut acc = 0.0;
                for j in 0..i {
                    acc += A[i][j] * self.k[j][n];
                }
                self.y_tmp[n] = y[n] + h * acc;
            }
            system.rhs(t + C[i] * h, &self.y_tmp, &mut self.k[i])?;
        }

        for n in 0..dim {
            let mut acc = 0.0;
            let mut acc_err = 0.0;
            for i in 0..STAGES {
                acc += B[i] * self.k[i][n];
                acc_err += B_ERR[i] * self.k[i][n];
            }
            self.y_new[n] = y[n] + h * acc;
            self.y_err[n] = h * acc_err;
        }

        Ok(())
    }

    /// Max over components of |yerr| / (|y| + |h * dydt| + TINY), divided by
    /// the tolerance: <= 1.0 means the trial step meets the accuracy target.
    fn scaled_error(&self, y: &DVector<f64>, dydt: &DVector<f64>, h: f64, eps: f64) -> f64 {
        let mut errmax = 0.0_f64;
        for n in 0..y.len() {
            let scale = y[n].abs() + (h * dydt[n]).abs() + TINY;
            errmax = errmax.max((self.y_err[n] / scale).abs());
        }
        errmax / eps
    }
}
