//! Advance-to-time driver and trajectory recording.

use fd_core::{Tolerances, ensure_finite, ensure_positive, nearly_equal};
use nalgebra::DVector;
use tracing::debug;

use crate::error::{OdeError, OdeResult};
use crate::fixed::{FixedStep, ForwardEuler, Rk4};
use crate::stepper::CashKarp45;
use crate::system::OdeSystem;

/// Integration method selection.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MethodKind {
    /// Adaptive Cash-Karp 5(4) (default; step size controlled by `eps`).
    #[default]
    CashKarp45,
    /// Fixed-step classical RK4 (step size `h_initial`, 4 rhs calls per step).
    Rk4,
    /// Fixed-step forward Euler (step size `h_initial`, 1 rhs call per step).
    ForwardEuler,
}

/// Options for advancing a state to a target time.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AdvanceOptions {
    /// Desired local error tolerance per step (adaptive method only)
    pub eps: f64,
    /// Initial trial step size; fixed methods use it as the step size
    pub h_initial: f64,
    /// Maximum number of accepted sub-steps per advance call
    pub max_steps: usize,
    /// Integration method (default: adaptive Cash-Karp)
    pub method: MethodKind,
    /// Record every N-th accepted step (recording runs only)
    pub record_every: usize,
    /// Tolerance for deciding the target time has been reached
    pub endpoint_tol: Tolerances,
}

impl Default for AdvanceOptions {
    fn default() -> Self {
        Self {
            eps: 1e-6,
            h_initial: 1e-3,
            max_steps: 10_000,
            method: MethodKind::default(),
            record_every: 1,
            endpoint_tol: Tolerances::default(),
        }
    }
}

/// Summary of a completed advance.
#[derive(Clone, Copy, Debug)]
pub struct Advance {
    /// Time actually reached
    pub t: f64,
    /// Accepted steps taken
    pub accepted: usize,
    /// Rejected trial steps
    pub rejected: usize,
    /// Suggested trial step size for the next advance
    pub h_next: f64,
}

/// Recorded trajectory (time points + state snapshots).
#[derive(Clone, Debug, Default)]
pub struct Trajectory {
    /// Time points
    pub t: Vec<f64>,
    /// State snapshots
    pub y: Vec<DVector<f64>>,
}

/// Advances a state vector to a target time by repeated sub-steps.
///
/// One propagator per simulated entity: instances own their scratch buffers
/// and share nothing, so separate entities can be advanced on separate
/// threads without locking. The step-size suggestion from the last advance is
/// carried into the next one ([`Propagator::reset`] clears it).
#[derive(Clone, Debug)]
pub struct Propagator {
    pub opts: AdvanceOptions,
    stepper: CashKarp45,
    rk4: Rk4,
    euler: ForwardEuler,
    dydt: DVector<f64>,
    y_next: DVector<f64>,
    h_carry: Option<f64>,
}

impl Propagator {
    pub fn new(opts: AdvanceOptions) -> Self {
        Self {
            opts,
            stepper: CashKarp45::default(),
            rk4: Rk4::new(),
            euler: ForwardEuler::new(),
            dydt: DVector::zeros(0),
            y_next: DVector::zeros(0),
            h_carry: None,
        }
    }

    /// Drop the carried step-size suggestion (e.g. after a state
    /// discontinuity such as a ground impact or a stage separation).
    pub fn reset(&mut self) {
        self.h_carry = None;
    }

    /// Advance `y` in place from `t_start` to `t_end`.
    ///
    /// On failure the error carries how far `t` got and `y` keeps the last
    /// successfully advanced state, so the caller can decide on a recovery
    /// policy (shorter tick, fixed-step fallback, or freezing the entity for
    /// a frame).
    pub fn advance<S: OdeSystem>(
        &mut self,
        system: &mut S,
        y: &mut DVector<f64>,
        t_start: f64,
        t_end: f64,
    ) -> OdeResult<Advance> {
        self.advance_inner(system, y, t_start, t_end, None)
    }

    /// Like [`Propagator::advance`], additionally recording every
    /// `record_every`-th accepted step plus the final state.
    pub fn advance_recorded<S: OdeSystem>(
        &mut self,
        system: &mut S,
        y: &mut DVector<f64>,
        t_start: f64,
        t_end: f64,
    ) -> OdeResult<Trajectory> {
        let mut trajectory = Trajectory {
            t: vec![t_start],
            y: vec![y.clone()],
        };
        self.advance_inner(system, y, t_start, t_end, Some(&mut trajectory))?;
        Ok(trajectory)
    }

    fn advance_inner<S: OdeSystem>(
        &mut self,
        system: &mut S,
        y: &mut DVector<f64>,
        t_start: f64,
        t_end: f64,
        mut record: Option<&mut Trajectory>,
    ) -> OdeResult<Advance> {
        validate_options(&self.opts)?;
        if !t_start.is_finite() || !t_end.is_finite() {
            return Err(OdeError::InvalidArg {
                what: "t_start and t_end must be finite",
            });
        }

        let dim = system.dimension();
        if y.len() != dim {
            return Err(OdeError::DimensionMismatch {
                expected: dim,
                got: y.len(),
            });
        }
        if self.dydt.len() != dim {
            self.dydt = DVector::zeros(dim);
            self.y_next = DVector::zeros(dim);
        }

        if t_start == t_end {
            return Ok(Advance {
                t: t_end,
                accepted: 0,
                rejected: 0,
                h_next: self.h_carry.unwrap_or(self.opts.h_initial),
            });
        }

        let dir = if t_end > t_start { 1.0 } else { -1.0 };
        let mut t = t_start;
        let mut h = self.h_carry.unwrap_or(self.opts.h_initial).abs() * dir;
        let mut accepted = 0usize;
        let mut rejected = 0usize;

        loop {
            if (t_end - t) * dir <= 0.0 || nearly_equal(t, t_end, self.opts.endpoint_tol) {
                break;
            }
            if accepted >= self.opts.max_steps {
                debug!(
                    t,
                    t_end,
                    max_steps = self.opts.max_steps,
                    "step budget exhausted"
                );
                return Err(OdeError::TooManySteps {
                    t_reached: t,
                    max_steps: self.opts.max_steps,
                });
            }

            // Clamp the trial step so the last step lands on the target time.
            let mut h_try = h;
            if (t + h_try - t_end) * dir > 0.0 {
                h_try = t_end - t;
            }

            match self.opts.method {
                MethodKind::CashKarp45 => {
                    system.rhs(t, y, &mut self.dydt)?;
                    let report = self.stepper.step(
                        system,
                        t,
                        y,
                        &self.dydt,
                        h_try,
                        self.opts.eps,
                        &mut self.y_next,
                    )?;
                    rejected += report.rejections;
                    t += report.hdid;
                    h = report.hnext;
                }
                MethodKind::Rk4 => {
                    self.rk4.step(system, t, y, h_try, &mut self.y_next)?;
                    t += h_try;
                }
                MethodKind::ForwardEuler => {
                    self.euler.step(system, t, y, h_try, &mut self.y_next)?;
                    t += h_try;
                }
            }

            // The landing step computes h_try = t_end - t, but t + h_try can
            // still miss t_end by an ulp; snap within tolerance.
            if nearly_equal(t, t_end, self.opts.endpoint_tol) {
                t = t_end;
            }

            std::mem::swap(y, &mut self.y_next);
            if !y.iter().all(|v| v.is_finite()) {
                debug!(t, "state went non-finite");
                return Err(OdeError::NonFiniteState { t });
            }
            accepted += 1;

            if let Some(trajectory) = record.as_deref_mut()
                && accepted % self.opts.record_every == 0
            {
                trajectory.t.push(t);
                trajectory.y.push(y.clone());
            }
        }

        // The loop exits within endpoint tolerance; land exactly on target.
        t = t_end;
        if let Some(trajectory) = record
            && accepted % self.opts.record_every != 0
        {
            trajectory.t.push(t);
            trajectory.y.push(y.clone());
        }

        self.h_carry = Some(h);
        Ok(Advance {
            t,
            accepted,
            rejected,
            h_next: h,
        })
    }
}

/// One-shot advance with a fresh [`Propagator`].
pub fn integrate<S: OdeSystem>(
    system: &mut S,
    y: &mut DVector<f64>,
    t_start: f64,
    t_end: f64,
    opts: &AdvanceOptions,
) -> OdeResult<Advance> {
    Propagator::new(opts.clone()).advance(system, y, t_start, t_end)
}

fn validate_options(opts: &AdvanceOptions) -> OdeResult<()> {
    ensure_positive(opts.eps, "eps")?;
    ensure_finite(opts.h_initial, "h_initial")?;
    if opts.h_initial == 0.0 {
        return Err(OdeError::InvalidArg {
            what: "h_initial must be non-zero",
        });
    }
    if opts.max_steps == 0 {
        return Err(OdeError::InvalidArg {
            what: "max_steps must be positive",
        });
    }
    if opts.record_every == 0 {
        return Err(OdeError::InvalidArg {
            what: "record_every must be positive",
        });
    }
    Ok(())
}


#[cfg(test)]
mod proptests {
    use super::*;
    use crate::system::FnSystem;
    use proptest::prelude::*;

    proptest! {
        // Keep the case count modest: each case runs a full integration.
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn linear_field_matches_exponential(
            k in -2.0_f64..2.0,
            span in 0.1_f64..1.5,
        ) {
            let mut sys = FnSystem::new(1, move |_t, y: &DVector<f64>, dydt: &mut DVector<f64>| {
                dydt[0] = k * y[0];
            });
            let mut y = DVector::from_vec(vec![1.0]);
            integrate(&mut sys, &mut y, 0.0, span, &AdvanceOptions::default()).unwrap();
            let exact = (k * span).exp();
            prop_assert!((y[0] - exact).abs() < 1e-4 * exact.abs().max(1.0));
        }

        #[test]
        fn advance_is_deterministic(span in 0.1_f64..1.0) {
            let run = |span: f64| {
                let mut sys = FnSystem::new(2, |_t, y: &DVector<f64>, dydt: &mut DVector<f64>| {
                    dydt[0] = y[1];
                    dydt[1] = -y[0];
                });
                let mut y = DVector::from_vec(vec![1.0, 0.0]);
                integrate(&mut sys, &mut y, 0.0, span, &AdvanceOptions::default()).unwrap();
                y
            };
            prop_assert_eq!(run(span), run(span));
        }
    }
}
