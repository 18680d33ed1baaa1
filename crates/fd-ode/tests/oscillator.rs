//! Integration tests: harmonic oscillator.
//!
//! The field [y1, -y0] rotates the state at unit angular rate, so one full
//! period of 2*pi must return the initial state, and the energy
//! y0^2 + y1^2 is an exact invariant of the continuous system.

use fd_ode::{AdvanceOptions, FnSystem, MethodKind, Propagator, integrate};
use nalgebra::DVector;
use std::f64::consts::TAU;

fn oscillator() -> FnSystem<impl FnMut(f64, &DVector<f64>, &mut DVector<f64>)> {
    FnSystem::new(2, |_t, y: &DVector<f64>, dydt: &mut DVector<f64>| {
        dydt[0] = y[1];
        dydt[1] = -y[0];
    })
}

fn energy(y: &DVector<f64>) -> f64 {
    y[0] * y[0] + y[1] * y[1]
}

#[test]
fn one_period_closes_the_orbit() {
    let mut sys = oscillator();
    let mut y = DVector::from_vec(vec![1.0, 0.0]);

    integrate(&mut sys, &mut y, 0.0, TAU, &AdvanceOptions::default()).unwrap();

    assert!((y[0] - 1.0).abs() < 1e-4);
    assert!(y[1].abs() < 1e-4);
}

#[test]
fn energy_drift_stays_bounded_over_many_periods() {
    let mut sys = oscillator();
    let mut y = DVector::from_vec(vec![1.0, 0.0]);
    let mut prop = Propagator::new(AdvanceOptions {
        eps: 1e-8,
        max_steps: 100_000,
        ..Default::default()
    });

    // Advance period by period, as a tick driver would.
    for period in 1..=50 {
        let t0 = (period - 1) as f64 * TAU;
        prop.advance(&mut sys, &mut y, t0, t0 + TAU).unwrap();
    }

    assert!((energy(&y) - 1.0).abs() < 1e-3);
}

#[test]
fn fixed_rk4_tracks_the_analytic_orbit() {
    let mut sys = oscillator();
    let mut y = DVector::from_vec(vec![0.0, 1.0]);
    let opts = AdvanceOptions {
        method: MethodKind::Rk4,
        h_initial: 1e-2,
        max_steps: 10_000,
        ..Default::default()
    };

    integrate(&mut sys, &mut y, 0.0, 1.0, &opts).unwrap();

    // Exact solution: [sin(t), cos(t)].
    assert!((y[0] - 1.0_f64.sin()).abs() < 1e-6);
    assert!((y[1] - 1.0_f64.cos()).abs() < 1e-6);
}

#[test]
fn forward_euler_converges_with_the_step() {
    let run = |h: f64| {
        let mut sys = oscillator();
        let mut y = DVector::from_vec(vec![1.0, 0.0]);
        let opts = AdvanceOptions {
            method: MethodKind::ForwardEuler,
            h_initial: h,
            max_steps: 1_000_000,
            ..Default::default()
        };
        integrate(&mut sys, &mut y, 0.0, 1.0, &opts).unwrap();
        (y[0] - 1.0_f64.cos()).abs()
    };

    // First-order method: halving the step roughly halves the error.
    let coarse = run(1e-2);
    let fine = run(1e-3);
    assert!(fine < coarse);
    assert!(coarse < 1e-1);
}

#[test]
fn decimated_recording_keeps_the_final_state() {
    let mut sys = oscillator();
    let mut y = DVector::from_vec(vec![1.0, 0.0]);
    let mut prop = Propagator::new(AdvanceOptions {
        record_every: 7,
        ..Default::default()
    });

    let trajectory = prop.advance_recorded(&mut sys, &mut y, 0.0, TAU).unwrap();

    assert_eq!(trajectory.t[0], 0.0);
    assert_eq!(*trajectory.t.last().unwrap(), TAU);
    assert_eq!(trajectory.y.last().unwrap(), &y);
}
