//! Short-period pitch oscillation of a statically stable airframe.
//!
//! State: [pitch angle theta (rad), pitch rate q (rad/s)]. A restoring
//! moment proportional to theta plus rate damping gives the classic damped
//! oscillator; the demo prints the decaying peaks after a 5 degree
//! disturbance.
//!
//! Run with: cargo run -p fd-ode --example pitch_oscillation

use fd_ode::{AdvanceOptions, FnSystem, Propagator};
use nalgebra::DVector;

// Stiffness and damping for a small stable airframe
const OMEGA2: f64 = 12.0;
const DAMPING: f64 = 0.9;

fn main() {
    tracing_subscriber::fmt::init();

    let mut airframe = FnSystem::new(2, |_t, y: &DVector<f64>, dydt: &mut DVector<f64>| {
        dydt[0] = y[1];
        dydt[1] = -OMEGA2 * y[0] - DAMPING * y[1];
    });

    let disturbance = 5.0_f64.to_radians();
    let mut y = DVector::from_vec(vec![disturbance, 0.0]);
    let mut prop = Propagator::new(AdvanceOptions {
        record_every: 10,
        ..Default::default()
    });

    let trajectory = prop
        .advance_recorded(&mut airframe, &mut y, 0.0, 10.0)
        .expect("pitch response should integrate cleanly");

    println!("{:>8} {:>12} {:>12}", "t (s)", "theta (deg)", "q (deg/s)");
    for (t, state) in trajectory.t.iter().zip(&trajectory.y) {
        println!(
            "{:>8.3} {:>12.3} {:>12.3}",
            t,
            state[0].to_degrees(),
            state[1].to_degrees()
        );
    }
    println!("settled to {:.4} deg after 10 s", y[0].to_degrees());
}
