//! Ballistic drop with quadratic drag.
//!
//! State: [altitude (m), vertical speed (m/s, up positive)]. The falling
//! body approaches terminal velocity sqrt(g / k) where k lumps the drag
//! parameters.
//!
//! Run with: cargo run -p fd-ode --example ballistic_drop

use fd_ode::{AdvanceOptions, FnSystem, Propagator};
use nalgebra::DVector;

const G: f64 = 9.80665;
// rho * cd * area / (2 * m) for a blunt store
const K_DRAG: f64 = 0.0049;

fn main() {
    tracing_subscriber::fmt::init();

    let mut body = FnSystem::new(2, |_t, y: &DVector<f64>, dydt: &mut DVector<f64>| {
        let v = y[1];
        dydt[0] = v;
        // Drag always opposes the motion.
        dydt[1] = -G - K_DRAG * v * v.abs();
    });

    let mut y = DVector::from_vec(vec![3000.0, 0.0]);
    let mut prop = Propagator::new(AdvanceOptions {
        eps: 1e-8,
        ..Default::default()
    });

    let terminal = (G / K_DRAG).sqrt();
    println!("terminal velocity: {terminal:.1} m/s");
    println!("{:>6} {:>10} {:>10}", "t (s)", "alt (m)", "v (m/s)");

    for second in 1..=20 {
        let t0 = (second - 1) as f64;
        prop.advance(&mut body, &mut y, t0, t0 + 1.0)
            .expect("drop should integrate cleanly");
        println!("{:>6} {:>10.1} {:>10.2}", second, y[0], y[1]);
    }
}
