//! Cash-Karp 5(4) embedded Runge-Kutta coefficients.
//!
//! Reference: J. R. Cash, A. H. Karp, "A variable order Runge-Kutta method
//! for initial value problems with rapidly varying right-hand sides",
//! ACM TOMS 16 (1990).

/// Number of stages in the Cash-Karp pair.
pub(crate) const STAGES: usize = 6;

/// Nodes: stage i is evaluated at t + C[i] * h.
pub(crate) const C: [f64; STAGES] = [0.0, 1.0 / 5.0, 3.0 / 10.0, 3.0 / 5.0, 1.0, 7.0 / 8.0];

/// Stage coupling matrix (strictly lower triangular; row i uses A[i][0..i]).
pub(crate) const A: [[f64; STAGES - 1]; STAGES] = [
    [0.0, 0.0, 0.0, 0.0, 0.0],
    [1.0 / 5.0, 0.0, 0.0, 0.0, 0.0],
    [3.0 / 40.0, 9.0 / 40.0, 0.0, 0.0, 0.0],
    [3.0 / 10.0, -9.0 / 10.0, 6.0 / 5.0, 0.0, 0.0],
    [-11.0 / 54.0, 5.0 / 2.0, -70.0 / 27.0, 35.0 / 27.0, 0.0],
    [
        1631.0 / 55296.0,
        175.0 / 512.0,
        575.0 / 13824.0,
        44275.0 / 110592.0,
        253.0 / 4096.0,
    ],
];

/// Fifth-order solution weights.
pub(crate) const B: [f64; STAGES] = [
    37.0 / 378.0,
    0.0,
    250.0 / 621.0,
    125.0 / 594.0,
    0.0,
    512.0 / 1771.0,
];

/// Error weights: difference between the fifth- and embedded fourth-order
/// solutions, so yerr = h * sum(B_ERR[i] * k[i]).
pub(crate) const B_ERR: [f64; STAGES] = [
    37.0 / 378.0 - 2825.0 / 27648.0,
    0.0,
    250.0 / 621.0 - 18575.0 / 48384.0,
    125.0 / 594.0 - 13525.0 / 55296.0,
    -277.0 / 14336.0,
    512.0 / 1771.0 - 1.0 / 4.0,
];
