//! Convergence tracking & tolerance checks for iterative solvers.

/// Stopping criteria & stats.
#[derive(Clone, Debug)]
pub struct Convergence<T> {
    pub tol: T,
    pub max_iters: usize,
}

/// Diagnostics of one solve, returned alongside the solution.
#[derive(Clone, Debug, PartialEq)]
pub struct SolveStats<T> {
    pub iterations: usize,
    /// Final residual relative to the reference norm (‖b‖).
    pub final_residual: T,
    pub converged: bool,
}

impl<T: Copy + num_traits::Float> Convergence<T> {
    /// Returns (should_stop, stats) given current `res_norm` and iteration `i`.
    ///
    /// Hitting the iteration cap stops the solve but leaves `converged` false.
    pub fn check(&self, res_norm: T, ref_norm: T, i: usize) -> (bool, SolveStats<T>) {
        let rel = res_norm / ref_norm;
        let converged = rel <= self.tol;
        (
            converged || i >= self.max_iters,
            SolveStats {
                iterations: i,
                final_residual: rel,
                converged,
            },
        )
    }
}

/// Iteration cap expressed as a fraction of the matrix order, never below one.
pub fn max_iterations_from_fraction(order: usize, fraction: f64) -> usize {
    ((fraction * order as f64).ceil() as usize).max(1)
}
