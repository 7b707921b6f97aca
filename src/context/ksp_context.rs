//! The solve kernel: PCG on an assembled system with run-wide settings.
//!
//! `KspContext` owns the stopping criteria (relative tolerance and an
//! iteration cap proportional to the matrix order) and the baseline
//! preconditioner. `solve` validates shapes, runs PCG and hands back the
//! solution together with its diagnostics; nothing about the last solve is
//! kept in the context.
//!
//! # References
//! - Saad, Y. (2003). Iterative Methods for Sparse Linear Systems. SIAM.

use crate::config::Pod2gOptions;
use crate::context::pc_context::PC;
use crate::error::KError;
use crate::matrix::CsrMatrix;
use crate::preconditioner::Preconditioner;
use crate::solver::{LinearSolver, PcgSolver};
use crate::utils::convergence::{SolveStats, max_iterations_from_fraction};

/// Solution of one system and how it was obtained.
#[derive(Clone, Debug)]
pub struct SolveOutcome {
    pub solution: Vec<f64>,
    pub stats: SolveStats<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KspContext {
    /// Relative residual tolerance.
    pub tol: f64,
    /// Iteration cap as a fraction of the matrix order.
    pub max_it_fraction: f64,
    /// Used when `solve` receives no preconditioner.
    pub baseline: PC,
}

impl Default for KspContext {
    fn default() -> Self {
        Self { tol: 1e-6, max_it_fraction: 0.5, baseline: PC::Jacobi }
    }
}

impl KspContext {
    pub fn new(tol: f64, max_it_fraction: f64) -> Self {
        Self { tol, max_it_fraction, ..Self::default() }
    }

    pub fn with_baseline(mut self, pc: PC) -> Self {
        self.baseline = pc;
        self
    }

    pub fn from_options(opts: &Pod2gOptions) -> Self {
        Self {
            tol: opts.tolerance,
            max_it_fraction: opts.max_iterations_fraction,
            baseline: opts.baseline,
        }
    }

    pub fn max_iterations(&self, order: usize) -> usize {
        max_iterations_from_fraction(order, self.max_it_fraction)
    }

    /// Solve `A x = b` with PCG.
    ///
    /// `pc = None` selects the baseline preconditioner. `x0` is the initial
    /// guess (zero when absent). Hitting the iteration cap is not an error:
    /// the best iterate comes back with `stats.converged == false`.
    pub fn solve(
        &self,
        a: &CsrMatrix<f64>,
        b: &[f64],
        pc: Option<&dyn Preconditioner<CsrMatrix<f64>, Vec<f64>>>,
        x0: Option<&[f64]>,
    ) -> Result<SolveOutcome, KError> {
        let n = a.nrows();
        if a.ncols() != n {
            return Err(KError::InvalidMatrix(format!("{}x{} matrix is not square", n, a.ncols())));
        }
        if b.len() != n {
            return Err(KError::DimensionMismatch { expected: n, found: b.len() });
        }
        let mut x = match x0 {
            Some(x0) if x0.len() != n => {
                return Err(KError::DimensionMismatch { expected: n, found: x0.len() });
            }
            Some(x0) => x0.to_vec(),
            None => vec![0.0; n],
        };

        let baseline;
        let pc = match pc {
            Some(pc) => pc,
            None => {
                baseline = self.baseline.build(a)?;
                baseline.as_ref()
            }
        };

        let mut solver = PcgSolver::new(self.tol, self.max_iterations(n));
        let stats = solver.solve(a, Some(pc), &b.to_vec(), &mut x)?;
        log::debug!(
            "Number of PCG iterations = {}. Dofs = {}. Relative residual = {:.3e}.",
            stats.iterations,
            n,
            stats.final_residual
        );
        if !stats.converged {
            log::warn!(
                "PCG stopped at the iteration cap ({}) with relative residual {:.3e} > {:.1e}",
                stats.iterations,
                stats.final_residual,
                self.tol
            );
        }
        Ok(SolveOutcome { solution: x, stats })
    }
}
