//! PCG against a dense direct solve, with each baseline preconditioner.
//!
//! Random sparse SPD systems are assembled in CSR form; the PCG solution is
//! compared elementwise with faer's Cholesky factorization of the dense copy.

use approx::assert_abs_diff_eq;
use faer::linalg::solvers::{Llt, SolveCore};
use pod2g::{CsrMatrix, KspContext, LinearSolver, MatVec, PC, PcgSolver, SmootherConfig, SweepDirection};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::cell::Cell;
use std::rc::Rc;

/// Random diagonally dominant SPD matrix with a banded pattern.
fn random_spd(n: usize, seed: u64) -> (CsrMatrix<f64>, Vec<f64>) {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut t = Vec::new();
    let mut row_sum = vec![0.0; n];
    for i in 0..n {
        for off in 1..4 {
            if i + off < n {
                let v: f64 = -rng.gen_range(0.1..1.0);
                t.push((i, i + off, v));
                t.push((i + off, i, v));
                row_sum[i] += v.abs();
                row_sum[i + off] += v.abs();
            }
        }
    }
    for (i, s) in row_sum.iter().enumerate() {
        t.push((i, i, s + rng.gen_range(0.01..0.5)));
    }
    let b = (0..n).map(|_| rng.gen_range(-1.0..1.0)).collect();
    (CsrMatrix::from_triplets(n, n, &t).unwrap(), b)
}

fn direct(a: &CsrMatrix<f64>, b: &[f64]) -> Vec<f64> {
    let dense = a.to_dense();
    let mut x = b.to_vec();
    let llt = Llt::new(dense.as_ref(), faer::Side::Lower).expect("SPD matrix");
    let n = x.len();
    llt.solve_in_place_with_conj(faer::Conj::No, faer::MatMut::from_column_major_slice_mut(&mut x, n, 1));
    assert!(x.iter().all(|v| v.is_finite()));
    let mut ax = vec![0.0; n];
    a.matvec(&x, &mut ax);
    for (r, bi) in ax.iter().zip(b) {
        assert_abs_diff_eq!(*r, *bi, epsilon = 1e-10);
    }
    x
}

/// Every baseline preconditioner reaches the direct solution.
#[test]
fn pcg_vs_direct_for_each_baseline() {
    let (a, b) = random_spd(60, 7);
    let x_direct = direct(&a, &b);
    let symmetric = SmootherConfig::default();
    let two_sweeps = SmootherConfig { sweep: SweepDirection::SYMMETRIC, iterations: 2 };
    for pc in [PC::Identity, PC::Jacobi, PC::GaussSeidel(symmetric), PC::GaussSeidel(two_sweeps)] {
        let ksp = KspContext::new(1e-12, 2.0).with_baseline(pc);
        let out = ksp.solve(&a, &b, None, None).unwrap();
        assert!(out.stats.converged, "{pc:?} did not converge");
        for i in 0..b.len() {
            assert_abs_diff_eq!(out.solution[i], x_direct[i], epsilon = 1e-8);
        }
    }
}

/// Symmetric Gauss–Seidel needs no more iterations than Jacobi here.
#[test]
fn gauss_seidel_beats_jacobi() {
    let (a, b) = random_spd(80, 11);
    let jacobi = KspContext::new(1e-8, 2.0).solve(&a, &b, None, None).unwrap();
    let gs = KspContext::new(1e-8, 2.0)
        .with_baseline(PC::GaussSeidel(SmootherConfig::default()))
        .solve(&a, &b, None, None)
        .unwrap();
    assert!(gs.stats.iterations <= jacobi.stats.iterations);
}

/// The monitor sees every iteration and the history ends below tolerance.
#[test]
fn monitor_and_history() {
    let (a, b) = random_spd(30, 3);
    let seen = Rc::new(Cell::new(0usize));
    let counter = Rc::clone(&seen);
    let mut solver = PcgSolver::new(1e-10, 100).with_monitor(move |_, _| counter.set(counter.get() + 1));
    let mut x = vec![0.0; b.len()];
    let stats = LinearSolver::<CsrMatrix<f64>, Vec<f64>>::solve(&mut solver, &a, None, &b, &mut x).unwrap();
    assert!(stats.converged);
    assert!(*solver.residual_history.last().unwrap() <= 1e-10);
    assert_eq!(seen.get(), stats.iterations + 1);
    assert_eq!(solver.residual_history.len(), stats.iterations + 1);
}

/// A warm start at the solution converges immediately.
#[test]
fn initial_guess_at_solution() {
    let (a, b) = random_spd(25, 5);
    let x = direct(&a, &b);
    let out = KspContext::new(1e-8, 1.0).solve(&a, &b, None, Some(&x)).unwrap();
    assert!(out.stats.converged);
    assert_eq!(out.stats.iterations, 0);
}
