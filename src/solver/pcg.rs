//! Preconditioned Conjugate Gradient (PCG) per Saad §9.2
//!
//! The relative residual `‖b − A x‖ / ‖b‖` drives convergence, so a warm
//! start in `x` is measured against the same reference as a cold one.

use crate::core::traits::{InnerProduct, MatVec};
use crate::error::KError;
use crate::preconditioner::Preconditioner;
use crate::solver::LinearSolver;
use crate::utils::convergence::{Convergence, SolveStats};

pub struct PcgSolver<T> {
    pub conv: Convergence<T>,
    pub monitor: Option<Box<dyn FnMut(usize, T)>>,
    pub residual_history: Vec<T>,
}

impl<T: Copy + num_traits::Float> PcgSolver<T> {
    pub fn new(tol: T, max_iters: usize) -> Self {
        Self {
            conv: Convergence { tol, max_iters },
            monitor: None,
            residual_history: Vec::new(),
        }
    }
    /// Called with `(iteration, relative residual)` after every iteration.
    pub fn with_monitor<F>(mut self, f: F) -> Self
    where
        F: FnMut(usize, T) + 'static,
    {
        self.monitor = Some(Box::new(f));
        self
    }

    fn record(&mut self, i: usize, rel: T) {
        if let Some(ref mut monitor) = self.monitor {
            monitor(i, rel);
        }
        self.residual_history.push(rel);
    }
}

impl<M, V, T> LinearSolver<M, V> for PcgSolver<T>
where
    M: MatVec<V>,
    (): InnerProduct<V, Scalar = T>,
    V: AsMut<[T]> + AsRef<[T]> + From<Vec<T>> + Clone,
    T: num_traits::Float + From<f64>,
{
    type Error = KError;
    type Scalar = T;

    fn solve(
        &mut self,
        a: &M,
        pc: Option<&dyn Preconditioner<M, V>>,
        b: &V,
        x: &mut V,
    ) -> Result<SolveStats<T>, KError> {
        self.residual_history.clear();
        let n = b.as_ref().len();
        let ip = ();
        let b_norm = ip.norm(b);
        if b_norm == T::zero() {
            x.as_mut().fill(T::zero());
            self.record(0, T::zero());
            return Ok(SolveStats { iterations: 0, final_residual: T::zero(), converged: true });
        }

        let mut x_vec = x.as_ref().to_vec();
        let mut r = {
            let mut tmp = V::from(vec![T::zero(); n]);
            a.matvec(&V::from(x_vec.clone()), &mut tmp);
            let r_vec = tmp.as_ref().iter().zip(b.as_ref()).map(|(&ax, &bi)| bi - ax).collect::<Vec<_>>();
            V::from(r_vec)
        };
        let (stop, mut stats) = self.conv.check(ip.norm(&r), b_norm, 0);
        self.record(0, stats.final_residual);
        if stop {
            return Ok(stats);
        }

        let mut z = V::from(vec![T::zero(); n]);
        if let Some(pc) = pc {
            pc.apply(&r, &mut z)?;
        } else {
            z.clone_from(&r);
        }
        let mut p = z.clone();
        let mut rz = ip.dot(&r, &z);
        let mut ap = V::from(vec![T::zero(); n]);
        for i in 0..self.conv.max_iters {
            a.matvec(&p, &mut ap);
            let p_dot_ap = ip.dot(&p, &ap);
            // Indefinite-matrix detection
            if p_dot_ap <= T::zero() {
                return Err(KError::IndefiniteMatrix);
            }
            let alpha = rz / p_dot_ap;
            for (xj, pj) in x_vec.iter_mut().zip(p.as_ref()) {
                *xj = *xj + alpha * *pj;
            }
            for (rj, apj) in r.as_mut().iter_mut().zip(ap.as_ref()) {
                *rj = *rj - alpha * *apj;
            }
            let (stop, s) = self.conv.check(ip.norm(&r), b_norm, i + 1);
            self.record(i + 1, s.final_residual);
            stats = s;
            if stop {
                break;
            }
            if let Some(pc) = pc {
                pc.apply(&r, &mut z)?;
            } else {
                z.clone_from(&r);
            }
            let rz_new = ip.dot(&r, &z);
            let beta = rz_new / rz;
            // Indefinite-preconditioner detection
            if beta < T::zero() {
                return Err(KError::IndefinitePreconditioner);
            }
            for (pj, zj) in p.as_mut().iter_mut().zip(z.as_ref()) {
                *pj = *zj + beta * *pj;
            }
            rz = rz_new;
        }
        *x = V::from(x_vec);
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::traits::MatVec;
    use crate::preconditioner::Preconditioner;

    #[derive(Clone)]
    struct DenseMat {
        data: Vec<Vec<f64>>,
    }
    impl MatVec<Vec<f64>> for DenseMat {
        fn matvec(&self, x: &Vec<f64>, y: &mut Vec<f64>) {
            for (i, row) in self.data.iter().enumerate() {
                y[i] = row.iter().zip(x.iter()).map(|(a, b)| a * b).sum();
            }
        }
    }
    struct IdentityPC;
    impl Preconditioner<DenseMat, Vec<f64>> for IdentityPC {
        fn apply(&self, r: &Vec<f64>, z: &mut Vec<f64>) -> Result<(), crate::error::KError> {
            z.copy_from_slice(r);
            Ok(())
        }
    }

    fn spd_2x2() -> DenseMat {
        DenseMat { data: vec![vec![4.0, 1.0], vec![1.0, 3.0]] }
    }

    #[test]
    fn pcg_solves_simple_spd() {
        // SPD system: [[4,1],[1,3]] x = [1,2]
        let a = spd_2x2();
        let b = vec![1.0, 2.0];
        let mut x = vec![0.0, 0.0];
        let mut solver = PcgSolver::new(1e-10, 20);
        let stats = solver.solve(&a, Some(&IdentityPC), &b, &mut x).unwrap();
        assert!(stats.converged, "PCG did not converge");
        assert!(stats.iterations <= 2);
        let expected = vec![0.09090909090909091, 0.6363636363636364];
        for (xi, ei) in x.iter().zip(expected.iter()) {
            assert!((xi - ei).abs() < 1e-8, "xi = {}, expected = {}", xi, ei);
        }
    }

    #[test]
    fn iteration_cap_reports_not_converged() {
        let n: usize = 20;
        let data = (0..n)
            .map(|i| {
                (0..n)
                    .map(|j| match i.abs_diff(j) {
                        0 => 2.0,
                        1 => -1.0,
                        _ => 0.0,
                    })
                    .collect()
            })
            .collect();
        let a = DenseMat { data };
        let b = vec![1.0; n];
        let mut x = vec![0.0; n];
        let mut solver = PcgSolver::new(1e-12, 3);
        let stats = solver.solve(&a, None, &b, &mut x).unwrap();
        assert!(!stats.converged);
        assert_eq!(stats.iterations, 3);
        assert!(x.iter().any(|&v| v != 0.0), "best iterate must be returned");
    }

    #[test]
    fn zero_rhs_returns_zero() {
        let a = spd_2x2();
        let mut x = vec![5.0, 5.0];
        let mut solver = PcgSolver::new(1e-10, 20);
        let stats = solver.solve(&a, None, &vec![0.0, 0.0], &mut x).unwrap();
        assert!(stats.converged);
        assert_eq!(stats.iterations, 0);
        assert_eq!(x, vec![0.0, 0.0]);
    }

    #[test]
    fn exact_initial_guess_needs_no_iterations() {
        let a = spd_2x2();
        let b = vec![1.0, 2.0];
        let mut x = vec![1.0 / 11.0, 7.0 / 11.0];
        let mut solver = PcgSolver::new(1e-10, 20);
        let stats = solver.solve(&a, None, &b, &mut x).unwrap();
        assert!(stats.converged);
        assert_eq!(stats.iterations, 0);
    }

    #[test]
    fn indefinite_matrix_is_detected() {
        let a = DenseMat { data: vec![vec![1.0, 0.0], vec![0.0, -1.0]] };
        let mut x = vec![0.0, 0.0];
        let mut solver = PcgSolver::new(1e-10, 20);
        let err = solver.solve(&a, None, &vec![0.0, 1.0], &mut x);
        assert!(matches!(err, Err(KError::IndefiniteMatrix)));
    }

    #[test]
    fn monitor_sees_every_iteration() {
        use std::cell::RefCell;
        use std::rc::Rc;
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let a = spd_2x2();
        let mut x = vec![0.0, 0.0];
        let mut solver = PcgSolver::new(1e-10, 20).with_monitor(move |i, _| sink.borrow_mut().push(i));
        let stats = solver.solve(&a, None, &vec![1.0, 2.0], &mut x).unwrap();
        assert_eq!(seen.borrow().len(), stats.iterations + 1);
        assert_eq!(solver.residual_history.len(), stats.iterations + 1);
    }

    #[test]
    fn history_restarts_with_each_solve() {
        let a = spd_2x2();
        let mut solver = PcgSolver::new(1e-10, 20);
        let mut x = vec![0.0, 0.0];
        solver.solve(&a, None, &vec![1.0, 2.0], &mut x).unwrap();
        let mut y = vec![0.0, 0.0];
        let stats = solver.solve(&a, None, &vec![3.0, -1.0], &mut y).unwrap();
        assert_eq!(solver.residual_history.len(), stats.iterations + 1);
    }
}
