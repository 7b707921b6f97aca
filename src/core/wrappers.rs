//! Trait implementations for `faer::Mat` and `Vec<T>`.
//!
//! These let dense faer matrices and plain vectors flow through the generic
//! solver and preconditioner code. The inner product uses Rayon when the
//! `rayon` feature is enabled.

use crate::core::traits::{Diagonal, InnerProduct, MatVec};
use faer::Mat;
use num_traits::Float;

/// Computes `y = A * x` for a dense faer matrix.
impl<T: Float> MatVec<Vec<T>> for Mat<T> {
    fn matvec(&self, x: &Vec<T>, y: &mut Vec<T>) {
        assert_eq!(self.nrows(), y.len(), "Output vector y has incorrect length");
        assert_eq!(self.ncols(), x.len(), "Input vector x has incorrect length");
        for i in 0..self.nrows() {
            y[i] = T::zero();
            for j in 0..self.ncols() {
                y[i] = y[i] + self[(i, j)] * x[j];
            }
        }
    }
}

impl<T: Float> Diagonal<T> for Mat<T> {
    fn diagonal(&self) -> Vec<T> {
        let n = self.nrows().min(self.ncols());
        (0..n).map(|i| self[(i, i)]).collect()
    }
}

#[cfg(feature = "rayon")]
const DOT_CHUNK: usize = 4096;

fn serial_dot<T: Float>(x: &[T], y: &[T]) -> T {
    x.iter()
        .zip(y.iter())
        .map(|(xi, yi)| *xi * *yi)
        .fold(T::zero(), |acc, v| acc + v)
}

/// Inner product and norm for vectors, with optional Rayon parallelism.
impl<T: Float + From<f64> + Send + Sync> InnerProduct<Vec<T>> for () {
    type Scalar = T;
    /// Computes the dot product of two vectors: `x^T y`.
    ///
    /// The parallel path sums fixed-size chunks and then adds the partial
    /// sums in order, so the result does not depend on thread scheduling.
    fn dot(&self, x: &Vec<T>, y: &Vec<T>) -> T {
        assert_eq!(x.len(), y.len(), "Vectors must have the same length");
        #[cfg(feature = "rayon")]
        {
            use rayon::prelude::*;
            x.as_slice()
                .par_chunks(DOT_CHUNK)
                .zip(y.as_slice().par_chunks(DOT_CHUNK))
                .map(|(xc, yc)| serial_dot(xc, yc))
                .collect::<Vec<T>>()
                .into_iter()
                .fold(T::zero(), |acc, v| acc + v)
        }
        #[cfg(not(feature = "rayon"))]
        {
            serial_dot(x, y)
        }
    }
    /// Computes the Euclidean norm of a vector: `||x||_2`.
    fn norm(&self, x: &Vec<T>) -> T {
        self.dot(x, x).sqrt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solver::{LinearSolver, PcgSolver};
    use approx::assert_abs_diff_eq;

    #[test]
    fn dense_matvec_and_diagonal() {
        let a = Mat::from_fn(3, 3, |i, j| (1 + i + 2 * j) as f64);
        let x = vec![1.0, -1.0, 2.0];
        let mut y = vec![0.0; 3];
        a.matvec(&x, &mut y);
        for i in 0..3 {
            let expected: f64 = (0..3).map(|j| a[(i, j)] * x[j]).sum();
            assert_abs_diff_eq!(y[i], expected, epsilon = 1e-12);
        }
        assert_eq!(Diagonal::diagonal(&a), vec![1.0, 4.0, 7.0]);
    }

    #[test]
    fn dot_and_norm() {
        let x = vec![1.0, 2.0, 3.0];
        let y = vec![4.0, -5.0, 6.0];
        let ip = ();
        assert_abs_diff_eq!(ip.dot(&x, &y), 12.0, epsilon = 1e-12);
        assert_abs_diff_eq!(ip.norm(&x), 14.0_f64.sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn long_dot_is_exact_on_integers() {
        let n = 10_000;
        let x: Vec<f64> = (0..n).map(|i| (i % 7) as f64).collect();
        let y = vec![2.0; n];
        let expected: f64 = x.iter().map(|v| 2.0 * v).sum();
        assert_eq!(().dot(&x, &y), expected);
    }

    #[test]
    fn pcg_runs_on_dense_faer_matrix() {
        let a = Mat::from_fn(4, 4, |i, j| if i == j { 4.0 } else { 1.0 });
        let b = vec![1.0; 4];
        let mut x = vec![0.0; 4];
        let stats = PcgSolver::new(1e-12, 10).solve(&a, None, &b, &mut x).unwrap();
        assert!(stats.converged);
        for xi in x {
            assert_abs_diff_eq!(xi, 1.0 / 7.0, epsilon = 1e-10);
        }
    }
}
