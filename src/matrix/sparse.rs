//! Compressed sparse row storage for assembled system matrices.
//!
//! `CsrMatrix` validates its structure on construction, can be assembled from
//! unsorted `(row, col, value)` triplets (duplicates are summed, as finite
//! element assembly produces them), and provides the row-wise kernels the
//! smoothers need: SpMV, diagonal extraction and in-place Gauss–Seidel sweeps.

use crate::core::traits::{Diagonal, MatVec};
use crate::error::KError;
use num_traits::Float;

/// A read‐only sparse matrix supporting y = A * x.
pub trait SparseMatrix<T> {
    /// Number of rows.
    fn nrows(&self) -> usize;
    /// Number of columns.
    fn ncols(&self) -> usize;
    /// Compute y = A * x.  `x.len() == ncols()`, `y.len() == nrows()`.
    fn spmv(&self, x: &[T], y: &mut [T]);
}

#[derive(Clone, Debug)]
pub struct CsrMatrix<T> {
    nrows: usize,
    ncols: usize,
    row_ptr: Vec<usize>,
    col_idx: Vec<usize>,
    values: Vec<T>,
}

impl<T: Float> CsrMatrix<T> {
    /// Build a CSR from raw row‐ptr, col‐idx, and values.
    ///
    /// Column indices within a row must be strictly increasing.
    pub fn from_csr(
        nrows: usize,
        ncols: usize,
        row_ptr: Vec<usize>,
        col_idx: Vec<usize>,
        values: Vec<T>,
    ) -> Result<Self, KError> {
        if row_ptr.len() != nrows + 1 {
            return Err(KError::InvalidMatrix(format!(
                "row_ptr has length {}, expected {}",
                row_ptr.len(),
                nrows + 1
            )));
        }
        if row_ptr[0] != 0 || row_ptr[nrows] != col_idx.len() || col_idx.len() != values.len() {
            return Err(KError::InvalidMatrix(
                "row_ptr, col_idx and values are inconsistent".to_string(),
            ));
        }
        for i in 0..nrows {
            let (start, end) = (row_ptr[i], row_ptr[i + 1]);
            if start > end {
                return Err(KError::InvalidMatrix(format!("row_ptr decreases at row {i}")));
            }
            let row = &col_idx[start..end];
            if row.iter().any(|&j| j >= ncols) {
                return Err(KError::InvalidMatrix(format!("column index out of range in row {i}")));
            }
            if row.windows(2).any(|w| w[0] >= w[1]) {
                return Err(KError::InvalidMatrix(format!(
                    "column indices of row {i} are not strictly increasing"
                )));
            }
        }
        Ok(Self { nrows, ncols, row_ptr, col_idx, values })
    }

    /// Assemble from `(row, col, value)` triplets, summing duplicates.
    pub fn from_triplets(
        nrows: usize,
        ncols: usize,
        triplets: &[(usize, usize, T)],
    ) -> Result<Self, KError> {
        if let Some(&(i, j, _)) = triplets.iter().find(|&&(i, j, _)| i >= nrows || j >= ncols) {
            return Err(KError::InvalidMatrix(format!(
                "triplet ({i}, {j}) outside a {nrows}x{ncols} matrix"
            )));
        }
        let mut sorted: Vec<(usize, usize, T)> = triplets.to_vec();
        sorted.sort_unstable_by(|a, b| (a.0, a.1).cmp(&(b.0, b.1)));

        let mut row_ptr = vec![0; nrows + 1];
        let mut col_idx = Vec::with_capacity(sorted.len());
        let mut values: Vec<T> = Vec::with_capacity(sorted.len());
        let mut last: Option<(usize, usize)> = None;
        for (i, j, v) in sorted {
            if last == Some((i, j)) {
                if let Some(acc) = values.last_mut() {
                    *acc = *acc + v;
                }
                continue;
            }
            col_idx.push(j);
            values.push(v);
            row_ptr[i + 1] += 1;
            last = Some((i, j));
        }
        for i in 0..nrows {
            row_ptr[i + 1] += row_ptr[i];
        }
        Self::from_csr(nrows, ncols, row_ptr, col_idx, values)
    }

    pub fn nrows(&self) -> usize {
        self.nrows
    }

    pub fn ncols(&self) -> usize {
        self.ncols
    }

    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    pub fn row_ptr(&self) -> &[usize] {
        &self.row_ptr
    }

    pub fn col_idx(&self) -> &[usize] {
        &self.col_idx
    }

    pub fn values(&self) -> &[T] {
        &self.values
    }

    /// Column indices and values of row `i`.
    pub fn row(&self, i: usize) -> (&[usize], &[T]) {
        let range = self.row_ptr[i]..self.row_ptr[i + 1];
        (&self.col_idx[range.clone()], &self.values[range])
    }

    /// Entry `(i, j)`, zero when not stored.
    pub fn get(&self, i: usize, j: usize) -> T {
        let (cols, vals) = self.row(i);
        match cols.binary_search(&j) {
            Ok(pos) => vals[pos],
            Err(_) => T::zero(),
        }
    }

    /// One forward Gauss–Seidel sweep on `A x = b`, updating `x` in place.
    /// `inv_diag[i]` must hold `1 / a_ii`.
    pub fn gauss_seidel_forward(&self, b: &[T], x: &mut [T], inv_diag: &[T]) {
        for i in 0..self.nrows {
            self.relax_row(i, b, x, inv_diag);
        }
    }

    /// One backward Gauss–Seidel sweep on `A x = b`, updating `x` in place.
    pub fn gauss_seidel_backward(&self, b: &[T], x: &mut [T], inv_diag: &[T]) {
        for i in (0..self.nrows).rev() {
            self.relax_row(i, b, x, inv_diag);
        }
    }

    #[inline]
    fn relax_row(&self, i: usize, b: &[T], x: &mut [T], inv_diag: &[T]) {
        let (cols, vals) = self.row(i);
        let mut sigma = T::zero();
        for (&j, &aij) in cols.iter().zip(vals) {
            sigma = sigma + aij * x[j];
        }
        // sigma includes a_ii * x_i, so this is x_i + (b_i - (A x)_i) / a_ii
        x[i] = x[i] + (b[i] - sigma) * inv_diag[i];
    }
}

impl CsrMatrix<f64> {
    /// Dense copy, intended for small matrices in tests.
    pub fn to_dense(&self) -> faer::Mat<f64> {
        let mut dense = faer::Mat::<f64>::zeros(self.nrows, self.ncols);
        for i in 0..self.nrows {
            let (cols, vals) = self.row(i);
            for (&j, &v) in cols.iter().zip(vals) {
                dense[(i, j)] = v;
            }
        }
        dense
    }
}

impl<T: Float + Send + Sync> SparseMatrix<T> for CsrMatrix<T> {
    fn nrows(&self) -> usize {
        self.nrows
    }
    fn ncols(&self) -> usize {
        self.ncols
    }
    fn spmv(&self, x: &[T], y: &mut [T]) {
        assert_eq!(x.len(), self.ncols);
        assert_eq!(y.len(), self.nrows);
        #[cfg(feature = "rayon")]
        {
            self.spmv_parallel(x, y);
        }
        #[cfg(not(feature = "rayon"))]
        {
            for (i, yi) in y.iter_mut().enumerate() {
                *yi = self.row_dot(i, x);
            }
        }
    }
}

impl<T: Float> CsrMatrix<T> {
    #[inline]
    fn row_dot(&self, i: usize, x: &[T]) -> T {
        let (cols, vals) = self.row(i);
        cols.iter()
            .zip(vals)
            .fold(T::zero(), |acc, (&j, &v)| acc + v * x[j])
    }
}

#[cfg(feature = "rayon")]
use rayon::prelude::*;

#[cfg(feature = "rayon")]
impl<T: Float + Send + Sync> CsrMatrix<T> {
    /// Row-parallel SpMV.
    fn spmv_parallel(&self, x: &[T], y: &mut [T]) {
        assert_eq!(x.len(), self.ncols);
        assert_eq!(y.len(), self.nrows);
        y.par_iter_mut()
            .enumerate()
            .for_each(|(i, yi)| *yi = self.row_dot(i, x));
    }
}

impl<T: Float + Send + Sync> MatVec<Vec<T>> for CsrMatrix<T> {
    fn matvec(&self, x: &Vec<T>, y: &mut Vec<T>) {
        self.spmv(x, y);
    }
}

impl<T: Float> Diagonal<T> for CsrMatrix<T> {
    fn diagonal(&self) -> Vec<T> {
        (0..self.nrows.min(self.ncols)).map(|i| self.get(i, i)).collect()
    }
}
