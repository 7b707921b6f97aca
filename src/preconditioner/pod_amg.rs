//! Two-level preconditioner with a POD coarse space (POD-AMG).
//!
//! This mirrors one algebraic multigrid cycle where the prolongation is the
//! POD basis `B` instead of an aggregation-based interpolation:
//!
//! ```text
//! z = 0
//! repeat cycles:
//!     z  ← pre-smooth(A, r, z)                 forward Gauss–Seidel
//!     rc = Bᵀ (r − A z)
//!     z  ← z + B (BᵀAB)⁻¹ rc                   exact coarse solve
//!     z  ← post-smooth(A, r, z)                backward Gauss–Seidel
//! ```
//!
//! [`PodAmgState`] holds what is fixed for a whole run (basis, smoother
//! configuration, cycle count). Binding it to a system matrix with
//! [`PodAmg::new`] computes the Galerkin coarse matrix and its LU factors;
//! the state itself is never mutated, so one `Arc<PodAmgState>` serves every
//! accelerated solve.

use crate::error::KError;
use crate::matrix::{CsrMatrix, SparseMatrix, gemv, gemv_transpose};
use crate::preconditioner::{GaussSeidel, Preconditioner, SmootherConfig};
use crate::reduction::PodBasis;
use faer::linalg::solvers::{FullPivLu, SolveCore};
use faer::{Conj, Mat, MatMut};

/// Run-wide POD-AMG configuration, built once from the finalized basis.
#[derive(Debug)]
pub struct PodAmgState {
    basis: PodBasis,
    smoother: SmootherConfig,
    cycles: usize,
}

impl PodAmgState {
    pub fn new(basis: PodBasis, smoother: SmootherConfig, cycles: usize) -> Result<Self, KError> {
        smoother.validate()?;
        if cycles == 0 {
            return Err(KError::Configuration("POD-AMG needs at least one cycle".into()));
        }
        Ok(Self { basis, smoother, cycles })
    }

    pub fn basis(&self) -> &PodBasis {
        &self.basis
    }

    pub fn smoother(&self) -> SmootherConfig {
        self.smoother
    }

    pub fn cycles(&self) -> usize {
        self.cycles
    }
}

/// POD-AMG bound to one system matrix.
pub struct PodAmg<'a> {
    state: &'a PodAmgState,
    a: &'a CsrMatrix<f64>,
    smoother: GaussSeidel<'a>,
    coarse: FullPivLu<f64>,
}

impl<'a> PodAmg<'a> {
    pub fn new(state: &'a PodAmgState, a: &'a CsrMatrix<f64>) -> Result<Self, KError> {
        let n = a.nrows();
        if a.ncols() != n {
            return Err(KError::InvalidMatrix(format!("{}x{} matrix is not square", n, a.ncols())));
        }
        if state.basis.dof_count() != n {
            return Err(KError::DimensionMismatch { expected: state.basis.dof_count(), found: n });
        }
        let smoother = GaussSeidel::for_matrix(state.smoother, a)?;
        let coarse_matrix = galerkin_coarse_matrix(a, state.basis.modes());
        for i in 0..coarse_matrix.nrows() {
            if !(coarse_matrix[(i, i)] > 0.0) {
                return Err(KError::FactorError(format!(
                    "coarse matrix BᵀAB has non-positive diagonal entry at {i}"
                )));
            }
        }
        let coarse = FullPivLu::new(coarse_matrix.as_ref());
        Ok(Self { state, a, smoother, coarse })
    }

    pub fn coarse_dim(&self) -> usize {
        self.state.basis.rank()
    }

    /// z ← z + B (BᵀAB)⁻¹ Bᵀ (r − A z)
    fn coarse_correction(&self, r: &[f64], z: &mut [f64]) {
        let n = r.len();
        let modes = self.state.basis.modes();
        let mut res = vec![0.0; n];
        self.a.spmv(z, &mut res);
        for (ri, &bi) in res.iter_mut().zip(r) {
            *ri = bi - *ri;
        }
        let k = self.coarse_dim();
        let mut rc = vec![0.0; k];
        gemv_transpose(modes, &res, &mut rc);
        let rc_mat = MatMut::from_column_major_slice_mut(&mut rc, k, 1);
        self.coarse.solve_in_place_with_conj(Conj::No, rc_mat);
        let mut correction = res;
        gemv(modes, &rc, &mut correction);
        for (zi, ci) in z.iter_mut().zip(correction) {
            *zi += ci;
        }
    }
}

/// `BᵀAB`, computed one column of `AB` at a time.
fn galerkin_coarse_matrix(a: &CsrMatrix<f64>, modes: &Mat<f64>) -> Mat<f64> {
    let (n, k) = (modes.nrows(), modes.ncols());
    let mut coarse = Mat::<f64>::zeros(k, k);
    let mut col = vec![0.0; n];
    let mut a_col = vec![0.0; n];
    let mut proj = vec![0.0; k];
    for j in 0..k {
        for (i, c) in col.iter_mut().enumerate() {
            *c = modes[(i, j)];
        }
        a.spmv(&col, &mut a_col);
        gemv_transpose(modes, &a_col, &mut proj);
        for i in 0..k {
            coarse[(i, j)] = proj[i];
        }
    }
    // symmetrize round-off
    for i in 0..k {
        for j in (i + 1)..k {
            let avg = 0.5 * (coarse[(i, j)] + coarse[(j, i)]);
            coarse[(i, j)] = avg;
            coarse[(j, i)] = avg;
        }
    }
    coarse
}

impl Preconditioner<CsrMatrix<f64>, Vec<f64>> for PodAmg<'_> {
    fn apply(&self, r: &Vec<f64>, z: &mut Vec<f64>) -> Result<(), KError> {
        z.fill(0.0);
        for _ in 0..self.state.cycles {
            self.smoother.pre_smooth(r, z)?;
            self.coarse_correction(r, z);
            self.smoother.post_smooth(r, z)?;
        }
        Ok(())
    }
}
