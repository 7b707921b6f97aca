//! Proper orthogonal decomposition of solution snapshots.
//!
//! The basis is made of the dominant left singular vectors of the raw
//! (uncentered) snapshot matrix, computed with a thin SVD from faer. Columns
//! are ordered by decreasing singular value.

use crate::error::KError;
use crate::matrix::{gemv, gemv_transpose, mat_from_columns};
use faer::Mat;

/// Singular values at or below this fraction of the largest one count as zero.
pub const ZERO_SINGULAR_VALUE_TOL: f64 = 1e-10;

/// Orthonormal reduced basis, `dofs × rank`.
#[derive(Clone, Debug)]
pub struct PodBasis {
    modes: Mat<f64>,
    singular_values: Vec<f64>,
}

impl PodBasis {
    pub fn rank(&self) -> usize {
        self.modes.ncols()
    }

    pub fn dof_count(&self) -> usize {
        self.modes.nrows()
    }

    pub fn modes(&self) -> &Mat<f64> {
        &self.modes
    }

    /// Singular values of the retained modes, largest first.
    pub fn singular_values(&self) -> &[f64] {
        &self.singular_values
    }

    /// Reduced coordinates `Bᵀ u`.
    pub fn project(&self, u: &[f64]) -> Vec<f64> {
        let mut q = vec![0.0; self.rank()];
        gemv_transpose(&self.modes, u, &mut q);
        q
    }

    /// Full-space vector `B q`.
    pub fn lift(&self, q: &[f64]) -> Vec<f64> {
        let mut u = vec![0.0; self.dof_count()];
        gemv(&self.modes, q, &mut u);
        u
    }

    /// Largest entry of `|BᵀB − I|`.
    pub fn orthonormality_error(&self) -> f64 {
        let bt = self.modes.transpose().to_owned();
        let gram = &bt * &self.modes;
        let mut err = 0.0_f64;
        for i in 0..gram.nrows() {
            for j in 0..gram.ncols() {
                let target = if i == j { 1.0 } else { 0.0 };
                err = err.max((gram[(i, j)] - target).abs());
            }
        }
        err
    }
}

/// Reduces snapshots to a [`PodBasis`].
#[derive(Clone, Copy, Debug)]
pub struct PodBasisBuilder {
    requested_rank: usize,
    keep_only_nonzero: bool,
}

impl PodBasisBuilder {
    pub fn new(requested_rank: usize) -> Self {
        Self { requested_rank, keep_only_nonzero: true }
    }

    /// Drop components whose singular value is numerically zero.
    pub fn keep_only_nonzero(mut self, flag: bool) -> Self {
        self.keep_only_nonzero = flag;
        self
    }

    /// Builds the basis from snapshot vectors, one per column.
    pub fn build_from_snapshots(&self, snapshots: &[Vec<f64>]) -> Result<PodBasis, KError> {
        self.build(&mat_from_columns(snapshots)?)
    }

    /// Builds the basis from a `dofs × samples` snapshot matrix.
    pub fn build(&self, snapshots: &Mat<f64>) -> Result<PodBasis, KError> {
        if self.requested_rank == 0 {
            return Err(KError::Configuration("requested POD rank must be positive".into()));
        }
        if snapshots.ncols() == 0 {
            return Err(KError::Configuration("snapshot matrix has no columns".into()));
        }
        if snapshots.nrows() == 0 {
            return Err(KError::Configuration("snapshot matrix has no rows".into()));
        }
        if (0..snapshots.ncols()).any(|j| (0..snapshots.nrows()).any(|i| !snapshots[(i, j)].is_finite())) {
            return Err(KError::Configuration("snapshot matrix contains non-finite entries".into()));
        }

        let svd = snapshots
            .as_ref()
            .thin_svd()
            .map_err(|e| KError::FactorError(format!("thin SVD of snapshots failed: {e:?}")))?;
        let u = svd.U();
        let s = svd.S().column_vector();

        let mut order: Vec<usize> = (0..s.nrows()).collect();
        order.sort_by(|&i, &j| s[j].total_cmp(&s[i]));
        let sigma_max = order.first().map_or(0.0, |&i| s[i]);

        let mut keep = order;
        keep.truncate(self.requested_rank);
        if self.keep_only_nonzero {
            keep.retain(|&i| s[i] > ZERO_SINGULAR_VALUE_TOL * sigma_max);
        }
        if keep.is_empty() {
            return Err(KError::Configuration(
                "snapshots contain no numerically nonzero component".into(),
            ));
        }

        let modes = Mat::from_fn(u.nrows(), keep.len(), |i, j| u[(i, keep[j])]);
        let singular_values = keep.iter().map(|&i| s[i]).collect();
        log::debug!(
            "POD basis: {} snapshots, requested rank {}, effective rank {}",
            snapshots.ncols(),
            self.requested_rank,
            modes.ncols()
        );
        Ok(PodBasis { modes, singular_values })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshots() -> Vec<Vec<f64>> {
        // three independent directions in R^6, plus a dependent fourth column
        let a = vec![1.0, 0.0, 2.0, 0.0, 1.0, 0.0];
        let b = vec![0.0, 1.0, 0.0, 1.0, 0.0, 3.0];
        let c = vec![1.0, 1.0, 1.0, -1.0, 0.0, 0.5];
        let d: Vec<f64> = a.iter().zip(&b).map(|(x, y)| 2.0 * x - y).collect();
        vec![a, b, c, d]
    }

    #[test]
    fn basis_is_orthonormal() {
        let basis = PodBasisBuilder::new(3).build_from_snapshots(&snapshots()).unwrap();
        assert_eq!(basis.rank(), 3);
        assert_eq!(basis.dof_count(), 6);
        assert!(basis.orthonormality_error() < 1e-10);
        let sv = basis.singular_values();
        assert!(sv.windows(2).all(|w| w[0] >= w[1]));
    }

    #[test]
    fn zero_components_are_dropped_on_request() {
        let full = PodBasisBuilder::new(4).keep_only_nonzero(false).build_from_snapshots(&snapshots()).unwrap();
        assert_eq!(full.rank(), 4);
        assert!(full.orthonormality_error() < 1e-10);
        let trimmed = PodBasisBuilder::new(4).build_from_snapshots(&snapshots()).unwrap();
        assert_eq!(trimmed.rank(), 3);
    }

    #[test]
    fn snapshots_are_reproduced_by_projection() {
        let snaps = snapshots();
        let basis = PodBasisBuilder::new(8).build_from_snapshots(&snaps).unwrap();
        for s in &snaps {
            let back = basis.lift(&basis.project(s));
            for (x, y) in s.iter().zip(&back) {
                assert!((x - y).abs() < 1e-10);
            }
        }
    }

    #[test]
    fn single_snapshot_gives_rank_one() {
        let basis = PodBasisBuilder::new(8).build_from_snapshots(&[vec![3.0, 4.0]]).unwrap();
        assert_eq!(basis.rank(), 1);
        assert!((basis.singular_values()[0] - 5.0).abs() < 1e-12);
        let m = basis.modes();
        assert!((m[(0, 0)].abs() - 0.6).abs() < 1e-12);
    }

    #[test]
    fn invalid_inputs_are_configuration_errors() {
        let builder = PodBasisBuilder::new(2);
        assert!(matches!(builder.build(&Mat::<f64>::zeros(4, 0)), Err(KError::Configuration(_))));
        assert!(matches!(
            builder.build_from_snapshots(&[vec![1.0, 2.0], vec![1.0]]),
            Err(KError::Configuration(_))
        ));
        assert!(matches!(
            PodBasisBuilder::new(0).build_from_snapshots(&[vec![1.0]]),
            Err(KError::Configuration(_))
        ));
        assert!(matches!(
            builder.build_from_snapshots(&[vec![0.0, 0.0]]),
            Err(KError::Configuration(_))
        ));
    }
}
