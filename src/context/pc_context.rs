//! Baseline preconditioner selection.
//!
//! The `PC` enum names the preconditioner used on the exact, data-collecting
//! path (and whenever a solve is requested without an explicit
//! preconditioner). Each variant is built against a concrete system matrix
//! with [`PC::build`].

use crate::error::KError;
use crate::matrix::CsrMatrix;
use crate::preconditioner::{GaussSeidel, Identity, Jacobi, Preconditioner, SmootherConfig};

/// Unified enum for the supported baseline preconditioners.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PC {
    /// No preconditioning.
    Identity,
    /// Diagonal scaling.
    #[default]
    Jacobi,
    /// Gauss–Seidel sweeps from a zero initial guess; symmetric sweeps keep
    /// the operator usable with CG.
    GaussSeidel(SmootherConfig),
}

impl PC {
    pub fn build<'a>(
        &self,
        a: &'a CsrMatrix<f64>,
    ) -> Result<Box<dyn Preconditioner<CsrMatrix<f64>, Vec<f64>> + 'a>, KError> {
        Ok(match *self {
            PC::Identity => Box::new(Identity),
            PC::Jacobi => {
                let mut pc = Jacobi::<f64>::new();
                <Jacobi<f64> as Preconditioner<CsrMatrix<f64>, Vec<f64>>>::setup(&mut pc, a)?;
                Box::new(pc)
            }
            PC::GaussSeidel(config) => Box::new(GaussSeidel::for_matrix(config, a)?),
        })
    }
}
