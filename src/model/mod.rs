//! Parameterized linear systems.
//!
//! A [`LinearSystemProvider`] turns a parameter vector into an assembled
//! system `A x = b`. Every instance of a run shares the DOF count and the
//! sparsity pattern; only the values change with the parameters.

use crate::error::KError;
use crate::matrix::CsrMatrix;

pub mod plate;

pub use plate::ElasticPlate;

/// One assembled instance `A x = b`.
#[derive(Clone, Debug)]
pub struct LinearSystem {
    pub matrix: CsrMatrix<f64>,
    pub rhs: Vec<f64>,
}

impl LinearSystem {
    pub fn new(matrix: CsrMatrix<f64>, rhs: Vec<f64>) -> Result<Self, KError> {
        if matrix.nrows() != matrix.ncols() {
            return Err(KError::InvalidMatrix(format!(
                "{}x{} system matrix is not square",
                matrix.nrows(),
                matrix.ncols()
            )));
        }
        if rhs.len() != matrix.nrows() {
            return Err(KError::DimensionMismatch { expected: matrix.nrows(), found: rhs.len() });
        }
        Ok(Self { matrix, rhs })
    }

    pub fn dof_count(&self) -> usize {
        self.rhs.len()
    }
}

/// Assembles the system for a parameter vector.
pub trait LinearSystemProvider {
    /// Length of the parameter vectors this provider accepts.
    fn parameter_count(&self) -> usize;

    fn system(&self, parameters: &[f64]) -> Result<LinearSystem, KError>;
}

impl<P: LinearSystemProvider + ?Sized> LinearSystemProvider for &P {
    fn parameter_count(&self) -> usize {
        (**self).parameter_count()
    }

    fn system(&self, parameters: &[f64]) -> Result<LinearSystem, KError> {
        (**self).system(parameters)
    }
}
