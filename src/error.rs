use thiserror::Error;

// Unified error type for pod2g

#[derive(Error, Debug)]
pub enum KError {
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("dimension mismatch: expected {expected} dofs, found {found}")]
    DimensionMismatch { expected: usize, found: usize },
    #[error("sample {index} did not converge after {iterations} iterations (relative residual {residual:e})")]
    NotConverged {
        index: usize,
        iterations: usize,
        residual: f64,
    },
    #[error("invalid matrix: {0}")]
    InvalidMatrix(String),
    #[error("factorization error: {0}")]
    FactorError(String),
    #[error("indefinite matrix detected (p^T A p <= 0)")]
    IndefiniteMatrix,
    #[error("indefinite preconditioner detected (beta < 0)")]
    IndefinitePreconditioner,
    #[error("zero pivot at row {0}")]
    ZeroPivot(usize),
}
