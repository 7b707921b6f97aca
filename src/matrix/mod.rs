//! Matrix module: sparse CSR storage and dense helpers.

pub mod dense;
pub mod sparse;

pub use dense::{gemv, gemv_transpose, mat_from_columns};
pub use sparse::{CsrMatrix, SparseMatrix};
