//! Solver and preconditioner contexts.
//!
//! - [`ksp_context`]: the PCG solve kernel with run-wide stopping criteria.
//! - [`pc_context`]: selection and construction of the baseline preconditioner.

pub mod ksp_context;
pub use ksp_context::{KspContext, SolveOutcome};
pub mod pc_context;
