//! Convergence bookkeeping and sampling utilities.

pub mod convergence;
pub mod sampling;

pub use convergence::{Convergence, SolveStats, max_iterations_from_fraction};
pub use sampling::sample_normal_parameters;
