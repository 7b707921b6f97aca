//! Preconditioners for linear solvers.
//!
//! This module defines the Preconditioner trait and the implementations the
//! solve pipeline composes: identity and Jacobi baselines, the Gauss–Seidel
//! smoother, and the POD-based two-level preconditioner.

use crate::error::KError;

/// A preconditioner M ≈ A⁻¹.
pub trait Preconditioner<M, V> {
    /// Apply M⁻¹ to r, writing z = M⁻¹ r
    fn apply(&self, r: &V, z: &mut V) -> Result<(), KError>;
    /// Optionally: setup/factorize from A
    fn setup(&mut self, _a: &M) -> Result<(), KError> {
        Ok(())
    }
}

pub mod jacobi;
pub mod pod_amg;
pub mod sor;

pub use jacobi::{Identity, Jacobi};
pub use pod_amg::{PodAmg, PodAmgState};
pub use sor::{GaussSeidel, SmootherConfig, SweepDirection};

/// Unified preconditioner enum for the baseline path.
pub use crate::context::pc_context::PC;
