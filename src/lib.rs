//! pod2g: POD-enhanced two-grid PCG for parameterized sparse systems.
//!
//! Many instances of one sparse SPD system `A(θ) x = b(θ)` are solved in
//! sequence. The first instances are solved with a baseline preconditioner
//! and their solutions are collected; a proper orthogonal decomposition of
//! those snapshots then becomes the coarse space of a two-level
//! preconditioner (POD-AMG) used for every later instance.
//!
//! The entry point is [`TrainingOrchestrator`], an iterator over solved
//! samples. The building blocks (PCG, POD basis, POD-AMG, surrogates) are
//! usable on their own.

pub mod config;
pub mod context;
pub mod core;
pub mod error;
pub mod matrix;
pub mod model;
pub mod orchestrator;
pub mod preconditioner;
pub mod reduction;
pub mod solver;
pub mod surrogate;
pub mod utils;

// Re-exports for convenience
pub use config::*;
pub use context::*;
pub use crate::core::*;
pub use error::*;
pub use matrix::*;
pub use model::*;
pub use orchestrator::*;
pub use preconditioner::*;
pub use reduction::*;
pub use solver::*;
pub use surrogate::*;
pub use utils::*;

// Re-export SolveStats at the crate root for convenience
pub use utils::convergence::SolveStats;
