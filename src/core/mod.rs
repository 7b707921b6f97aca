//! Core traits and their implementations for faer and std types.

pub mod traits;
pub mod wrappers;

pub use traits::{Diagonal, InnerProduct, MatVec};
