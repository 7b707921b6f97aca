//! Model order reduction of solution snapshots.

pub mod pod;

pub use pod::{PodBasis, PodBasisBuilder, ZERO_SINGULAR_VALUE_TOL};
