//! Run configuration.

pub mod options;

pub use options::{DivergencePolicy, Pod2gOptions};
