//! Surrogate models mapping parameters to POD reduced coordinates.
//!
//! The orchestrator trains a [`Surrogate`] exactly once, on a
//! `samples × parameters` matrix and a `samples × rank` matrix of reduced
//! coordinates, and keeps the returned [`SurrogateModel`] read-only for the
//! rest of the run.

use crate::error::KError;
use faer::Mat;

pub mod affine;

pub use affine::{AffineModel, AffineSurrogate};

/// Trainer side of a surrogate.
pub trait Surrogate {
    type Model: SurrogateModel;

    /// Fit the model. Row `i` of `parameters` and of `responses` belong to
    /// the same sample.
    fn train(&mut self, parameters: &Mat<f64>, responses: &Mat<f64>) -> Result<Self::Model, KError>;
}

/// A trained surrogate.
pub trait SurrogateModel: Send + Sync {
    /// Approximate response (reduced coordinates) for one parameter vector.
    fn predict(&self, parameters: &[f64]) -> Result<Vec<f64>, KError>;
}

/// Surrogate that learns nothing and predicts zero coordinates.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSurrogate;

#[derive(Debug, Clone, Copy)]
pub struct ZeroModel {
    outputs: usize,
}

impl Surrogate for NoSurrogate {
    type Model = ZeroModel;

    fn train(&mut self, _parameters: &Mat<f64>, responses: &Mat<f64>) -> Result<ZeroModel, KError> {
        Ok(ZeroModel { outputs: responses.ncols() })
    }
}

impl SurrogateModel for ZeroModel {
    fn predict(&self, _parameters: &[f64]) -> Result<Vec<f64>, KError> {
        Ok(vec![0.0; self.outputs])
    }
}

impl<S: Surrogate + ?Sized> Surrogate for &mut S {
    type Model = S::Model;

    fn train(&mut self, parameters: &Mat<f64>, responses: &Mat<f64>) -> Result<Self::Model, KError> {
        (**self).train(parameters, responses)
    }
}
