//! Ridge-regularized affine regression.
//!
//! Parameters are standardized column by column, then
//!
//! ```text
//! y ≈ w₀ + W z,     z = (p − mean) / std
//! ```
//!
//! is fitted by solving the normal equations `(XᵀX + λ n I′) W = XᵀY` with a
//! full-pivoting LU from faer. `I′` is the identity with a zero in the
//! intercept slot, so the intercept is never shrunk.

use crate::error::KError;
use crate::surrogate::{Surrogate, SurrogateModel};
use faer::linalg::solvers::{FullPivLu, SolveCore};
use faer::{Conj, Mat};

#[derive(Debug, Clone, Copy)]
pub struct AffineSurrogate {
    ridge: f64,
}

impl Default for AffineSurrogate {
    fn default() -> Self {
        Self { ridge: 1e-6 }
    }
}

impl AffineSurrogate {
    pub fn new(ridge: f64) -> Self {
        Self { ridge }
    }

    pub fn ridge(&self) -> f64 {
        self.ridge
    }
}

/// Trained affine map; coefficients are `(1 + inputs) × outputs`.
#[derive(Debug, Clone)]
pub struct AffineModel {
    mean: Vec<f64>,
    scale: Vec<f64>,
    coefficients: Mat<f64>,
}

impl AffineModel {
    pub fn input_count(&self) -> usize {
        self.mean.len()
    }

    pub fn output_count(&self) -> usize {
        self.coefficients.ncols()
    }
}

impl Surrogate for AffineSurrogate {
    type Model = AffineModel;

    fn train(&mut self, parameters: &Mat<f64>, responses: &Mat<f64>) -> Result<AffineModel, KError> {
        if !(self.ridge >= 0.0 && self.ridge.is_finite()) {
            return Err(KError::Configuration(format!("ridge must be non-negative, got {}", self.ridge)));
        }
        let (n, p) = (parameters.nrows(), parameters.ncols());
        if n == 0 {
            return Err(KError::Configuration("surrogate training set is empty".into()));
        }
        if responses.nrows() != n {
            return Err(KError::Configuration(format!(
                "surrogate training rows differ: {} parameter rows, {} response rows",
                n,
                responses.nrows()
            )));
        }

        let mut mean = vec![0.0; p];
        let mut scale = vec![1.0; p];
        for j in 0..p {
            let m = (0..n).map(|i| parameters[(i, j)]).sum::<f64>() / n as f64;
            let var = (0..n).map(|i| (parameters[(i, j)] - m).powi(2)).sum::<f64>() / n as f64;
            mean[j] = m;
            if var > 0.0 {
                scale[j] = var.sqrt();
            }
        }
        let design = Mat::from_fn(n, p + 1, |i, j| {
            if j == 0 { 1.0 } else { (parameters[(i, j - 1)] - mean[j - 1]) / scale[j - 1] }
        });

        let dt = design.transpose().to_owned();
        let mut gram = &dt * &design;
        for j in 1..=p {
            gram[(j, j)] += self.ridge * n as f64;
        }
        let mut coefficients = &dt * responses;
        let lu = FullPivLu::new(gram.as_ref());
        lu.solve_in_place_with_conj(Conj::No, coefficients.as_mut());

        let finite = (0..coefficients.ncols())
            .all(|j| (0..coefficients.nrows()).all(|i| coefficients[(i, j)].is_finite()));
        if !finite {
            return Err(KError::FactorError("affine surrogate normal equations are singular".into()));
        }
        log::debug!("affine surrogate trained: {n} samples, {p} inputs, {} outputs", responses.ncols());
        Ok(AffineModel { mean, scale, coefficients })
    }
}

impl SurrogateModel for AffineModel {
    fn predict(&self, parameters: &[f64]) -> Result<Vec<f64>, KError> {
        if parameters.len() != self.input_count() {
            return Err(KError::Configuration(format!(
                "surrogate expects {} parameters, got {}",
                self.input_count(),
                parameters.len()
            )));
        }
        let c = &self.coefficients;
        Ok((0..c.ncols())
            .map(|k| {
                let mut y = c[(0, k)];
                for (j, &pj) in parameters.iter().enumerate() {
                    y += c[(j + 1, k)] * (pj - self.mean[j]) / self.scale[j];
                }
                y
            })
            .collect())
    }
}
