//! Parameter/solution pairs collected during the exact phase.

use crate::error::KError;
use faer::Mat;

/// Parallel arrays of parameter vectors and solutions, matched by index.
#[derive(Debug, Clone, Default)]
pub struct TrainingDataset {
    parameters: Vec<Vec<f64>>,
    solutions: Vec<Vec<f64>>,
}

impl TrainingDataset {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            parameters: Vec::with_capacity(capacity),
            solutions: Vec::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.solutions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.solutions.is_empty()
    }

    pub fn register(&mut self, parameters: Vec<f64>, solution: Vec<f64>) -> Result<(), KError> {
        if let Some(first) = self.parameters.first() {
            if first.len() != parameters.len() {
                return Err(KError::Configuration(format!(
                    "parameter vector {} has length {}, expected {}",
                    self.len(),
                    parameters.len(),
                    first.len()
                )));
            }
        }
        if let Some(first) = self.solutions.first() {
            if first.len() != solution.len() {
                return Err(KError::DimensionMismatch { expected: first.len(), found: solution.len() });
            }
        }
        self.parameters.push(parameters);
        self.solutions.push(solution);
        Ok(())
    }

    /// `samples × parameters`, one row per registered sample.
    pub fn parameter_matrix(&self) -> Mat<f64> {
        let p = self.parameters.first().map_or(0, Vec::len);
        Mat::from_fn(self.len(), p, |i, j| self.parameters[i][j])
    }

    /// Consumes the dataset into the parameter matrix and the `dofs × samples`
    /// snapshot matrix. The raw solution vectors are freed here.
    pub fn into_matrices(self) -> Result<(Mat<f64>, Mat<f64>), KError> {
        if self.is_empty() {
            return Err(KError::Configuration("no solutions were registered for training".into()));
        }
        let params = self.parameter_matrix();
        let dofs = self.solutions[0].len();
        let snapshots = Mat::from_fn(dofs, self.len(), |i, j| self.solutions[j][i]);
        Ok((params, snapshots))
    }
}
