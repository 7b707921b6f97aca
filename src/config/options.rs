//! Run options for the POD2G solve pipeline.
//!
//! `Pod2gOptions` gathers every knob of a run: the PCG stopping criteria, the
//! POD basis size, the two-level preconditioner's smoother, the baseline
//! preconditioner, warm starting and what to do with unconverged solves.
//! Defaults reproduce the reference study (tolerance 1e-6, iteration cap at
//! half the matrix order, 8 POD components, seed 13).

use crate::context::pc_context::PC;
use crate::error::KError;
use crate::preconditioner::{SmootherConfig, SweepDirection};

/// What to do when a solve hits its iteration cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DivergencePolicy {
    /// Return the best iterate with `converged = false`.
    #[default]
    Report,
    /// Abort the run with [`KError::NotConverged`].
    Fail,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Pod2gOptions {
    /// Relative residual tolerance ‖r‖/‖b‖.
    pub tolerance: f64,
    /// Iteration cap as a fraction of the matrix order.
    pub max_iterations_fraction: f64,
    /// Requested number of POD components.
    pub pod_rank: usize,
    /// Drop numerically zero POD components.
    pub keep_only_nonzero: bool,
    /// Fine-level smoother of the two-level preconditioner.
    pub smoother: SmootherConfig,
    /// Two-level cycles per preconditioner application.
    pub cycles: usize,
    /// Preconditioner of the data-collecting phase.
    pub baseline: PC,
    /// Start accelerated solves from the surrogate prediction.
    pub warm_start: bool,
    pub on_divergence: DivergencePolicy,
    /// Seed for upstream parameter sampling.
    pub seed: u64,
}

impl Default for Pod2gOptions {
    fn default() -> Self {
        Self {
            tolerance: 1e-6,
            max_iterations_fraction: 0.5,
            pod_rank: 8,
            keep_only_nonzero: true,
            smoother: SmootherConfig::default(),
            cycles: 1,
            baseline: PC::Jacobi,
            warm_start: false,
            on_divergence: DivergencePolicy::Report,
            seed: 13,
        }
    }
}

impl Pod2gOptions {
    pub fn with_tolerance(mut self, tol: f64) -> Self {
        self.tolerance = tol;
        self
    }
    pub fn with_max_iterations_fraction(mut self, fraction: f64) -> Self {
        self.max_iterations_fraction = fraction;
        self
    }
    pub fn with_pod_rank(mut self, rank: usize) -> Self {
        self.pod_rank = rank;
        self
    }
    pub fn with_keep_only_nonzero(mut self, flag: bool) -> Self {
        self.keep_only_nonzero = flag;
        self
    }
    pub fn with_smoother(mut self, sweep: SweepDirection, iterations: usize) -> Self {
        self.smoother = SmootherConfig { sweep, iterations };
        self
    }
    pub fn with_cycles(mut self, cycles: usize) -> Self {
        self.cycles = cycles;
        self
    }
    pub fn with_baseline(mut self, pc: PC) -> Self {
        self.baseline = pc;
        self
    }
    pub fn with_warm_start(mut self, flag: bool) -> Self {
        self.warm_start = flag;
        self
    }
    pub fn with_divergence_policy(mut self, policy: DivergencePolicy) -> Self {
        self.on_divergence = policy;
        self
    }
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn validate(&self) -> Result<(), KError> {
        if !(self.tolerance > 0.0 && self.tolerance.is_finite()) {
            return Err(KError::Configuration(format!("tolerance must be positive, got {}", self.tolerance)));
        }
        if !(self.max_iterations_fraction > 0.0 && self.max_iterations_fraction.is_finite()) {
            return Err(KError::Configuration(format!(
                "max iteration fraction must be positive, got {}",
                self.max_iterations_fraction
            )));
        }
        if self.pod_rank == 0 {
            return Err(KError::Configuration("POD rank must be positive".into()));
        }
        if self.cycles == 0 {
            return Err(KError::Configuration("POD-AMG needs at least one cycle".into()));
        }
        self.smoother.validate()?;
        if let PC::GaussSeidel(cfg) = self.baseline {
            cfg.validate()?;
        }
        Ok(())
    }
}
