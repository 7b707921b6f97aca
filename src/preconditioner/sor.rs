//! Gauss–Seidel smoothing on CSR matrices.
//!
//! Used on its own as a symmetric Gauss–Seidel preconditioner and as the
//! fine-level smoother of the POD two-level cycle. The sweep direction is a
//! bitflag set picking the leading sweep: `FORWARD`, `BACKWARD`, or both
//! (`SYMMETRIC`, which leads forward). The trailing sweep is always the
//! reverse one.

use std::fmt;
use bitflags::bitflags;
use crate::core::traits::Diagonal;
use crate::error::KError;
use crate::matrix::CsrMatrix;
use crate::preconditioner::Preconditioner;

bitflags! {
    #[derive(Copy, Clone, Debug, PartialEq, Eq)]
    pub struct SweepDirection: u32 {
        const FORWARD   = 0b01;
        const BACKWARD  = 0b10;
        const SYMMETRIC = Self::FORWARD.bits() | Self::BACKWARD.bits();
    }
}

/// Sweep direction and sweep count of the fine-level smoother.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SmootherConfig {
    pub sweep: SweepDirection,
    pub iterations: usize,
}

impl Default for SmootherConfig {
    fn default() -> Self {
        Self { sweep: SweepDirection::SYMMETRIC, iterations: 1 }
    }
}

impl SmootherConfig {
    pub fn validate(&self) -> Result<(), KError> {
        if self.sweep.is_empty() {
            return Err(KError::Configuration("smoother sweep direction is empty".into()));
        }
        if self.iterations == 0 {
            return Err(KError::Configuration("smoother needs at least one sweep".into()));
        }
        Ok(())
    }
}

pub struct GaussSeidel<'a> {
    config: SmootherConfig,
    inv_diag: Vec<f64>,
    a: Option<&'a CsrMatrix<f64>>,
}

impl<'a> GaussSeidel<'a> {
    pub fn new(config: SmootherConfig) -> Self {
        Self { config, inv_diag: Vec::new(), a: None }
    }

    /// Builds the smoother for `a` in one step.
    pub fn for_matrix(config: SmootherConfig, a: &'a CsrMatrix<f64>) -> Result<Self, KError> {
        config.validate()?;
        let inv_diag = a
            .diagonal()
            .into_iter()
            .enumerate()
            .map(|(i, d)| if d != 0.0 { Ok(1.0 / d) } else { Err(KError::ZeroPivot(i)) })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { config, inv_diag, a: Some(a) })
    }

    pub fn config(&self) -> SmootherConfig {
        self.config
    }

    fn matrix(&self) -> Result<&'a CsrMatrix<f64>, KError> {
        self.a
            .ok_or_else(|| KError::Configuration("Gauss-Seidel smoother used before setup".into()))
    }

    /// Whether the leading sweep runs forward. `BACKWARD` alone leads with a
    /// backward sweep; anything containing `FORWARD` leads forward.
    fn leads_forward(&self) -> bool {
        self.config.sweep.contains(SweepDirection::FORWARD)
    }

    fn sweep(&self, a: &CsrMatrix<f64>, forward: bool, b: &[f64], x: &mut [f64]) {
        if forward {
            a.gauss_seidel_forward(b, x, &self.inv_diag);
        } else {
            a.gauss_seidel_backward(b, x, &self.inv_diag);
        }
    }

    /// Smoothing step applied before a coarse correction: the leading sweep.
    ///
    /// [`post_smooth`](Self::post_smooth) always runs the reverse direction,
    /// so the two-level operator stays symmetric for every sweep setting.
    pub fn pre_smooth(&self, b: &[f64], x: &mut [f64]) -> Result<(), KError> {
        let a = self.matrix()?;
        for _ in 0..self.config.iterations {
            self.sweep(a, self.leads_forward(), b, x);
        }
        Ok(())
    }

    /// Smoothing step applied after a coarse correction: the adjoint sweep.
    pub fn post_smooth(&self, b: &[f64], x: &mut [f64]) -> Result<(), KError> {
        let a = self.matrix()?;
        for _ in 0..self.config.iterations {
            self.sweep(a, !self.leads_forward(), b, x);
        }
        Ok(())
    }
}

impl fmt::Display for GaussSeidel<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GaussSeidel(sweep={:?}, its={})", self.config.sweep, self.config.iterations)
    }
}

/// The matrix is bound at construction ([`GaussSeidel::for_matrix`]), so the
/// default no-op `setup` is kept. Each iteration pairs the leading sweep with
/// its adjoint, which keeps `M⁻¹` symmetric as CG requires.
impl Preconditioner<CsrMatrix<f64>, Vec<f64>> for GaussSeidel<'_> {
    fn apply(&self, r: &Vec<f64>, z: &mut Vec<f64>) -> Result<(), KError> {
        let a = self.matrix()?;
        let forward = self.leads_forward();
        z.fill(0.0);
        for _ in 0..self.config.iterations {
            self.sweep(a, forward, r, z);
            self.sweep(a, !forward, r, z);
        }
        Ok(())
    }
}
