//! Reference provider: a clamped elastic plate under a partial top traction.
//!
//! Unit square, plane stress, bilinear quadrilaterals on a uniform
//! `n × n` grid. The bottom edge is clamped and its DOFs are eliminated; a
//! vertical traction `P` acts on the central half of the top edge and is
//! lumped equally onto the loaded nodes. Parameters are `[E, P]`.
//!
//! With a substrate, elements in the lower half keep a fixed modulus and `E`
//! only sets the upper layer, so solutions no longer scale as `P / E` and the
//! snapshot family has more than one significant POD component.

use crate::error::KError;
use crate::matrix::CsrMatrix;
use crate::model::{LinearSystem, LinearSystemProvider};

const GAUSS_POINT: f64 = 0.577_350_269_189_625_8;
const CORNERS: [(f64, f64); 4] = [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)];

#[derive(Debug, Clone)]
pub struct ElasticPlate {
    elements_per_side: usize,
    poisson_ratio: f64,
    substrate_modulus: Option<f64>,
    /// Element stiffness for `E = 1`, DOF order `[u0, v0, u1, v1, ...]`.
    reference_ke: [[f64; 8]; 8],
}

impl ElasticPlate {
    /// `elements_per_side` must be even and positive so a node sits at the
    /// top centre.
    pub fn new(elements_per_side: usize) -> Result<Self, KError> {
        Self::with_poisson_ratio(elements_per_side, 0.3)
    }

    pub fn with_poisson_ratio(elements_per_side: usize, poisson_ratio: f64) -> Result<Self, KError> {
        if elements_per_side == 0 || elements_per_side % 2 == 1 {
            return Err(KError::Configuration(format!(
                "elements per side must be even and positive, got {elements_per_side}"
            )));
        }
        if !(poisson_ratio > -1.0 && poisson_ratio < 0.5) {
            return Err(KError::Configuration(format!("Poisson ratio {poisson_ratio} out of range")));
        }
        Ok(Self {
            elements_per_side,
            poisson_ratio,
            substrate_modulus: None,
            reference_ke: quad4_stiffness(poisson_ratio),
        })
    }

    /// Fixed-modulus lower half.
    pub fn with_substrate(mut self, modulus: f64) -> Result<Self, KError> {
        if !(modulus > 0.0 && modulus.is_finite()) {
            return Err(KError::Configuration(format!("substrate modulus must be positive, got {modulus}")));
        }
        self.substrate_modulus = Some(modulus);
        Ok(self)
    }

    pub fn elements_per_side(&self) -> usize {
        self.elements_per_side
    }

    pub fn poisson_ratio(&self) -> f64 {
        self.poisson_ratio
    }

    pub fn dof_count(&self) -> usize {
        2 * self.elements_per_side * (self.elements_per_side + 1)
    }

    /// Vertical displacement of the top-centre node.
    pub fn monitored_dof(&self) -> usize {
        let n = self.elements_per_side;
        self.dof(n / 2, n, 1).unwrap_or(0)
    }

    /// Free DOF of component `c` at grid node `(i, j)`; `None` on the
    /// clamped edge.
    fn dof(&self, i: usize, j: usize, c: usize) -> Option<usize> {
        let n = self.elements_per_side;
        (j > 0).then(|| ((j - 1) * (n + 1) + i) * 2 + c)
    }

    fn element_modulus(&self, ey: usize, e: f64) -> f64 {
        match self.substrate_modulus {
            Some(es) if ey < self.elements_per_side / 2 => es,
            _ => e,
        }
    }

    fn loaded_nodes(&self) -> Vec<usize> {
        let n = self.elements_per_side;
        let h = 1.0 / n as f64;
        let tol = h / 4.0;
        (0..=n)
            .filter(|&i| {
                let x = i as f64 * h;
                x > 0.25 - tol && x < 0.75 + tol
            })
            .collect()
    }
}

impl LinearSystemProvider for ElasticPlate {
    fn parameter_count(&self) -> usize {
        2
    }

    fn system(&self, parameters: &[f64]) -> Result<LinearSystem, KError> {
        if parameters.len() != 2 {
            return Err(KError::Configuration(format!(
                "plate expects parameters [E, P], got {} values",
                parameters.len()
            )));
        }
        let (e, p) = (parameters[0], parameters[1]);
        if !(e > 0.0 && e.is_finite()) {
            return Err(KError::Configuration(format!("Young's modulus must be positive, got {e}")));
        }

        let n = self.elements_per_side;
        let ndof = self.dof_count();
        let mut triplets = Vec::with_capacity(n * n * 64);
        let mut local = [None; 8];
        for ey in 0..n {
            for ex in 0..n {
                let nodes = [(ex, ey), (ex + 1, ey), (ex + 1, ey + 1), (ex, ey + 1)];
                for (a, &(i, j)) in nodes.iter().enumerate() {
                    local[2 * a] = self.dof(i, j, 0);
                    local[2 * a + 1] = self.dof(i, j, 1);
                }
                let modulus = self.element_modulus(ey, e);
                for (r, gr) in local.iter().enumerate() {
                    let Some(gr) = *gr else { continue };
                    for (s, gs) in local.iter().enumerate() {
                        let Some(gs) = *gs else { continue };
                        triplets.push((gr, gs, modulus * self.reference_ke[r][s]));
                    }
                }
            }
        }
        let matrix = CsrMatrix::from_triplets(ndof, ndof, &triplets)?;

        let mut rhs = vec![0.0; ndof];
        let loaded = self.loaded_nodes();
        let per_node = p * 0.5 / loaded.len() as f64;
        for i in loaded {
            if let Some(d) = self.dof(i, n, 1) {
                rhs[d] += per_node;
            }
        }
        LinearSystem::new(matrix, rhs)
    }
}

/// Plane-stress Q4 stiffness of a square element with unit modulus and unit
/// thickness, 2×2 Gauss rule. It does not depend on the element size.
fn quad4_stiffness(nu: f64) -> [[f64; 8]; 8] {
    let c = 1.0 / (1.0 - nu * nu);
    let d = [[c, c * nu, 0.0], [c * nu, c, 0.0], [0.0, 0.0, c * (1.0 - nu) / 2.0]];
    let mut ke = [[0.0; 8]; 8];
    for &xi in &[-GAUSS_POINT, GAUSS_POINT] {
        for &eta in &[-GAUSS_POINT, GAUSS_POINT] {
            // side h: dN/dx = dN/dξ · 2/h and det J = h²/4, so with h = 1
            let mut b = [[0.0; 8]; 3];
            for (a, &(xa, ya)) in CORNERS.iter().enumerate() {
                let dndx = 0.25 * xa * (1.0 + eta * ya) * 2.0;
                let dndy = 0.25 * ya * (1.0 + xi * xa) * 2.0;
                b[0][2 * a] = dndx;
                b[1][2 * a + 1] = dndy;
                b[2][2 * a] = dndy;
                b[2][2 * a + 1] = dndx;
            }
            let det_j = 0.25;
            for r in 0..8 {
                for s in 0..8 {
                    let mut v = 0.0;
                    for k in 0..3 {
                        for l in 0..3 {
                            v += b[k][r] * d[k][l] * b[l][s];
                        }
                    }
                    ke[r][s] += v * det_j;
                }
            }
        }
    }
    ke
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::KspContext;
    use approx::assert_relative_eq;

    #[test]
    fn element_stiffness_is_symmetric_with_rigid_body_modes() {
        let ke = quad4_stiffness(0.3);
        for r in 0..8 {
            for s in 0..8 {
                assert_relative_eq!(ke[r][s], ke[s][r], epsilon = 1e-14);
            }
        }
        // translation in x and y
        for c in 0..2 {
            for row in &ke {
                let f: f64 = (0..4).map(|a| row[2 * a + c]).sum();
                assert!(f.abs() < 1e-12);
            }
        }
    }

    #[test]
    fn sizes_and_monitored_dof() {
        let plate = ElasticPlate::new(4).unwrap();
        assert_eq!(plate.dof_count(), 40);
        let sys = plate.system(&[1000.0, -10.0]).unwrap();
        assert_eq!(sys.dof_count(), 40);
        assert_eq!(plate.monitored_dof(), ((3 * 5) + 2) * 2 + 1);
        let total: f64 = sys.rhs.iter().sum();
        assert_relative_eq!(total, -5.0, epsilon = 1e-12);
    }

    #[test]
    fn odd_grids_and_bad_parameters_are_rejected() {
        assert!(ElasticPlate::new(3).is_err());
        let plate = ElasticPlate::new(2).unwrap();
        assert!(plate.system(&[1.0]).is_err());
        assert!(plate.system(&[-1.0, 1.0]).is_err());
    }

    #[test]
    fn homogeneous_plate_scales_with_load_over_modulus() {
        let plate = ElasticPlate::new(6).unwrap();
        let ksp = KspContext::new(1e-12, 4.0);
        let m = plate.monitored_dof();
        let a = plate.system(&[1000.0, -10.0]).unwrap();
        let b = plate.system(&[2000.0, -5.0]).unwrap();
        let ua = ksp.solve(&a.matrix, &a.rhs, None, None).unwrap().solution[m];
        let ub = ksp.solve(&b.matrix, &b.rhs, None, None).unwrap().solution[m];
        assert!(ua < 0.0);
        assert_relative_eq!(ub, ua / 4.0, max_relative = 1e-8);
    }
}
