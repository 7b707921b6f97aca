// Jacobi and identity preconditioners

use crate::core::traits::Diagonal;
use crate::error::KError;
use crate::preconditioner::Preconditioner;
use num_traits::Float;

/// Jacobi preconditioner: M⁻¹ = D⁻¹
#[derive(Clone, Debug)]
pub struct Jacobi<T> {
    pub(crate) inv_diag: Vec<T>,
}

impl<T: Float> Jacobi<T> {
    /// new with empty state; user must call `setup`.
    pub fn new() -> Self {
        Self { inv_diag: Vec::new() }
    }
}

impl<T: Float> Default for Jacobi<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M, V, T> Preconditioner<M, V> for Jacobi<T>
where
    M: Diagonal<T>,
    V: AsRef<[T]> + AsMut<[T]>,
    T: Float,
{
    fn setup(&mut self, a: &M) -> Result<(), KError> {
        self.inv_diag = a
            .diagonal()
            .into_iter()
            .enumerate()
            .map(|(i, d)| if d != T::zero() { Ok(T::one() / d) } else { Err(KError::ZeroPivot(i)) })
            .collect::<Result<_, _>>()?;
        Ok(())
    }

    fn apply(&self, x: &V, y: &mut V) -> Result<(), KError> {
        let x_ref = x.as_ref();
        let y_mut = y.as_mut();
        for i in 0..x_ref.len() {
            y_mut[i] = self.inv_diag[i] * x_ref[i];
        }
        Ok(())
    }
}

/// No preconditioning: z = r.
#[derive(Clone, Copy, Debug, Default)]
pub struct Identity;

impl<M, T: Copy> Preconditioner<M, Vec<T>> for Identity {
    fn apply(&self, r: &Vec<T>, z: &mut Vec<T>) -> Result<(), KError> {
        z.copy_from_slice(r);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::CsrMatrix;

    #[test]
    fn jacobi_scales_by_inverse_diagonal() {
        let a = CsrMatrix::from_triplets(2, 2, &[(0, 0, 4.0), (1, 1, 2.0), (0, 1, 1.0)]).unwrap();
        let mut pc = Jacobi::new();
        <Jacobi<f64> as Preconditioner<CsrMatrix<f64>, Vec<f64>>>::setup(&mut pc, &a).unwrap();
        let mut z = vec![0.0; 2];
        <Jacobi<f64> as Preconditioner<CsrMatrix<f64>, Vec<f64>>>::apply(&pc, &vec![8.0, 8.0], &mut z)
            .unwrap();
        assert_eq!(z, vec![2.0, 4.0]);
    }

    #[test]
    fn jacobi_rejects_zero_diagonal() {
        let a = CsrMatrix::from_triplets(2, 2, &[(0, 0, 4.0), (0, 1, 1.0), (1, 0, 1.0)]).unwrap();
        let mut pc = Jacobi::<f64>::new();
        let err = <Jacobi<f64> as Preconditioner<CsrMatrix<f64>, Vec<f64>>>::setup(&mut pc, &a);
        assert!(matches!(err, Err(KError::ZeroPivot(1))));
    }
}
