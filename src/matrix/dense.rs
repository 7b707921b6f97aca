//! Dense helpers on top of Faer.
//!
//! Snapshot matrices arrive as lists of vectors; `mat_from_columns` packs
//! them into a column-major `faer::Mat` with a shape check instead of a
//! panic.

use crate::error::KError;
use faer::Mat;

/// Packs equally sized vectors as the columns of a matrix.
pub fn mat_from_columns(columns: &[Vec<f64>]) -> Result<Mat<f64>, KError> {
    let nrows = uniform_len(columns, "column")?;
    Ok(Mat::from_fn(nrows, columns.len(), |i, j| columns[j][i]))
}

fn uniform_len(vectors: &[Vec<f64>], what: &str) -> Result<usize, KError> {
    let len = vectors.first().map_or(0, Vec::len);
    if let Some(pos) = vectors.iter().position(|v| v.len() != len) {
        return Err(KError::Configuration(format!(
            "{what} {pos} has length {}, expected {len}",
            vectors[pos].len()
        )));
    }
    Ok(len)
}

/// `y = M x` for a dense column-major matrix.
pub fn gemv(m: &Mat<f64>, x: &[f64], y: &mut [f64]) {
    assert_eq!(m.ncols(), x.len());
    assert_eq!(m.nrows(), y.len());
    y.fill(0.0);
    for (j, &xj) in x.iter().enumerate() {
        if xj == 0.0 {
            continue;
        }
        for (i, yi) in y.iter_mut().enumerate() {
            *yi += m[(i, j)] * xj;
        }
    }
}

/// `y = Mᵀ x` for a dense column-major matrix.
pub fn gemv_transpose(m: &Mat<f64>, x: &[f64], y: &mut [f64]) {
    assert_eq!(m.nrows(), x.len());
    assert_eq!(m.ncols(), y.len());
    for (j, yj) in y.iter_mut().enumerate() {
        *yj = (0..m.nrows()).map(|i| m[(i, j)] * x[i]).sum();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn columns_layout() {
        let cols = vec![vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]];
        let m = mat_from_columns(&cols).unwrap();
        assert_eq!((m.nrows(), m.ncols()), (3, 2));
        assert_eq!(m[(2, 1)], 6.0);
    }

    #[test]
    fn ragged_input_is_rejected() {
        let cols = vec![vec![1.0, 2.0], vec![3.0]];
        assert!(matches!(mat_from_columns(&cols), Err(KError::Configuration(_))));
    }

    #[test]
    fn gemv_pair() {
        let m = mat_from_columns(&[vec![1.0, 0.0, 2.0], vec![0.0, 1.0, 1.0]]).unwrap();
        let mut y = vec![0.0; 3];
        gemv(&m, &[2.0, 3.0], &mut y);
        assert_eq!(y, vec![2.0, 3.0, 7.0]);
        let mut z = vec![0.0; 2];
        gemv_transpose(&m, &[1.0, 1.0, 1.0], &mut z);
        assert_eq!(z, vec![3.0, 2.0]);
    }
}
