use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

/// A dense `f32` matrix holding one block of trainable parameters, or the gradient
/// of such a block. Optimizers keep their per-parameter state (momentum buffers,
/// moment estimates) in matrices of the same shape.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DenseMatrix {
    data: DMatrix<f32>,
}

impl DenseMatrix {
    /// Creates a new dense matrix with given rows, columns, and row-major data.
    pub fn new(rows: usize, cols: usize, data: &[f32]) -> Self {
        Self {
            data: DMatrix::from_row_slice(rows, cols, data),
        }
    }

    /// Creates a new dense matrix with given rows and columns, initialized with zeros.
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            data: DMatrix::zeros(rows, cols),
        }
    }

    /// Creates a zero matrix with the same shape as `other`.
    pub fn zeros_like(other: &DenseMatrix) -> Self {
        Self::zeros(other.rows(), other.cols())
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.data.nrows()
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.data.ncols()
    }

    /// Returns `(rows, cols)`.
    #[inline]
    pub fn shape(&self) -> (usize, usize) {
        self.data.shape()
    }

    /// Gets the value at position (i, j).
    #[inline]
    pub fn at(&self, i: usize, j: usize) -> f32 {
        self.data[(i, j)]
    }

    /// Sets the value at position (i, j).
    #[inline]
    pub fn set(&mut self, i: usize, j: usize, value: f32) {
        self.data[(i, j)] = value;
    }

    /// Visits every element mutably together with its (row, column) index.
    pub fn apply_with_indices<F>(&mut self, mut f: F)
    where
        F: FnMut(usize, usize, &mut f32),
    {
        let (rows, cols) = self.data.shape();
        for j in 0..cols {
            for i in 0..rows {
                f(i, j, &mut self.data[(i, j)]);
            }
        }
    }

    /// Flattens the matrix into a single vector of elements in row major layout.
    #[cfg(test)]
    pub(crate) fn flatten(&self) -> Vec<f32> {
        // nalgebra stores column-major, so the transpose's storage order is our row order
        self.data.transpose().iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_at_and_set() {
        let mut matrix = DenseMatrix::new(2, 2, &[1.0, 2.0, 3.0, 4.0]);
        assert_eq!(matrix.at(0, 1), 2.0);
        assert_eq!(matrix.at(1, 0), 3.0);
        matrix.set(1, 1, 9.0);
        assert_eq!(matrix.at(1, 1), 9.0);
        assert_eq!(matrix.shape(), (2, 2));
    }

    #[test]
    fn test_zeros_like() {
        let matrix = DenseMatrix::new(2, 3, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        let zeros = DenseMatrix::zeros_like(&matrix);
        assert_eq!((zeros.rows(), zeros.cols()), (2, 3));
        assert_eq!(zeros.flatten(), vec![0.0; 6]);
    }

    #[test]
    fn test_apply_with_indices() {
        let mut matrix = DenseMatrix::zeros(2, 3);
        matrix.apply_with_indices(|i, j, v| *v = (i * 10 + j) as f32);
        assert_eq!(matrix.flatten(), &[0.0, 1.0, 2.0, 10.0, 11.0, 12.0]);
    }
}
