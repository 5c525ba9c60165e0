use super::matrix::DenseMatrix;

/// Check if two matrices are approximately equal within a tolerance
#[cfg(test)]
pub(crate) fn equal_approx(a: &DenseMatrix, b: &DenseMatrix, tolerance: f32) -> bool {
    if a.shape() != b.shape() {
        return false;
    }

    for i in 0..a.rows() {
        for j in 0..a.cols() {
            let diff = (a.at(i, j) - b.at(i, j)).abs();
            if diff > tolerance {
                return false;
            }
        }
    }

    true
}

/// Panics unless every parameter block has a gradient block of the same shape.
pub(crate) fn check_shapes(params: &[DenseMatrix], grads: &[DenseMatrix]) {
    assert_eq!(
        params.len(),
        grads.len(),
        "parameter count {} does not match gradient count {}",
        params.len(),
        grads.len()
    );
    for (index, (param, grad)) in params.iter().zip(grads.iter()).enumerate() {
        assert_eq!(
            param.shape(),
            grad.shape(),
            "parameter block {} has shape {:?} but its gradient has shape {:?}",
            index,
            param.shape(),
            grad.shape()
        );
    }
}
