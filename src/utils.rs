use crate::{error::ShapeError, Real};
use ndarray::{ArrayViewD, Zip};
use num_complex::Complex;
use num_traits::Zero;

/// Hermitian inner product sum(conj(a) * b). Both views must have the same shape.
pub fn vdot<T: Real>(a: ArrayViewD<Complex<T>>, b: ArrayViewD<Complex<T>>) -> Complex<T> {
    Zip::from(&a)
        .and(&b)
        .fold(Complex::zero(), |acc, x, y| acc + x.conj() * y)
}

/// Fails unless `found` equals `expected`.
pub fn expect_shape(expected: &[usize], found: &[usize]) -> Result<(), ShapeError> {
    if expected.len() != found.len() {
        return Err(ShapeError::Rank {
            expected: expected.len(),
            found: found.len(),
        });
    }
    if expected != found {
        return Err(ShapeError::Mismatch {
            expected: expected.to_vec(),
            found: found.to_vec(),
        });
    }
    Ok(())
}

/// Copy of `shape` with the extent of `axis` replaced by `len`.
pub fn with_axis_len(shape: &[usize], axis: usize, len: usize) -> Vec<usize> {
    let mut s = shape.to_vec();
    s[axis] = len;
    s
}
