use nalgebra::{DMatrix, DVector};

use crate::errors::FrameError;
use crate::numerics::cg::cg;

/// Estimates the largest eigenvalue of `a` by power iteration, starting from `x`.
pub fn power_iteration(a: &DMatrix<f64>, x: &mut DVector<f64>,
                       tolerance: f64, max_iterations: usize) -> Result<f64, FrameError>
{
    assert_eq!(a.nrows(), x.len());

    let mut y = a * &*x;
    for _ in 1..max_iterations
    {
        *x = &y / y.norm();
        y = a * &*x;
        let lambda = x.dot(&y);
        let error = (&y - lambda * &*x).norm() / lambda.abs();
        if error <= tolerance
        {
            return Ok(lambda);
        }
    }
    Err(FrameError::PowerIterationDidNotConverge)
}

/// Estimates the smallest eigenvalue of symmetric positive definite `a` by
/// inverse power iteration, with the inner systems solved by CG.
pub fn inverse_power_iteration(a: &DMatrix<f64>, x: &mut DVector<f64>,
                               tolerance: f64, max_iterations: usize) -> Result<f64, FrameError>
{
    assert_eq!(a.nrows(), x.len());

    let mut y = DVector::from_element(x.len(), 1.0);
    cg(a, x, &mut y, tolerance, 200)?;
    for _ in 1..max_iterations
    {
        *x = &y / y.norm();
        y.fill(0.0);
        cg(a, x, &mut y, tolerance / 100.0, 200)?;
        // y = A^-1 x, so the Rayleigh quotient of A is 1/(x'y)
        let mu = x.dot(&y);
        let error = (&y - mu * &*x).norm() / mu.abs();
        if error <= tolerance
        {
            return Ok(1.0 / mu);
        }
    }
    Err(FrameError::PowerIterationDidNotConverge)
}

#[cfg(test)]
mod tests
{
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn dominant_eigenvalue_of_diagonal_matrix()
    {
        let a = DMatrix::from_row_slice(3, 3, &[5.0, 0.0, 0.0, 0.0, 2.0, 0.0, 0.0, 0.0, 1.0]);
        let mut x = DVector::from_element(3, 1.0);
        let lambda = power_iteration(&a, &mut x, 1e-10, 500).unwrap();
        assert_relative_eq!(lambda, 5.0, epsilon = 1e-8);
    }

    #[test]
    fn smallest_eigenvalue_of_spd_matrix()
    {
        let a = DMatrix::from_row_slice(2, 2, &[3.0, 1.0, 1.0, 3.0]);
        let mut x = DVector::from_vec(vec![1.0, 0.5]);
        let lambda = inverse_power_iteration(&a, &mut x, 1e-10, 500).unwrap();
        assert_relative_eq!(lambda, 2.0, epsilon = 1e-6);
    }
}
