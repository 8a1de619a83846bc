use nalgebra::{DMatrix, DVector};

use crate::errors::FrameError;

/// Conjugate gradient iteration for a symmetric positive definite system.
///
/// Iterates on `x` in place and returns the number of iterations performed.
/// Exceeding `max_iterations` without reaching the residual tolerance is
/// surfaced as [`FrameError::CgDidNotConverge`]; the best iterate is kept in `x`.
pub fn cg(a: &DMatrix<f64>, b: &DVector<f64>, x: &mut DVector<f64>,
          tolerance: f64, max_iterations: usize) -> Result<usize, FrameError>
{
    assert_eq!(a.nrows(), b.len());
    assert_eq!(b.len(), x.len());

    let mut r = b - a * &*x;
    let mut p = r.clone();
    let mut rho = r.dot(&r);
    let bound = tolerance * tolerance;

    if rho <= bound
    {
        return Ok(0);
    }
    for iteration in 1..=max_iterations
    {
        let ap = a * &p;
        let pap = p.dot(&ap);
        if pap <= 0.0
        {
            // quadratic form degenerate along the search direction
            return Err(FrameError::SingularLocalSystem);
        }
        let alpha = rho / pap;
        x.axpy(alpha, &p, 1.0);
        r.axpy(-alpha, &ap, 1.0);
        let rho_next = r.dot(&r);
        if rho_next <= bound
        {
            return Ok(iteration);
        }
        p = &r + (rho_next / rho) * p;
        rho = rho_next;
    }
    Err(FrameError::CgDidNotConverge)
}
