/// Coefficients and right-hand side of the elliptic boundary value problem
///
///   -div(a grad u) + q u = f  on the aggregated domain,  u = 0 on the
///   Dirichlet part of the boundary.
///
/// All callbacks take physical coordinates.
pub trait EllipticBvp<const D: usize>: Sync
{
    /// Diffusion coefficient a(x) > 0.
    fn a(&self, x: &[f64; D]) -> f64;

    /// Reaction coefficient q(x) >= 0.
    fn q(&self, x: &[f64; D]) -> f64;

    /// Right-hand side f(x).
    fn f(&self, x: &[f64; D]) -> f64;
}

/// Problem with constant coefficients and an arbitrary right-hand side,
/// covering the Poisson and Helmholtz-type model cases.
pub struct ConstantCoefficientBvp<F, const D: usize>
where
    F: Fn(&[f64; D]) -> f64 + Sync,
{
    a: f64,
    q: f64,
    f: F,
}

impl<F, const D: usize> ConstantCoefficientBvp<F, D>
where
    F: Fn(&[f64; D]) -> f64 + Sync,
{
    pub fn new(a: f64, q: f64, f: F) -> Self
    {
        assert!(a > 0.0, "diffusion coefficient must be positive");
        assert!(q >= 0.0, "reaction coefficient must be nonnegative");
        Self { a, q, f }
    }

    /// -u'' = f respectively -laplace(u) = f.
    pub fn poisson(f: F) -> Self
    {
        Self::new(1.0, 0.0, f)
    }
}

impl<F, const D: usize> EllipticBvp<D> for ConstantCoefficientBvp<F, D>
where
    F: Fn(&[f64; D]) -> f64 + Sync,
{
    fn a(&self, _x: &[f64; D]) -> f64
    {
        self.a
    }

    fn q(&self, _x: &[f64; D]) -> f64
    {
        self.q
    }

    fn f(&self, x: &[f64; D]) -> f64
    {
        (self.f)(x)
    }
}

#[cfg(test)]
mod tests
{
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn constant_coefficient_callbacks()
    {
        let bvp = ConstantCoefficientBvp::<_, 1>::new(2.0, 0.5, |x: &[f64; 1]| x[0] + 1.0);
        assert_relative_eq!(bvp.a(&[0.3]), 2.0);
        assert_relative_eq!(bvp.q(&[0.3]), 0.5);
        assert_relative_eq!(bvp.f(&[0.3]), 1.3);

        let poisson = ConstantCoefficientBvp::<_, 1>::poisson(|_x: &[f64; 1]| 1.0);
        assert_relative_eq!(poisson.q(&[0.5]), 0.0);
    }

    #[test]
    #[should_panic]
    fn rejects_nonpositive_diffusion()
    {
        let _ = ConstantCoefficientBvp::<_, 1>::new(0.0, 0.0, |_x: &[f64; 1]| 0.0);
    }
}
