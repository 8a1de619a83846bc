use nalgebra::{DMatrix, SMatrix};
use serde::{Deserialize, Serialize};
use serde_with::serde_as;

/// Axis-aligned box in physical coordinates.
#[serde_as]
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox<const D: usize>
{
    #[serde_as(as = "[_; D]")]
    pub lower: [f64; D],
    #[serde_as(as = "[_; D]")]
    pub upper: [f64; D],
}

impl<const D: usize> Default for BoundingBox<D>
{
    #[inline]
    fn default() -> Self {
        Self { lower: [0.0; D], upper: [1.0; D] }
    }
}
impl<const D: usize> BoundingBox<D>
{
    #[inline]
    pub fn new(lower: [f64; D], upper: [f64; D]) -> Self
    {
        Self { lower, upper }
    }

    pub fn intersects(&self, other: &BoundingBox<D>) -> bool
    {
        for d in 0..D
        {
            if self.upper[d] <= other.lower[d] || other.upper[d] <= self.lower[d]
            {
                return false;
            }
        }
        true
    }

    pub fn contains(&self, point: &[f64; D]) -> bool
    {
        for d in 0..D
        {
            if point[d] < self.lower[d] || point[d] > self.upper[d]
            {
                return false;
            }
        }
        true
    }
}

/// Parametrization of one patch: a smooth map from the reference cube
/// [0,1]^D onto a physical subdomain, together with the Jacobian-derived
/// factors the bilinear form needs.
pub trait Chart<const D: usize>: Sync
{
    /// Maps a reference point into physical coordinates.
    fn map_point(&self, x: &[f64; D]) -> [f64; D];

    /// Maps a physical point back into reference coordinates.
    fn map_point_inv(&self, y: &[f64; D]) -> [f64; D];

    /// sqrt(sqrt(det(Dkappa^T Dkappa))) at the reference point `x`.
    fn gram_factor(&self, x: &[f64; D]) -> f64;

    /// Partial derivative of the Gram factor in direction `dir`.
    fn gram_d_factor(&self, dir: usize, x: &[f64; D]) -> f64;

    /// Entry (row, col) of the inverse Jacobian at the reference point `x`.
    fn dkappa_inv(&self, row: usize, col: usize, x: &[f64; D]) -> f64;

    /// Physical bounding box of a reference box. The default maps the 2^D
    /// corners, which is exact for affine charts.
    fn map_box(&self, reference: &BoundingBox<D>) -> BoundingBox<D>
    {
        let mut lower = [f64::INFINITY; D];
        let mut upper = [f64::NEG_INFINITY; D];
        for corner in 0..(1usize << D)
        {
            let mut x = [0.0; D];
            for d in 0..D
            {
                x[d] = if corner >> d & 1 == 0 { reference.lower[d] } else { reference.upper[d] };
            }
            let y = self.map_point(&x);
            for d in 0..D
            {
                lower[d] = lower[d].min(y[d]);
                upper[d] = upper[d].max(y[d]);
            }
        }
        BoundingBox::new(lower, upper)
    }
}

/// Affine parametrization kappa(x) = A x + b.
#[derive(Clone, Debug)]
pub struct AffineChart<const D: usize>
{
    a: SMatrix<f64, D, D>,
    a_inv: SMatrix<f64, D, D>,
    b: [f64; D],
    gram: f64,
}

impl<const D: usize> AffineChart<D>
{
    /// Panics if `a` is singular.
    pub fn new(a: SMatrix<f64, D, D>, b: [f64; D]) -> Self
    {
        let a_inv = a.try_inverse().expect("affine chart matrix must be invertible");
        let ata = a.transpose() * a;
        // determinant of a statically sized matrix is unavailable for
        // generic D, so take it through a dynamically sized copy
        let gram = DMatrix::from_fn(D, D, |r, c| ata[(r, c)]).determinant().sqrt().sqrt();
        Self { a, a_inv, b, gram }
    }

    /// Chart mapping [0,1]^D onto the box [lower, upper].
    pub fn scaling(lower: [f64; D], upper: [f64; D]) -> Self
    {
        let mut a = SMatrix::<f64, D, D>::zeros();
        for d in 0..D
        {
            a[(d, d)] = upper[d] - lower[d];
        }
        Self::new(a, lower)
    }
}

impl<const D: usize> Chart<D> for AffineChart<D>
{
    fn map_point(&self, x: &[f64; D]) -> [f64; D]
    {
        let mut y = self.b;
        for row in 0..D
        {
            for col in 0..D
            {
                y[row] += self.a[(row, col)] * x[col];
            }
        }
        y
    }

    fn map_point_inv(&self, y: &[f64; D]) -> [f64; D]
    {
        let mut x = [0.0; D];
        for row in 0..D
        {
            for col in 0..D
            {
                x[row] += self.a_inv[(row, col)] * (y[col] - self.b[col]);
            }
        }
        x
    }

    #[inline]
    fn gram_factor(&self, _x: &[f64; D]) -> f64
    {
        self.gram
    }

    #[inline]
    fn gram_d_factor(&self, _dir: usize, _x: &[f64; D]) -> f64
    {
        0.0
    }

    #[inline]
    fn dkappa_inv(&self, row: usize, col: usize, _x: &[f64; D]) -> f64
    {
        self.a_inv[(row, col)]
    }
}

#[cfg(test)]
mod tests
{
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn affine_roundtrip()
    {
        let chart = AffineChart::<2>::new(SMatrix::<f64, 2, 2>::new(0.5, 0.1, 0.0, 0.7), [1.0, -2.0]);
        let x = [0.3, 0.9];
        let y = chart.map_point(&x);
        let x_back = chart.map_point_inv(&y);
        assert_relative_eq!(x[0], x_back[0], epsilon = 1e-14);
        assert_relative_eq!(x[1], x_back[1], epsilon = 1e-14);
    }

    #[test]
    fn gram_factor_of_a_sheared_chart()
    {
        // det(A^T A) = det(A)^2, so the factor is sqrt(|det A|) = sqrt(0.35)
        let chart = AffineChart::<2>::new(SMatrix::<f64, 2, 2>::new(0.5, 0.1, 0.0, 0.7), [0.0, 0.0]);
        assert_relative_eq!(chart.gram_factor(&[0.3, 0.3]), 0.35f64.sqrt(), epsilon = 1e-14);
    }

    #[test]
    fn scaling_chart_factors()
    {
        let chart = AffineChart::<1>::scaling([0.0], [0.7]);
        assert_relative_eq!(chart.map_point(&[1.0])[0], 0.7, epsilon = 1e-14);
        // 1D: gram factor is sqrt of the cell width
        assert_relative_eq!(chart.gram_factor(&[0.2]), 0.7f64.sqrt(), epsilon = 1e-14);
        assert_relative_eq!(chart.dkappa_inv(0, 0, &[0.2]), 1.0 / 0.7, epsilon = 1e-14);
    }

    #[test]
    fn mapped_box_of_affine_chart_is_exact()
    {
        let chart = AffineChart::<2>::scaling([0.0, 1.0], [2.0, 3.0]);
        let mapped = chart.map_box(&BoundingBox::new([0.25, 0.5], [0.5, 1.0]));
        assert_relative_eq!(mapped.lower[0], 0.5, epsilon = 1e-14);
        assert_relative_eq!(mapped.upper[0], 1.0, epsilon = 1e-14);
        assert_relative_eq!(mapped.lower[1], 2.0, epsilon = 1e-14);
        assert_relative_eq!(mapped.upper[1], 3.0, epsilon = 1e-14);
    }

    #[test]
    fn box_intersection()
    {
        let a = BoundingBox::new([0.0], [0.7]);
        let b = BoundingBox::new([0.3], [1.0]);
        let c = BoundingBox::new([0.7], [1.0]);
        assert!(a.intersects(&b));
        assert!(!a.intersects(&c));
    }
}
