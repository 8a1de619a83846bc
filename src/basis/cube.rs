use serde::{Deserialize, Serialize};
use serde_with::serde_as;

use crate::basis::base::IntervalBasis;
use crate::geometry::chart::BoundingBox;

/// Dyadic support box on the reference cube: the product of the intervals
/// [a_d, b_d] * 2^-scale, with one common scale for all directions.
#[serde_as]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CubeSupport<const D: usize>
{
    pub scale: i32,
    #[serde_as(as = "[_; D]")]
    pub a: [i32; D],
    #[serde_as(as = "[_; D]")]
    pub b: [i32; D],
}

impl<const D: usize> CubeSupport<D>
{
    pub fn to_box(&self) -> BoundingBox<D>
    {
        let h = 1.0 / (1u64 << self.scale) as f64;
        let mut lower = [0.0; D];
        let mut upper = [0.0; D];
        for d in 0..D
        {
            lower[d] = self.a[d] as f64 * h;
            upper[d] = self.b[d] as f64 * h;
        }
        BoundingBox::new(lower, upper)
    }

    /// Rescales the dyadic bounds to a finer common scale.
    pub fn at_scale(&self, scale: i32) -> CubeSupport<D>
    {
        assert!(scale >= self.scale);
        let shift = scale - self.scale;
        let mut r = *self;
        r.scale = scale;
        for d in 0..D
        {
            r.a[d] <<= shift;
            r.b[d] <<= shift;
        }
        r
    }

    /// Intersection of two support boxes at a common scale, or None if the
    /// interiors are disjoint.
    pub fn intersect(&self, other: &CubeSupport<D>) -> Option<CubeSupport<D>>
    {
        let scale = self.scale.max(other.scale);
        let lhs = self.at_scale(scale);
        let rhs = other.at_scale(scale);
        let mut r = CubeSupport { scale, a: [0; D], b: [0; D] };
        for d in 0..D
        {
            r.a[d] = lhs.a[d].max(rhs.a[d]);
            r.b[d] = lhs.b[d].min(rhs.b[d]);
            if r.a[d] >= r.b[d]
            {
                return None;
            }
        }
        Some(r)
    }
}

/// Tensor product of one-dimensional bases over the reference cube of one
/// patch, with boundary conditions fixed per face.
pub struct CubeBasis<B: IntervalBasis, const D: usize>
{
    bases: [B; D],
}

impl<B: IntervalBasis, const D: usize> CubeBasis<B, D>
{
    /// `bc[d]` holds the Dirichlet orders at the two faces in direction `d`.
    pub fn new(bc: [[u8; 2]; D]) -> Self
    {
        Self { bases: std::array::from_fn(|d| B::with_bc(bc[d][0], bc[d][1])) }
    }

    #[inline]
    pub fn basis(&self, d: usize) -> &B
    {
        &self.bases[d]
    }

    /// Coarsest level admissible in every direction.
    pub fn j0(&self) -> i32
    {
        (0..D).map(|d| self.bases[d].j0()).max().expect("D > 0")
    }

    /// Translation range of type `e` on level `j` in direction `d`.
    #[inline]
    pub fn k_range(&self, j: i32, e: u8, d: usize) -> (i32, i32)
    {
        self.bases[d].k_range(j, e)
    }

    /// Dyadic support of the tensor-product function (j, e, k), unified to
    /// the finest per-direction scale.
    pub fn support(&self, j: i32, e: &[u8; D], k: &[i32; D]) -> CubeSupport<D>
    {
        let parts: [_; D] = std::array::from_fn(|d| self.bases[d].support(j, e[d], k[d]));
        let scale = parts.iter().map(|s| s.scale).max().expect("D > 0");
        let mut support = CubeSupport { scale, a: [0; D], b: [0; D] };
        for d in 0..D
        {
            let shift = scale - parts[d].scale;
            support.a[d] = parts[d].a << shift;
            support.b[d] = parts[d].b << shift;
        }
        support
    }

    /// Tensor-product point value on the reference cube.
    pub fn evaluate(&self, j: i32, e: &[u8; D], k: &[i32; D], x: &[f64; D]) -> f64
    {
        let mut value = 1.0;
        for d in 0..D
        {
            value *= self.bases[d].evaluate(0, j, e[d], k[d], x[d]);
            if value == 0.0
            {
                return 0.0;
            }
        }
        value
    }
}
