use crate::basis::base::{IntervalBasis, IntervalSupport};

/// Hierarchical piecewise-linear basis on [0,1].
///
/// Generators on level j are the L2-normalized hat functions at the nodes
/// k/2^j; the "wavelets" on level j are the hats at the odd nodes of level
/// j+1, so levels j0..jmax together span the piecewise linears on the grid
/// of width 2^-(jmax+1). A Dirichlet order of 1 at an interval end removes
/// the boundary generator there.
///
/// This is the simplest basis satisfying the evaluate/support contract and
/// keeps the whole solver testable without an external wavelet family.
#[derive(Copy, Clone, Debug)]
pub struct LinearHatBasis
{
    bc_left: u8,
    bc_right: u8,
}

impl LinearHatBasis
{
    /// Hat at node k/2^j, L2-normalized, evaluated at x.
    #[inline]
    fn hat(j: i32, k: i32, x: f64) -> f64
    {
        let scale = (1u64 << j) as f64;
        let factor = 2f64.powf(0.5 * j as f64);
        factor * 0f64.max(1.0 - (scale * x - k as f64).abs())
    }

    /// Derivative of the normalized hat, taken one-sided at the kinks.
    #[inline]
    fn hat_deriv(j: i32, k: i32, x: f64) -> f64
    {
        let scale = (1u64 << j) as f64;
        let t = scale * x - k as f64;
        let factor = 2f64.powf(1.5 * j as f64);
        if t <= -1.0 || t >= 1.0 || t == 0.0
        {
            0.0
        }
        else if t < 0.0
        {
            factor
        }
        else
        {
            -factor
        }
    }
}

impl IntervalBasis for LinearHatBasis
{
    fn with_bc(bc_left: u8, bc_right: u8) -> Self
    {
        Self { bc_left, bc_right }
    }

    #[inline]
    fn j0(&self) -> i32
    {
        1
    }

    fn delta_min(&self, _j: i32) -> i32
    {
        if self.bc_left > 0 { 1 } else { 0 }
    }

    fn delta_max(&self, j: i32) -> i32
    {
        (1 << j) - if self.bc_right > 0 { 1 } else { 0 }
    }

    fn nabla_min(&self, _j: i32) -> i32
    {
        0
    }

    fn nabla_max(&self, j: i32) -> i32
    {
        (1 << j) - 1
    }

    fn evaluate(&self, derivative: u8, j: i32, e: u8, k: i32, x: f64) -> f64
    {
        // a wavelet on level j is the hat at the odd node 2k+1 of level j+1
        let (jj, kk) = if e == 0 { (j, k) } else { (j + 1, 2 * k + 1) };
        match derivative
        {
            0 => Self::hat(jj, kk, x),
            1 => Self::hat_deriv(jj, kk, x),
            _ => panic!("LinearHatBasis supports derivatives 0 and 1 only"),
        }
    }

    fn support(&self, j: i32, e: u8, k: i32) -> IntervalSupport
    {
        let (jj, kk) = if e == 0 { (j, k) } else { (j + 1, 2 * k + 1) };
        IntervalSupport {
            scale: jj,
            a: (kk - 1).max(0),
            b: (kk + 1).min(1 << jj),
        }
    }
}
