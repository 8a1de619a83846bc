use crate::basis::base::IntervalBasis;
use crate::frame::aggregated::AggregatedFrame;
use crate::frame::index::FrameIndex;
use crate::frame::support::intersect_singular_support;

/// Rule deciding which entries of a compressed operator block are kept.
/// Candidates already have intersecting supports; a strategy may drop
/// entries whose decay the compression theory controls.
pub trait CompressionStrategy: Sync
{
    fn retains<B: IntervalBasis, const D: usize>(
        &self,
        frame: &AggregatedFrame<B, D>,
        lambda: &FrameIndex<D>,
        nu: &FrameIndex<D>,
        j: i32,
    ) -> bool;
}

/// Keeps every entry with intersecting supports.
pub struct Cdd1;

impl CompressionStrategy for Cdd1
{
    #[inline]
    fn retains<B: IntervalBasis, const D: usize>(
        &self,
        _frame: &AggregatedFrame<B, D>,
        _lambda: &FrameIndex<D>,
        _nu: &FrameIndex<D>,
        _j: i32,
    ) -> bool
    {
        true
    }
}

/// Keeps entries of nearby levels, and across larger level gaps only those
/// whose singular supports intersect.
pub struct St04a;

impl CompressionStrategy for St04a
{
    fn retains<B: IntervalBasis, const D: usize>(
        &self,
        frame: &AggregatedFrame<B, D>,
        lambda: &FrameIndex<D>,
        nu: &FrameIndex<D>,
        j: i32,
    ) -> bool
    {
        (lambda.j() - j).abs() as f64 <= frame.jmax() as f64 / D as f64
            || intersect_singular_support(frame, lambda, nu)
    }
}

#[cfg(test)]
mod tests
{
    use super::*;
    use crate::basis::linear_hat::LinearHatBasis;
    use crate::geometry::atlas::Atlas;
    use crate::geometry::chart::AffineChart;

    #[test]
    fn st04a_reduces_to_singular_support_across_levels()
    {
        // jmax/D = 2, so the level gap 1 -> 4 exceeds the proximity window
        let atlas = Atlas::new(vec![Box::new(AffineChart::<2>::scaling([0.0, 0.0], [1.0, 1.0]))]);
        let frame = AggregatedFrame::<LinearHatBasis, 2>::new(atlas, &[[[1, 1], [1, 1]]], 4);

        let coarse = FrameIndex::<2>::new(0, 1, [0, 0], [1, 1]);
        // generator direction centered at 1/2: support crosses the coarse kink
        let crossing = FrameIndex::<2>::new(0, 4, [0, 1], [8, 0]);
        // pure wavelet type near the origin: inside one smooth piece
        let smooth = FrameIndex::<2>::new(0, 4, [1, 1], [0, 0]);

        assert!(Cdd1.retains(&frame, &coarse, &smooth, 4));
        assert!(St04a.retains(&frame, &coarse, &crossing, 4));
        assert!(!St04a.retains(&frame, &coarse, &smooth, 4));
        // nearby levels are always kept
        assert!(St04a.retains(&frame, &coarse, &smooth, 2));
    }
}
