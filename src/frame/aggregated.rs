use log::info;
use rustc_hash::FxHashMap;

use crate::basis::base::IntervalBasis;
use crate::basis::cube::{CubeBasis, CubeSupport};
use crate::coefficients::SparseVector;
use crate::frame::index::FrameIndex;
use crate::geometry::atlas::Atlas;
use crate::geometry::chart::BoundingBox;

/// The aggregated frame: per-patch tensor-product bases lifted onto the
/// atlas patches, indexed by [`FrameIndex`].
///
/// Construction enumerates every index from the generator slot j0-1 up to
/// level `jmax` and precomputes, per enumeration position, the dyadic
/// reference support and the physical support box, so assembly never
/// recomputes supports. The frame is immutable afterwards; a different
/// `jmax` requires building a new frame.
pub struct AggregatedFrame<B: IntervalBasis, const D: usize>
{
    atlas: Atlas<D>,
    bases: Vec<CubeBasis<B, D>>,
    j0: i32,
    jmax: i32,
    indices: Vec<FrameIndex<D>>,
    indices_levelwise: Vec<Vec<FrameIndex<D>>>,
    numbers: FxHashMap<FrameIndex<D>, usize>,
    supports: Vec<CubeSupport<D>>,
    support_boxes: Vec<BoundingBox<D>>,
}

impl<B: IntervalBasis, const D: usize> AggregatedFrame<B, D>
{
    /// `bc[p][d]` holds the Dirichlet orders of patch `p` at the two faces
    /// in direction `d`.
    pub fn new(atlas: Atlas<D>, bc: &[[[u8; 2]; D]], jmax: i32) -> Self
    {
        assert_eq!(atlas.n_patches(), bc.len());
        assert!(atlas.n_patches() > 0);

        let bases: Vec<CubeBasis<B, D>> = bc.iter().map(|&b| CubeBasis::new(b)).collect();
        let j0 = bases.iter().map(|b| b.j0()).max().expect("at least one patch");
        assert!(jmax >= j0, "jmax must not undercut the coarsest level");

        let mut frame = Self {
            atlas,
            bases,
            j0,
            jmax,
            indices: Vec::new(),
            indices_levelwise: Vec::new(),
            numbers: FxHashMap::default(),
            supports: Vec::new(),
            support_boxes: Vec::new(),
        };
        frame.enumerate_indices();
        frame.precompute_supports();
        info!("aggregated frame: {} patches, levels {}..={}, {} degrees of freedom",
              frame.n_p(), j0, jmax, frame.degrees_of_freedom());
        frame
    }

    /// Fills the levelwise index tables: slot 0 holds the generators of
    /// level j0, slot j - j0 + 1 the wavelets of level j.
    fn enumerate_indices(&mut self)
    {
        self.indices_levelwise = Vec::with_capacity((self.jmax - self.j0 + 2) as usize);

        let mut slot = Vec::new();
        for p in 0..self.n_p()
        {
            self.enumerate_type(p, self.j0, [0; D], &mut slot);
        }
        self.indices_levelwise.push(slot);

        for j in self.j0..=self.jmax
        {
            let mut slot = Vec::new();
            for p in 0..self.n_p()
            {
                for code in 1..(1usize << D)
                {
                    self.enumerate_type(p, j, FrameIndex::<D>::e_from_code(code), &mut slot);
                }
            }
            self.indices_levelwise.push(slot);
        }

        for slot in &self.indices_levelwise
        {
            for index in slot
            {
                self.numbers.insert(*index, self.indices.len());
                self.indices.push(*index);
            }
        }
    }

    /// Appends all indices of patch `p`, level `j` and type `e` in
    /// translation order (last direction fastest).
    fn enumerate_type(&self, p: usize, j: i32, e: [u8; D], out: &mut Vec<FrameIndex<D>>)
    {
        let basis = &self.bases[p];
        let ranges: [(i32, i32); D] = std::array::from_fn(|d| basis.k_range(j, e[d], d));
        if ranges.iter().any(|&(lo, hi)| lo > hi)
        {
            return;
        }
        let mut k: [i32; D] = std::array::from_fn(|d| ranges[d].0);
        loop
        {
            out.push(FrameIndex::new(p, j, e, k));
            let mut d = D;
            while d > 0
            {
                d -= 1;
                if k[d] < ranges[d].1
                {
                    k[d] += 1;
                    for dd in d + 1..D
                    {
                        k[dd] = ranges[dd].0;
                    }
                    break;
                }
                if d == 0
                {
                    return;
                }
            }
        }
    }

    fn precompute_supports(&mut self)
    {
        self.supports = self
            .indices
            .iter()
            .map(|index| self.bases[index.p()].support(index.j(), index.e(), index.k()))
            .collect();
        self.support_boxes = self
            .indices
            .iter()
            .zip(&self.supports)
            .map(|(index, support)| self.atlas.chart(index.p()).map_box(&support.to_box()))
            .collect();
    }

    #[inline]
    pub fn n_p(&self) -> usize
    {
        self.bases.len()
    }

    #[inline]
    pub fn degrees_of_freedom(&self) -> usize
    {
        self.indices.len()
    }

    #[inline]
    pub fn j0(&self) -> i32
    {
        self.j0
    }

    #[inline]
    pub fn jmax(&self) -> i32
    {
        self.jmax
    }

    #[inline]
    pub fn atlas(&self) -> &Atlas<D>
    {
        &self.atlas
    }

    #[inline]
    pub fn cube_basis(&self, p: usize) -> &CubeBasis<B, D>
    {
        &self.bases[p]
    }

    /// All enumerated indices, in index order.
    #[inline]
    pub fn indices(&self) -> &[FrameIndex<D>]
    {
        &self.indices
    }

    /// Enumeration position of `index`. Unknown indices (outside the
    /// enumerated level range) are a contract violation.
    pub fn number(&self, index: &FrameIndex<D>) -> usize
    {
        *self
            .numbers
            .get(index)
            .unwrap_or_else(|| panic!("frame index outside the enumerated range: {index:?}"))
    }

    /// Generators of level j0 (`generators` = true, `j` ignored apart from
    /// the contract check) or wavelets of level `j`.
    pub fn indices_on_level(&self, j: i32, generators: bool) -> &[FrameIndex<D>]
    {
        if generators
        {
            assert!(j == self.j0 || j == self.j0 - 1, "generators exist on level j0 only");
            &self.indices_levelwise[0]
        }
        else
        {
            assert!(j >= self.j0 && j <= self.jmax, "level {j} outside [{}, {}]", self.j0, self.jmax);
            &self.indices_levelwise[(j - self.j0 + 1) as usize]
        }
    }

    /// Dyadic reference support, from the precomputed table.
    #[inline]
    pub fn support(&self, index: &FrameIndex<D>) -> &CubeSupport<D>
    {
        &self.supports[self.number(index)]
    }

    /// Physical support box, from the precomputed table.
    #[inline]
    pub fn support_box(&self, index: &FrameIndex<D>) -> &BoundingBox<D>
    {
        &self.support_boxes[self.number(index)]
    }

    pub fn first_generator(&self, j: i32) -> FrameIndex<D>
    {
        assert!(j >= self.j0);
        let basis = &self.bases[0];
        FrameIndex::new(0, j, [0; D], std::array::from_fn(|d| basis.k_range(j, 0, d).0))
    }

    pub fn last_generator(&self, j: i32) -> FrameIndex<D>
    {
        assert!(j >= self.j0);
        let p = self.n_p() - 1;
        let basis = &self.bases[p];
        FrameIndex::new(p, j, [0; D], std::array::from_fn(|d| basis.k_range(j, 0, d).1))
    }

    pub fn first_wavelet(&self, j: i32) -> FrameIndex<D>
    {
        assert!(j >= self.j0);
        let basis = &self.bases[0];
        let e: [u8; D] = FrameIndex::<D>::e_from_code(1);
        FrameIndex::new(0, j, e, std::array::from_fn(|d| basis.k_range(j, e[d], d).0))
    }

    pub fn last_wavelet(&self, j: i32) -> FrameIndex<D>
    {
        assert!(j >= self.j0);
        let p = self.n_p() - 1;
        let basis = &self.bases[p];
        FrameIndex::new(p, j, [1; D], std::array::from_fn(|d| basis.k_range(j, 1, d).1))
    }

    /// Successor of `index` in the total order, or None past the last
    /// wavelet of `jmax`. Generators advance to the first wavelet of j0.
    pub fn next(&self, index: &FrameIndex<D>) -> Option<FrameIndex<D>>
    {
        let basis = &self.bases[index.p()];
        let j = index.j();
        let e = *index.e();
        let mut k = *index.k();

        // advance the translation, last direction fastest
        for d in (0..D).rev()
        {
            let (_, k_max) = basis.k_range(j, e[d], d);
            if k[d] < k_max
            {
                k[d] += 1;
                for dd in d + 1..D
                {
                    k[dd] = basis.k_range(j, e[dd], dd).0;
                }
                return Some(FrameIndex::new(index.p(), j, e, k));
            }
        }

        // advance the type within the patch (wavelets only)
        if !index.is_generator()
        {
            let code = index.e_code();
            if code < (1 << D) - 1
            {
                let e = FrameIndex::<D>::e_from_code(code + 1);
                let k = std::array::from_fn(|d| basis.k_range(j, e[d], d).0);
                return Some(FrameIndex::new(index.p(), j, e, k));
            }
        }

        // advance the patch
        if index.p() + 1 < self.n_p()
        {
            let p = index.p() + 1;
            let basis = &self.bases[p];
            let e = if index.is_generator() { [0; D] } else { FrameIndex::<D>::e_from_code(1) };
            let k = std::array::from_fn(|d| basis.k_range(j, e[d], d).0);
            return Some(FrameIndex::new(p, j, e, k));
        }

        // advance the level slot
        if index.is_generator()
        {
            return Some(self.first_wavelet(self.j0));
        }
        if j < self.jmax
        {
            return Some(self.first_wavelet(j + 1));
        }
        None
    }

    /// Point value of the frame expansion `sum_lambda c_lambda psi_lambda`
    /// at the physical point `x`.
    pub fn evaluate(&self, coefficients: &SparseVector<f64, D>, x: &[f64; D]) -> f64
    {
        let mut value = 0.0;
        for (index, c) in coefficients.iter()
        {
            let chart = self.atlas.chart(index.p());
            let y = chart.map_point_inv(x);
            if y.iter().all(|&t| (0.0..=1.0).contains(&t))
            {
                let reference = self.bases[index.p()].evaluate(index.j(), index.e(), index.k(), &y);
                if reference != 0.0
                {
                    value += c * reference / chart.gram_factor(&y);
                }
            }
        }
        value
    }
}

#[cfg(test)]
mod tests
{
    use super::*;
    use crate::basis::linear_hat::LinearHatBasis;
    use crate::geometry::chart::AffineChart;

    fn two_patch_interval(jmax: i32) -> AggregatedFrame<LinearHatBasis, 1>
    {
        let atlas = Atlas::new(vec![
            Box::new(AffineChart::<1>::scaling([0.0], [0.7])),
            Box::new(AffineChart::<1>::scaling([0.3], [1.0])),
        ]);
        AggregatedFrame::new(atlas, &[[[1, 1]], [[1, 1]]], jmax)
    }

    #[test]
    fn degrees_of_freedom_match_basis_ranges()
    {
        let frame = two_patch_interval(3);
        // per patch: 1 generator (level 1) + 2 + 4 + 8 wavelets
        assert_eq!(frame.degrees_of_freedom(), 2 * (1 + 2 + 4 + 8));
        assert_eq!(frame.n_p(), 2);
        assert_eq!(frame.j0(), 1);
    }

    #[test]
    fn enumeration_is_sorted_and_consistent_with_next()
    {
        let frame = two_patch_interval(2);
        let indices = frame.indices();
        for pair in indices.windows(2)
        {
            assert!(pair[0] < pair[1], "enumeration must be strictly increasing");
        }
        let mut walked = vec![frame.first_generator(frame.j0())];
        while let Some(next) = frame.next(walked.last().unwrap())
        {
            walked.push(next);
        }
        assert_eq!(walked, indices);
    }

    #[test]
    fn extremal_indices_bound_the_enumeration()
    {
        let frame = two_patch_interval(3);
        let indices = frame.indices();
        assert_eq!(indices[0], frame.first_generator(1));
        assert_eq!(*indices.last().unwrap(), frame.last_wavelet(3));
        assert_eq!(frame.number(&frame.first_generator(1)), 0);
        // generators fill the first slot, the first wavelet follows directly
        let boundary = frame.number(&frame.last_generator(1));
        assert_eq!(frame.number(&frame.first_wavelet(1)), boundary + 1);
    }

    #[test]
    fn support_table_matches_direct_computation()
    {
        let frame = two_patch_interval(3);
        for index in frame.indices()
        {
            let direct = frame.cube_basis(index.p()).support(index.j(), index.e(), index.k());
            assert_eq!(*frame.support(index), direct);
        }
    }

    #[test]
    fn physical_support_boxes_respect_the_chart()
    {
        let frame = two_patch_interval(2);
        // the single generator of patch 1 is the hat at the midpoint of [0.3, 1.0]
        let generator = FrameIndex::<1>::new(1, 1, [0], [1]);
        let support_box = frame.support_box(&generator);
        assert!((support_box.lower[0] - 0.3).abs() < 1e-14);
        assert!((support_box.upper[0] - 1.0).abs() < 1e-14);
    }

    #[test]
    #[should_panic]
    fn out_of_range_level_is_a_contract_violation()
    {
        let frame = two_patch_interval(2);
        frame.indices_on_level(3, false);
    }

    #[test]
    #[should_panic]
    fn unknown_index_is_a_contract_violation()
    {
        let frame = two_patch_interval(2);
        frame.number(&FrameIndex::new(0, 5, [1], [0]));
    }
}
