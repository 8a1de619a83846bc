use crate::basis::base::{IntervalBasis, IntervalSupport};
use crate::basis::cube::CubeSupport;
use crate::frame::aggregated::AggregatedFrame;
use crate::frame::index::FrameIndex;

/// Intersection of the dyadic reference supports of two indices on the
/// same patch, or None if the interiors are disjoint.
pub fn intersect_supports<B: IntervalBasis, const D: usize>(
    frame: &AggregatedFrame<B, D>,
    lambda: &FrameIndex<D>,
    mu: &FrameIndex<D>,
) -> Option<CubeSupport<D>>
{
    assert_eq!(lambda.p(), mu.p(), "reference supports only intersect within one patch");
    frame.support(lambda).intersect(frame.support(mu))
}

/// Whether the supports of two arbitrary frame functions intersect. Same
/// patch: exact dyadic test on the reference cube. Different patches:
/// adjacency plus physical support-box overlap.
pub fn supports_intersect<B: IntervalBasis, const D: usize>(
    frame: &AggregatedFrame<B, D>,
    lambda: &FrameIndex<D>,
    mu: &FrameIndex<D>,
) -> bool
{
    if lambda.p() == mu.p()
    {
        intersect_supports(frame, lambda, mu).is_some()
    }
    else
    {
        frame.atlas().adjacent(lambda.p(), mu.p())
            && frame.support_box(lambda).intersects(frame.support_box(mu))
    }
}

/// Whether the physical point `x` lies inside the support of `mu`,
/// determined by pulling `x` back through the owning chart.
pub fn in_support<B: IntervalBasis, const D: usize>(
    frame: &AggregatedFrame<B, D>,
    mu: &FrameIndex<D>,
    x: &[f64; D],
) -> bool
{
    let y = frame.atlas().chart(mu.p()).map_point_inv(x);
    if y.iter().any(|&t| !(0.0..=1.0).contains(&t))
    {
        return false;
    }
    let support = frame.support(mu);
    let h = 1.0 / (1u64 << support.scale) as f64;
    for d in 0..D
    {
        if y[d] <= support.a[d] as f64 * h || y[d] >= support.b[d] as f64 * h
        {
            return false;
        }
    }
    true
}

/// All indices of type class `generators` on level `j` whose support
/// intersects the support of `lambda`. On lambda's own patch the
/// translations come from the per-dimension range query; other patches are
/// filtered through adjacency and the precomputed support boxes.
pub fn intersecting_indices<B: IntervalBasis, const D: usize>(
    frame: &AggregatedFrame<B, D>,
    lambda: &FrameIndex<D>,
    j: i32,
    generators: bool,
) -> Vec<FrameIndex<D>>
{
    let mut out = Vec::new();
    let support = frame.support(lambda);
    for p in 0..frame.n_p()
    {
        if p == lambda.p()
        {
            let cube = frame.cube_basis(p);
            let codes = if generators { 0..1 } else { 1..(1usize << D) };
            'types: for code in codes
            {
                let e = FrameIndex::<D>::e_from_code(code);
                let mut ranges = [(0i32, 0i32); D];
                for d in 0..D
                {
                    let interval =
                        IntervalSupport { scale: support.scale, a: support.a[d], b: support.b[d] };
                    match cube.basis(d).intersecting_range(j, e[d], &interval)
                    {
                        Some(range) => ranges[d] = range,
                        None => continue 'types,
                    }
                }
                let mut k: [i32; D] = std::array::from_fn(|d| ranges[d].0);
                'translations: loop
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
                            continue 'translations;
                        }
                    }
                    break;
                }
            }
        }
        else
        {
            out.extend(
                frame
                    .indices_on_level(j, generators)
                    .iter()
                    .filter(|nu| nu.p() == p && supports_intersect(frame, lambda, nu))
                    .copied(),
            );
        }
    }
    out
}

/// Whether the singular supports of two frame functions intersect, i.e.
/// whether the finer support is not contained in a single polynomial piece
/// of the coarser function. Cross-patch pairs are treated conservatively
/// (any support intersection counts).
pub fn intersect_singular_support<B: IntervalBasis, const D: usize>(
    frame: &AggregatedFrame<B, D>,
    lambda: &FrameIndex<D>,
    mu: &FrameIndex<D>,
) -> bool
{
    if lambda.p() != mu.p()
    {
        return supports_intersect(frame, lambda, mu);
    }
    let supp_lambda = frame.support(lambda);
    let supp_mu = frame.support(mu);
    if supp_lambda.intersect(supp_mu).is_none()
    {
        return false;
    }
    let (coarse, fine) = if supp_lambda.scale <= supp_mu.scale { (supp_lambda, supp_mu) } else { (supp_mu, supp_lambda) };
    if coarse.scale == fine.scale
    {
        return true;
    }
    // cell length of the coarse scale, in fine-scale units
    let m = 1i32 << (fine.scale - coarse.scale);
    for d in 0..D
    {
        if fine.a[d].div_euclid(m) != (fine.b[d] - 1).div_euclid(m)
        {
            return true;
        }
    }
    false
}
